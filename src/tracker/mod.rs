pub mod clock;
pub mod engine;
#[cfg(test)]
mod fakes;

pub use clock::{Clock, SystemClock};
pub use engine::{EngineParts, SessionEngine, TickOutcome};

use crate::config::TrackerConfig;
use crate::error::AppError;
use log::{error, info, warn};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Read-only view of a tracker's health, safe to hand to other threads.
#[derive(Clone)]
pub struct TrackerStatus {
    running: Arc<AtomicBool>,
    degraded: Arc<AtomicBool>,
}

impl TrackerStatus {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// True while session records are failing to persist.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }
}

struct Worker {
    stop_tx: Sender<()>,
    done_rx: Receiver<()>,
    handle: JoinHandle<()>,
}

/// Runs a [`SessionEngine`] on its own thread at a fixed rate.
pub struct TrackerService {
    engine: Mutex<Option<SessionEngine>>,
    worker: Mutex<Option<Worker>>,
    poll_interval: Duration,
    shutdown_timeout: Duration,
    status: TrackerStatus,
}

fn recover<'a, T>(mutex: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("{context} mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

impl TrackerService {
    pub fn new(engine: SessionEngine, poll_interval: Duration, shutdown_timeout: Duration) -> Self {
        let status = TrackerStatus {
            running: Arc::new(AtomicBool::new(false)),
            degraded: engine.degraded_flag(),
        };
        Self {
            engine: Mutex::new(Some(engine)),
            worker: Mutex::new(None),
            poll_interval,
            shutdown_timeout,
            status,
        }
    }

    pub fn from_config(engine: SessionEngine, config: &TrackerConfig) -> Self {
        Self::new(engine, config.poll_interval(), config.shutdown_timeout())
    }

    pub fn status(&self) -> TrackerStatus {
        self.status.clone()
    }

    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    /// Spawn the worker. Calling this while running, or after the tracker
    /// was stopped, does nothing.
    pub fn start(&self) -> Result<(), AppError> {
        let mut worker = recover(&self.worker, "Tracker worker");
        if worker.is_some() {
            return Ok(());
        }
        let Some(engine) = recover(&self.engine, "Tracker engine").take() else {
            warn!("Tracker was already stopped; not starting again");
            return Ok(());
        };

        let (stop_tx, stop_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        let running = Arc::clone(&self.status.running);
        let interval = self.poll_interval;

        running.store(true, Ordering::SeqCst);
        let spawned = thread::Builder::new()
            .name("dwell-tracker".to_string())
            .spawn(move || {
                run_worker(engine, interval, &stop_rx);
                running.store(false, Ordering::SeqCst);
                // The receiver is gone if stop() already gave up waiting
                let _ = done_tx.send(());
            });

        match spawned {
            Ok(handle) => {
                info!("Tracker started (poll every {}ms)", interval.as_millis());
                *worker = Some(Worker { stop_tx, done_rx, handle });
                Ok(())
            }
            Err(e) => {
                self.status.running.store(false, Ordering::SeqCst);
                Err(AppError::Io(e))
            }
        }
    }

    /// Stop polling, wait for the in-flight tick and the final flush, and
    /// return. Waits at most the shutdown timeout.
    pub fn stop(&self) {
        let Some(worker) = recover(&self.worker, "Tracker worker").take() else {
            return;
        };

        // A send error means the worker already exited
        let _ = worker.stop_tx.send(());

        match worker.done_rx.recv_timeout(self.shutdown_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if worker.handle.join().is_err() {
                    error!("Tracker thread panicked during shutdown");
                }
                info!("Tracker stopped");
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Tracker did not finish within {}ms; the final flush will run when the current tick returns",
                    self.shutdown_timeout.as_millis()
                );
            }
        }
    }
}

impl Drop for TrackerService {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(mut engine: SessionEngine, interval: Duration, stop_rx: &Receiver<()>) {
    loop {
        let started = Instant::now();
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| engine.poll_once())) {
            error!("Tracker tick panicked: {}", panic_message(payload.as_ref()));
        }

        let wait = interval.saturating_sub(started.elapsed());
        match stop_rx.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| engine.flush())) {
        error!("Final flush panicked: {}", panic_message(payload.as_ref()));
    }
}
