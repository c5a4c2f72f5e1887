//! In-memory collaborators for driving the tracker deterministically.

#![cfg(test)]

use super::clock::Clock;
use crate::error::AppError;
use crate::models::Category;
use crate::notify::Notifier;
use crate::platform::{Observation, WindowInspector};
use crate::store::ActivityStore;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration as StdDuration;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(start)))
    }

    pub fn advance(&self, secs: i64) {
        let mut now = self.0.lock().unwrap();
        *now += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Returns whatever observation was last set; `None` makes inspection fail.
#[derive(Clone, Default)]
pub struct ScriptedInspector {
    current: Arc<Mutex<Option<Observation>>>,
    calls: Arc<AtomicUsize>,
    panic_next: Arc<Mutex<bool>>,
    delay: Arc<Mutex<StdDuration>>,
}

impl ScriptedInspector {
    pub fn show(&self, executable: &str, title: Option<&str>) {
        *self.current.lock().unwrap() = Some(Observation::new(Some(executable), title));
    }

    pub fn fail(&self) {
        *self.current.lock().unwrap() = None;
    }

    pub fn panic_once(&self) {
        *self.panic_next.lock().unwrap() = true;
    }

    /// Every later inspection blocks for `delay` before answering.
    pub fn set_delay(&self, delay: StdDuration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl WindowInspector for ScriptedInspector {
    fn inspect_foreground_window(&self) -> Result<Observation, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut panic_next = self.panic_next.lock().unwrap();
            if *panic_next {
                *panic_next = false;
                drop(panic_next);
                panic!("inspector blew up");
            }
        }
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        self.current
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AppError::Inspector("scripted failure".into()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub label: String,
    pub is_website: bool,
    pub category: Category,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_secs: i64,
}

#[derive(Default)]
struct StoreState {
    names: HashMap<i64, (String, bool, Category)>,
    records: Vec<StoredRecord>,
    focus: bool,
    blocked_apps: HashSet<String>,
    blocked_sites: HashSet<String>,
    fail_writes: bool,
    negative_ids: bool,
    next_id: i64,
}

#[derive(Clone, Default)]
pub struct RecordingStore(Arc<Mutex<StoreState>>);

impl RecordingStore {
    pub fn records(&self) -> Vec<StoredRecord> {
        self.0.lock().unwrap().records.clone()
    }

    pub fn set_focus(&self, enabled: bool) {
        self.0.lock().unwrap().focus = enabled;
    }

    pub fn block_app(&self, name: &str) {
        self.0.lock().unwrap().blocked_apps.insert(name.to_string());
    }

    pub fn block_site(&self, domain: &str) {
        self.0.lock().unwrap().blocked_sites.insert(domain.to_string());
    }

    pub fn fail_writes(&self, fail: bool) {
        self.0.lock().unwrap().fail_writes = fail;
    }

    /// Lookups answer -1 instead of a row id.
    pub fn negative_ids(&self, enabled: bool) {
        self.0.lock().unwrap().negative_ids = enabled;
    }

    fn upsert(&self, label: &str, is_website: bool, category: Category) -> Result<i64, AppError> {
        let mut state = self.0.lock().unwrap();
        if state.fail_writes {
            return Err(AppError::Internal("disk full".into()));
        }
        if state.negative_ids {
            return Ok(-1);
        }
        if let Some((id, _)) = state
            .names
            .iter()
            .find(|(_, (name, website, _))| name == label && *website == is_website)
        {
            return Ok(*id);
        }
        state.next_id += 1;
        let id = state.next_id;
        state.names.insert(id, (label.to_string(), is_website, category));
        Ok(id)
    }
}

impl ActivityStore for RecordingStore {
    fn lookup_or_create_application(&self, name: &str, category: Category) -> Result<i64, AppError> {
        self.upsert(name, false, category)
    }

    fn lookup_or_create_website(&self, domain: &str, category: Category) -> Result<i64, AppError> {
        self.upsert(domain, true, category)
    }

    fn append_activity_record(
        &self,
        app_id: Option<i64>,
        site_id: Option<i64>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        duration_secs: i64,
    ) -> Result<(), AppError> {
        let mut state = self.0.lock().unwrap();
        if state.fail_writes {
            return Err(AppError::Internal("disk full".into()));
        }
        let id = app_id.or(site_id).unwrap();
        let Some((label, is_website, category)) = state.names.get(&id).cloned() else {
            return Err(AppError::Internal(format!("unknown id {id}")));
        };
        state.records.push(StoredRecord {
            label,
            is_website,
            category,
            start_time,
            end_time,
            duration_secs,
        });
        Ok(())
    }

    fn is_focus_mode_enabled(&self) -> Result<bool, AppError> {
        Ok(self.0.lock().unwrap().focus)
    }

    fn is_application_blocked(&self, name: &str) -> Result<bool, AppError> {
        Ok(self.0.lock().unwrap().blocked_apps.contains(name))
    }

    fn is_website_blocked(&self, domain: &str) -> Result<bool, AppError> {
        Ok(self.0.lock().unwrap().blocked_sites.contains(domain))
    }
}

#[derive(Clone, Default)]
pub struct CountingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    failing: Arc<Mutex<bool>>,
}

impl CountingNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

impl Notifier for CountingNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push((title.to_string(), message.to_string()));
        if *self.failing.lock().unwrap() {
            return Err(AppError::Notifier("no notification daemon".into()));
        }
        Ok(())
    }
}
