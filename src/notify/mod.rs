use crate::error::AppError;

/// Fire-and-forget user alerts. Failures are logged by the caller and never
/// affect tracking.
pub trait Notifier: Send {
    fn notify(&self, title: &str, message: &str) -> Result<(), AppError>;
}

/// Writes alerts to the log. Used when no desktop notification surface is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), AppError> {
        log::info!(target: "dwell::alert", "{title}: {message}");
        Ok(())
    }
}
