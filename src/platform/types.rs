use crate::error::AppError;

/// Raw reading of the foreground window on one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    pub process_executable: Option<String>,
    pub window_title: Option<String>,
}

impl Observation {
    pub fn new(process_executable: Option<&str>, window_title: Option<&str>) -> Self {
        Self {
            process_executable: process_executable.map(str::to_string),
            window_title: window_title.map(str::to_string),
        }
    }
}

/// Source of foreground-window readings.
///
/// Implementations may fail; the tracker treats a failure as an observation
/// with both fields absent.
pub trait WindowInspector: Send {
    fn inspect_foreground_window(&self) -> Result<Observation, AppError>;
}
