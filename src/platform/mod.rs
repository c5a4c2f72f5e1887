pub mod types;

pub use types::{Observation, WindowInspector};

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "linux")]
pub use linux::X11Inspector as NativeInspector;

#[cfg(not(target_os = "linux"))]
pub use unsupported::UnsupportedInspector as NativeInspector;

#[cfg(not(target_os = "linux"))]
mod unsupported {
    use super::{Observation, WindowInspector};
    use crate::error::AppError;

    /// Placeholder for platforms without a window inspector. Every reading
    /// fails, so the tracker records the `Unknown` sentinel.
    #[derive(Default)]
    pub struct UnsupportedInspector;

    impl UnsupportedInspector {
        pub fn new() -> Self { Self }
    }

    impl WindowInspector for UnsupportedInspector {
        fn inspect_foreground_window(&self) -> Result<Observation, AppError> {
            Err(AppError::Inspector(
                "window inspection is not supported on this platform".to_string(),
            ))
        }
    }
}
