// src/constants.rs

/// Seconds between two foreground-window polls.
pub const POLL_INTERVAL_SECS: u64 = 4;

/// Consecutive identical readings required before a candidate is accepted.
pub const DEBOUNCE_COUNT: u32 = 2;

/// Sessions shorter than this are dropped instead of persisted.
pub const MIN_LOG_SECS: i64 = 2;

/// Minimum spacing between two blocked-item alerts for the same session.
pub const NOTIFICATION_COOLDOWN_SECS: i64 = 30;

/// How long `stop()` waits for an in-flight tick before giving up.
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 3;

/// Continuous productive time before a break reminder fires (2 hours).
pub const BREAK_REMINDER_SECS: i64 = 2 * 60 * 60;

/// Label used when the foreground window cannot be resolved.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Settings key holding the focus-mode flag.
pub const FOCUS_MODE_KEY: &str = "focus_mode_enabled";

/// Maximum length of a blocked application name or website pattern.
pub const MAX_BLOCK_PATTERN_LEN: usize = 500;

/// Maximum poll interval accepted from configuration (1 hour).
pub const MAX_POLL_INTERVAL_SECS: u64 = 60 * 60;
