use crate::constants::{MAX_BLOCK_PATTERN_LEN, MAX_POLL_INTERVAL_SECS};
use crate::error::AppError;

fn validate_non_empty<'a>(field: &'static str, value: &'a str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidInput {
            field,
            reason: "cannot be empty".into(),
        });
    }
    if value.len() > MAX_BLOCK_PATTERN_LEN {
        return Err(AppError::InvalidInput {
            field,
            reason: format!("cannot exceed {MAX_BLOCK_PATTERN_LEN} characters"),
        });
    }
    Ok(value)
}

/// Validate an application name given to the block list.
pub fn validate_block_name(name: &str) -> Result<&str, AppError> {
    validate_non_empty("name", name)
}

/// Validate a website URL or domain given to the block list.
pub fn validate_block_pattern(pattern: &str) -> Result<&str, AppError> {
    let pattern = validate_non_empty("site", pattern)?;
    if pattern.chars().any(char::is_whitespace) {
        return Err(AppError::InvalidInput {
            field: "site",
            reason: "cannot contain whitespace".into(),
        });
    }
    Ok(pattern)
}

/// Validate an executable name or domain pattern used as a lookup key in configuration.
pub fn validate_mapping_key(field: &'static str, key: &str) -> Result<(), AppError> {
    validate_non_empty(field, key).map(|_| ())
}

/// Validate the poll interval in seconds.
pub fn validate_poll_interval(secs: u64) -> Result<(), AppError> {
    if secs == 0 {
        return Err(AppError::InvalidInput {
            field: "poll_interval_secs",
            reason: "must be positive".into(),
        });
    }
    if secs > MAX_POLL_INTERVAL_SECS {
        return Err(AppError::InvalidInput {
            field: "poll_interval_secs",
            reason: format!("cannot exceed {MAX_POLL_INTERVAL_SECS} seconds"),
        });
    }
    Ok(())
}

/// Validate a count or duration that must be strictly positive.
pub fn validate_positive(field: &'static str, value: u64) -> Result<(), AppError> {
    if value == 0 {
        return Err(AppError::InvalidInput {
            field,
            reason: "must be positive".into(),
        });
    }
    Ok(())
}

/// Validate a duration in seconds that may be zero but not negative.
pub fn validate_non_negative(field: &'static str, value: i64) -> Result<(), AppError> {
    if value < 0 {
        return Err(AppError::InvalidInput {
            field,
            reason: "cannot be negative".into(),
        });
    }
    Ok(())
}
