//! Tracker configuration, stored as JSON next to the other per-user config.

use crate::classifier::{AppMapping, DomainRule};
use crate::constants::{
    BREAK_REMINDER_SECS, DEBOUNCE_COUNT, MIN_LOG_SECS, NOTIFICATION_COOLDOWN_SECS,
    POLL_INTERVAL_SECS, SHUTDOWN_TIMEOUT_SECS,
};
use crate::error::AppError;
use crate::models::{Category, ItemKind};
use crate::validation::{
    validate_mapping_key, validate_non_negative, validate_poll_interval, validate_positive,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Category written for a session whose item has no category of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryPolicy {
    pub application_fallback: Category,
    pub website_fallback: Category,
}

impl Default for CategoryPolicy {
    fn default() -> Self {
        Self {
            application_fallback: Category::Productive,
            website_fallback: Category::Distracting,
        }
    }
}

impl CategoryPolicy {
    /// The hint wins unless it is `Unknown`.
    pub fn resolve(&self, kind: ItemKind, hint: Category) -> Category {
        if !hint.is_unknown() {
            return hint;
        }
        match kind {
            ItemKind::Application => self.application_fallback,
            ItemKind::Website => self.website_fallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub poll_interval_secs: u64,
    pub debounce_count: u32,
    pub min_log_secs: i64,
    pub notification_cooldown_secs: i64,
    pub shutdown_timeout_secs: u64,
    /// `None` disables break reminders.
    pub break_reminder_secs: Option<i64>,
    pub category_policy: CategoryPolicy,
    pub applications: Vec<AppMapping>,
    pub domain_rules: Vec<DomainRule>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: POLL_INTERVAL_SECS,
            debounce_count: DEBOUNCE_COUNT,
            min_log_secs: MIN_LOG_SECS,
            notification_cooldown_secs: NOTIFICATION_COOLDOWN_SECS,
            shutdown_timeout_secs: SHUTDOWN_TIMEOUT_SECS,
            break_reminder_secs: Some(BREAK_REMINDER_SECS),
            category_policy: CategoryPolicy::default(),
            applications: Vec::new(),
            domain_rules: Vec::new(),
        }
    }
}

impl TrackerConfig {
    /// Load from `path`, falling back to defaults when no file exists.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| AppError::Config {
            reason: format!("{}: {e}", path.display()),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| AppError::Config {
            reason: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `<config_dir>/dwell/config.json`, if the platform has a config directory.
    pub fn config_path() -> Option<PathBuf> {
        crate::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate_poll_interval(self.poll_interval_secs)?;
        validate_positive("debounce_count", u64::from(self.debounce_count))?;
        validate_positive("shutdown_timeout_secs", self.shutdown_timeout_secs)?;
        validate_non_negative("min_log_secs", self.min_log_secs)?;
        validate_non_negative("notification_cooldown_secs", self.notification_cooldown_secs)?;
        if let Some(secs) = self.break_reminder_secs {
            validate_non_negative("break_reminder_secs", secs)?;
        }
        for mapping in &self.applications {
            validate_mapping_key("applications.executable", &mapping.executable)?;
        }
        for rule in &self.domain_rules {
            validate_mapping_key("domain_rules.pattern", &rule.pattern)?;
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
