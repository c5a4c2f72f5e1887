//! Focus-mode policy: deciding when an item is blocked and how often to say so.

use crate::error::AppError;
use crate::models::{ActiveItem, ItemKind};
use crate::store::ActivityStore;
use chrono::{DateTime, Utc};

pub const BLOCKED_ALERT_TITLE: &str = "Focus Mode Active";
pub const BREAK_ALERT_TITLE: &str = "Take a break";

/// Rate limit for one kind of alert within one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationCooldown {
    last_fired_at: Option<DateTime<Utc>>,
}

impl NotificationCooldown {
    /// True when the alert never fired or fired more than `cooldown_secs`
    /// whole seconds ago.
    pub fn ready(&self, now: DateTime<Utc>, cooldown_secs: i64) -> bool {
        self.last_fired_at
            .map_or(true, |last| (now - last).num_seconds() > cooldown_secs)
    }

    pub fn mark(&mut self, now: DateTime<Utc>) {
        self.last_fired_at = Some(now);
    }

    pub fn reset(&mut self) {
        self.last_fired_at = None;
    }
}

/// Whether focus mode is on and `item` is on the matching block list.
pub fn is_item_blocked(store: &dyn ActivityStore, item: &ActiveItem) -> Result<bool, AppError> {
    if !store.is_focus_mode_enabled()? {
        return Ok(false);
    }
    match item.kind {
        ItemKind::Application => store.is_application_blocked(&item.label),
        ItemKind::Website => store.is_website_blocked(&item.label),
    }
}

pub fn blocked_message(label: &str) -> String {
    format!("Avoid {label} - Stay focused and try to reduce distractions!")
}

pub fn break_message(label: &str, minutes: i64) -> String {
    format!("You've been on {label} for {minutes} minutes.")
}
