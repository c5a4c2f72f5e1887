use super::{ActiveItem, Category};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The session currently accumulating time. Its duration is only computed when it closes.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub item: ActiveItem,
    pub start_time: DateTime<Utc>,
}

impl Session {
    pub fn open(item: ActiveItem, start_time: DateTime<Utc>) -> Self {
        Self { item, start_time }
    }

    /// Whole seconds elapsed since the session opened, truncated toward zero.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.start_time).num_seconds()
    }
}

/// A candidate item waiting to be observed enough times in a row.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCandidate {
    pub item: ActiveItem,
    pub stable_count: u32,
}

impl PendingCandidate {
    pub fn new(item: ActiveItem) -> Self {
        Self { item, stable_count: 1 }
    }

    /// Feed one observation. A different label replaces the candidate and
    /// restarts the count.
    pub fn observe(&mut self, item: ActiveItem) {
        if self.item.same_label(&item) {
            self.stable_count = self.stable_count.saturating_add(1);
        } else {
            *self = Self::new(item);
        }
    }
}

/// A finished session, ready to be written to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub item: ActiveItem,
    /// Category written alongside the record, after the fallback policy is applied.
    pub category: Category,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_secs: i64,
}

impl SessionRecord {
    pub fn from_session(session: Session, end_time: DateTime<Utc>, category: Category) -> Self {
        let duration_secs = session.elapsed_secs(end_time);
        Self {
            item: session.item,
            category,
            start_time: session.start_time,
            end_time,
            duration_secs,
        }
    }
}
