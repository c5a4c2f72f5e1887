//! Durable side of tracking: session records, block lists and the focus-mode flag.

use crate::classifier::{normalize_app_name, Classifier};
use crate::constants::FOCUS_MODE_KEY;
use crate::db::Database;
use crate::error::AppError;
use crate::models::{ActivityEntry, ActivityLog, Application, Category, Setting, Website};
use crate::validation::{validate_block_name, validate_block_pattern};
use crate::website::{host_of, normalize_domain};
use chrono::{DateTime, Utc};
use log::warn;
use std::sync::{Arc, Mutex, MutexGuard};

/// Operations the tracker needs from persistent storage.
pub trait ActivityStore: Send {
    /// Idempotent upsert; returns the row id for `name`.
    fn lookup_or_create_application(&self, name: &str, category: Category) -> Result<i64, AppError>;

    fn lookup_or_create_website(&self, domain: &str, category: Category) -> Result<i64, AppError>;

    /// Exactly one of `app_id` and `site_id` must be set.
    fn append_activity_record(
        &self,
        app_id: Option<i64>,
        site_id: Option<i64>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        duration_secs: i64,
    ) -> Result<(), AppError>;

    fn is_focus_mode_enabled(&self) -> Result<bool, AppError>;

    fn is_application_blocked(&self, name: &str) -> Result<bool, AppError>;

    fn is_website_blocked(&self, domain: &str) -> Result<bool, AppError>;
}

/// SQLite-backed store. Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteStore {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    fn lock_db(&self) -> MutexGuard<'_, Database> {
        match self.db.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("SqliteStore: database mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    pub fn set_focus_mode_enabled(&self, enabled: bool) -> Result<(), AppError> {
        let db = self.lock_db();
        Setting::set_flag(db.connection(), FOCUS_MODE_KEY, enabled)?;
        Ok(())
    }

    /// Block an application given its executable or display name. The name is
    /// stored as the label `classifier` gives it, which is what the tracker checks.
    /// Returns that label.
    pub fn block_application(&self, name: &str, classifier: &Classifier) -> Result<String, AppError> {
        let name = classifier.classify(validate_block_name(name)?).display_name;
        if name.is_empty() {
            return Err(AppError::InvalidInput {
                field: "name",
                reason: "nothing left after removing path and extension".into(),
            });
        }

        let db = self.lock_db();
        let conn = db.connection();
        let id = Application::upsert(conn, &name, Category::Distracting)?;
        Application::block(conn, id)?;
        Ok(name)
    }

    /// Returns whether a block existed.
    pub fn unblock_application(&self, name: &str, classifier: &Classifier) -> Result<bool, AppError> {
        let name = classifier.classify(name).display_name;
        let db = self.lock_db();
        let conn = db.connection();
        match Application::find_by_name(conn, &name)? {
            Some(app) => Ok(Application::unblock(conn, app.id)?),
            None => Ok(false),
        }
    }

    /// Block a website given a URL or a bare domain. Returns the stored domain.
    pub fn block_website(&self, url_or_domain: &str) -> Result<String, AppError> {
        let domain = host_of(validate_block_pattern(url_or_domain)?);
        if domain.is_empty() {
            return Err(AppError::InvalidInput {
                field: "site",
                reason: "no domain found".into(),
            });
        }

        let db = self.lock_db();
        let conn = db.connection();
        let id = Website::upsert(conn, &domain, Category::Distracting)?;
        Website::block(conn, id)?;
        Ok(domain)
    }

    pub fn unblock_website(&self, url_or_domain: &str) -> Result<bool, AppError> {
        let domain = host_of(url_or_domain);
        let db = self.lock_db();
        let conn = db.connection();
        match Website::find_by_domain(conn, &domain)? {
            Some(site) => Ok(Website::unblock(conn, site.id)?),
            None => Ok(false),
        }
    }

    pub fn blocked_applications(&self) -> Result<Vec<Application>, AppError> {
        let db = self.lock_db();
        Ok(Application::find_blocked(db.connection())?)
    }

    pub fn blocked_websites(&self) -> Result<Vec<Website>, AppError> {
        let db = self.lock_db();
        Ok(Website::find_blocked(db.connection())?)
    }

    pub fn recent_activity(&self, limit: u32) -> Result<Vec<ActivityEntry>, AppError> {
        let db = self.lock_db();
        Ok(ActivityLog::find_recent(db.connection(), limit)?)
    }
}

impl ActivityStore for SqliteStore {
    fn lookup_or_create_application(&self, name: &str, category: Category) -> Result<i64, AppError> {
        let name = normalize_app_name(name);
        let db = self.lock_db();
        Ok(Application::upsert(db.connection(), &name, category)?)
    }

    fn lookup_or_create_website(&self, domain: &str, category: Category) -> Result<i64, AppError> {
        let domain = normalize_domain(domain);
        let db = self.lock_db();
        Ok(Website::upsert(db.connection(), &domain, category)?)
    }

    fn append_activity_record(
        &self,
        app_id: Option<i64>,
        site_id: Option<i64>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        duration_secs: i64,
    ) -> Result<(), AppError> {
        if app_id.is_some() == site_id.is_some() {
            return Err(AppError::InvalidInput {
                field: "activity",
                reason: "exactly one of app_id and site_id must be set".into(),
            });
        }

        let db = self.lock_db();
        let mut log = ActivityLog::new(app_id, site_id, start_time, end_time, duration_secs);
        log.save(db.connection())?;
        Ok(())
    }

    fn is_focus_mode_enabled(&self) -> Result<bool, AppError> {
        let db = self.lock_db();
        Ok(Setting::get_flag(db.connection(), FOCUS_MODE_KEY)?)
    }

    fn is_application_blocked(&self, name: &str) -> Result<bool, AppError> {
        let name = normalize_app_name(name);
        let db = self.lock_db();
        Ok(Application::is_blocked(db.connection(), &name)?)
    }

    fn is_website_blocked(&self, domain: &str) -> Result<bool, AppError> {
        let host = host_of(domain);
        let db = self.lock_db();
        Ok(Website::is_blocked_matching(db.connection(), &host)?)
    }
}
