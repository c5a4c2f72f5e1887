pub mod classifier;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod focus;
pub mod models;
pub mod notify;
pub mod platform;
pub mod store;
#[cfg(test)]
mod test_utils;
pub mod tracker;
pub mod validation;
pub mod website;

pub use error::{AppError, InitError};

use crate::classifier::Classifier;
use crate::config::TrackerConfig;
use crate::db::{migrations, Database};
use crate::notify::LogNotifier;
use crate::platform::NativeInspector;
use crate::store::SqliteStore;
use crate::tracker::{EngineParts, SessionEngine, SystemClock, TrackerService};
use directories::ProjectDirs;
use log::error;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "dwell", "dwell")
}

/// `<data_dir>/dwell/dwell.db`, creating the directory if needed.
pub fn default_db_path() -> Result<PathBuf, InitError> {
    let proj_dirs = project_dirs().ok_or(InitError::NoProjectDirs)?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir).map_err(InitError::DataDirCreation)?;
    Ok(data_dir.join("dwell.db"))
}

/// Open the database at `path`, apply migrations and wrap it in a store.
pub fn open_store(path: &Path) -> Result<SqliteStore, InitError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(InitError::DataDirCreation)?;
    }

    let db = Database::open(path).map_err(|e| {
        error!("Failed to open database at {}: {e}", path.display());
        InitError::DatabaseOpen(e)
    })?;

    migrations::run(db.connection()).map_err(|e| {
        error!("Failed to run migrations: {e}");
        InitError::Migration(e)
    })?;

    Ok(SqliteStore::new(Arc::new(Mutex::new(db))))
}

/// Wire the native window inspector, the given store and a log notifier
/// into a tracker that is ready to start.
pub fn build_tracker(store: &SqliteStore, config: &TrackerConfig) -> TrackerService {
    let classifier = Classifier::new(&config.applications, &config.domain_rules);
    let parts = EngineParts {
        inspector: Box::new(NativeInspector::new()),
        store: Box::new(store.clone()),
        notifier: Box::new(LogNotifier),
        clock: Box::new(SystemClock),
    };
    let engine = SessionEngine::new(parts, classifier, config);
    TrackerService::from_config(engine, config)
}
