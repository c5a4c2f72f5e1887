use super::{Category, ItemKind};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result};
use serde::Serialize;

/// One row of `activity_log`. Exactly one of `app_id` and `site_id` is set.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    pub id: Option<i64>,
    pub app_id: Option<i64>,
    pub site_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_secs: i64,
}

/// An activity row joined with the name of what was used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub label: String,
    pub kind: ItemKind,
    pub category: Category,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_secs: i64,
}

fn parse_time(idx: usize, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl ActivityLog {
    pub fn new(
        app_id: Option<i64>,
        site_id: Option<i64>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        duration_secs: i64,
    ) -> Self {
        Self {
            id: None,
            app_id,
            site_id,
            start_time,
            end_time,
            duration_secs,
        }
    }

    pub fn save(&mut self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO activity_log (app_id, site_id, start_time, end_time, duration_secs)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.app_id,
                self.site_id,
                self.start_time.to_rfc3339(),
                self.end_time.to_rfc3339(),
                self.duration_secs,
            ],
        )?;
        self.id = Some(conn.last_insert_rowid());
        Ok(())
    }

    /// Most recent entries first.
    pub fn find_recent(conn: &Connection, limit: u32) -> Result<Vec<ActivityEntry>> {
        let mut stmt = conn.prepare(
            "SELECT l.id,
                    COALESCE(a.name, w.domain),
                    l.site_id IS NOT NULL,
                    COALESCE(a.category_id, w.category_id, 0),
                    l.start_time, l.end_time, l.duration_secs
             FROM activity_log l
             LEFT JOIN applications a ON l.app_id = a.id
             LEFT JOIN websites w ON l.site_id = w.id
             ORDER BY l.start_time DESC, l.id DESC
             LIMIT ?1"
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            let is_website: bool = row.get(2)?;
            let start: String = row.get(4)?;
            let end: String = row.get(5)?;
            Ok(ActivityEntry {
                id: row.get(0)?,
                label: row.get(1)?,
                kind: if is_website { ItemKind::Website } else { ItemKind::Application },
                category: row.get(3)?,
                start_time: parse_time(4, &start)?,
                end_time: parse_time(5, &end)?,
                duration_secs: row.get(6)?,
            })
        })?;

        rows.collect()
    }
}
