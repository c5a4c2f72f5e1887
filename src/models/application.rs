use super::Category;
use rusqlite::{params, Connection, OptionalExtension, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub id: i64,
    pub name: String,
    pub category: Category,
}

impl Application {
    /// Insert the application if it is new and return its id.
    /// The category of an existing row is left untouched.
    pub fn upsert(conn: &Connection, name: &str, category: Category) -> Result<i64> {
        conn.execute(
            "INSERT OR IGNORE INTO applications (name, category_id) VALUES (?1, ?2)",
            params![name, category],
        )?;
        conn.query_row(
            "SELECT id FROM applications WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
    }

    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Self>> {
        conn.query_row(
            "SELECT id, name, category_id FROM applications WHERE name = ?1",
            params![name],
            |row| {
                Ok(Self {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    category: row.get::<_, Option<Category>>(2)?.unwrap_or_default(),
                })
            },
        )
        .optional()
    }

    pub fn block(conn: &Connection, id: i64) -> Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO blocked_applications (app_id) VALUES (?1)",
            params![id],
        )?;
        Ok(())
    }

    /// Returns whether a block was actually removed.
    pub fn unblock(conn: &Connection, id: i64) -> Result<bool> {
        let removed = conn.execute(
            "DELETE FROM blocked_applications WHERE app_id = ?1",
            params![id],
        )?;
        Ok(removed > 0)
    }

    pub fn is_blocked(conn: &Connection, name: &str) -> Result<bool> {
        conn.query_row(
            "SELECT EXISTS (
                 SELECT 1 FROM blocked_applications b
                 JOIN applications a ON b.app_id = a.id
                 WHERE a.name = ?1
             )",
            params![name],
            |row| row.get(0),
        )
    }

    pub fn find_blocked(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT a.id, a.name, a.category_id FROM blocked_applications b
             JOIN applications a ON b.app_id = a.id
             ORDER BY a.name"
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Self {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get::<_, Option<Category>>(2)?.unwrap_or_default(),
            })
        })?;
        rows.collect()
    }
}
