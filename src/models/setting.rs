use rusqlite::{params, Connection, OptionalExtension, Result};

/// Key/value rows of the `settings` table.
pub struct Setting;

impl Setting {
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()
        .map(Option::flatten)
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_flag(conn: &Connection, key: &str) -> Result<bool> {
        Ok(Self::get(conn, key)?.as_deref() == Some("true"))
    }

    pub fn set_flag(conn: &Connection, key: &str, enabled: bool) -> Result<()> {
        Self::set(conn, key, if enabled { "true" } else { "false" })
    }
}
