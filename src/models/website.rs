use super::Category;
use rusqlite::{params, Connection, OptionalExtension, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Website {
    pub id: i64,
    pub domain: String,
    pub category: Category,
}

impl Website {
    /// Insert the website if it is new and return its id.
    /// The category of an existing row is left untouched.
    pub fn upsert(conn: &Connection, domain: &str, category: Category) -> Result<i64> {
        conn.execute(
            "INSERT OR IGNORE INTO websites (domain, category_id) VALUES (?1, ?2)",
            params![domain, category],
        )?;
        conn.query_row(
            "SELECT id FROM websites WHERE domain = ?1",
            params![domain],
            |row| row.get(0),
        )
    }

    pub fn find_by_domain(conn: &Connection, domain: &str) -> Result<Option<Self>> {
        conn.query_row(
            "SELECT id, domain, category_id FROM websites WHERE domain = ?1",
            params![domain],
            |row| {
                Ok(Self {
                    id: row.get(0)?,
                    domain: row.get(1)?,
                    category: row.get::<_, Option<Category>>(2)?.unwrap_or_default(),
                })
            },
        )
        .optional()
    }

    pub fn block(conn: &Connection, id: i64) -> Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO blocked_websites (site_id) VALUES (?1)",
            params![id],
        )?;
        Ok(())
    }

    /// Returns whether a block was actually removed.
    pub fn unblock(conn: &Connection, id: i64) -> Result<bool> {
        let removed = conn.execute(
            "DELETE FROM blocked_websites WHERE site_id = ?1",
            params![id],
        )?;
        Ok(removed > 0)
    }

    /// True when any blocked website's stored domain contains `host`.
    ///
    /// This is a substring match: `tube.com` matches a blocked `youtube.com`.
    pub fn is_blocked_matching(conn: &Connection, host: &str) -> Result<bool> {
        if host.is_empty() {
            return Ok(false);
        }
        conn.query_row(
            "SELECT EXISTS (
                 SELECT 1 FROM blocked_websites b
                 JOIN websites w ON b.site_id = w.id
                 WHERE instr(w.domain, ?1) > 0
             )",
            params![host],
            |row| row.get(0),
        )
    }

    pub fn find_blocked(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT w.id, w.domain, w.category_id FROM blocked_websites b
             JOIN websites w ON b.site_id = w.id
             ORDER BY w.domain"
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Self {
                id: row.get(0)?,
                domain: row.get(1)?,
                category: row.get::<_, Option<Category>>(2)?.unwrap_or_default(),
            })
        })?;
        rows.collect()
    }
}
