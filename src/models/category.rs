use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Result;
use serde::{Deserialize, Serialize};

/// Productivity category attached to applications, websites and session records.
///
/// The numeric ids are stable: they are the primary keys of the seeded
/// `categories` table and the values accepted in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Unknown,
    Productive,
    Distracting,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Unknown, Category::Productive, Category::Distracting];

    pub fn id(self) -> i64 {
        match self {
            Category::Unknown => 0,
            Category::Productive => 1,
            Category::Distracting => 2,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            0 => Some(Category::Unknown),
            1 => Some(Category::Productive),
            2 => Some(Category::Distracting),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Unknown => "Unknown",
            Category::Productive => "Productive",
            Category::Distracting => "Distracting",
        }
    }

    pub fn is_unknown(self) -> bool {
        self == Category::Unknown
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.id()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let id = i64::column_result(value)?;
        Category::from_id(id).ok_or(FromSqlError::OutOfRange(id))
    }
}
