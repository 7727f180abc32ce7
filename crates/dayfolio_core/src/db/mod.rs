//! SQLite file that hosts the key/value table behind [`crate::SqliteKeyValueStore`].
//!
//! The log list lives in a single `kv_store` row, so the schema stays a
//! plain key/value table and grows only through numbered migrations.
//!
//! # Invariants
//! - `PRAGMA user_version` equals the last applied migration.
//! - A file written by a newer build is refused instead of being read.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the storage file.
#[derive(Debug)]
pub enum DbError {
    /// SQLite rejected a statement, pragma or the file itself.
    Sqlite(rusqlite::Error),
    /// The file's `user_version` is ahead of every migration this build
    /// knows. Writing the log row into it could lose data.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "storage file uses schema v{found}, this build reads up to v{supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
