//! SQLite bootstrap for the key-value store.
//!
//! # Responsibility
//! - Open and configure the SQLite connection backing `kv::SqliteKvStore`.
//! - Apply storage schema migrations in deterministic order.
//!
//! # Invariants
//! - Storage schema version is tracked via `PRAGMA user_version`.
//! - No key-value access happens before schema migrations succeed.
//! - Schema migrations are unrelated to the legacy collection import in
//!   `crate::migration`; that one moves user data, this one shapes tables.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage transport error. Every variant means the device could not serve
/// the request; callers treat it as retryable I/O failure.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "storage error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "store schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
