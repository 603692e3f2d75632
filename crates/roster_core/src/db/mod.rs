//! Roster store bootstrap.
//!
//! # Responsibility
//! - Open SQLite connections configured for the roster schema.
//! - Keep the schema at the version this binary was built for.
//!
//! # Invariants
//! - The schema version lives in `PRAGMA user_version`.
//! - Repositories refuse connections whose schema is not fully migrated.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_configured, open_db, open_db_in_memory, DEFAULT_BUSY_TIMEOUT};

pub type DbResult<T> = Result<T, DbError>;

/// Store-level failure.
#[derive(Debug)]
pub enum DbError {
    /// Statement or connection failure, carried unchanged.
    Sqlite(rusqlite::Error),
    /// The file was written by a newer binary.
    SchemaTooNew { found: u32, supported: u32 },
    /// Migration `version` failed; nothing from the pending batch was kept.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
}

impl DbError {
    /// SQLite primary result code, when the failure came from SQLite.
    pub fn sqlite_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => err.sqlite_error_code(),
            Self::SchemaTooNew { .. } => None,
        }
    }

    /// Another connection holds the write lock.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.sqlite_code(),
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
        )
    }

    /// A `NOT NULL`, `CHECK` or foreign-key constraint rejected a write.
    pub fn is_constraint_violation(&self) -> bool {
        self.sqlite_code() == Some(ErrorCode::ConstraintViolation)
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "roster schema version {found} is newer than this build supports ({supported})"
            ),
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "migration {version} ({name}) failed: {source}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
