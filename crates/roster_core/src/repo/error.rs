//! Repository error type shared by every repository.

use crate::db::DbError;
use crate::model::ModelValidationError;
use crate::query::page::PagingError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity kind named in semantic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Member,
    Team,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Member => write!(f, "member"),
            Self::Team => write!(f, "team"),
        }
    }
}

#[derive(Debug)]
pub enum RepoError {
    /// Store failure (connectivity, constraint, busy), carried unchanged.
    Db(DbError),
    Validation(ModelValidationError),
    Paging(PagingError),
    /// Presence was required and the row does not exist.
    NotFound { entity: EntityKind, id: i64 },
    /// A single-result finder matched more than one row.
    TooManyResults { finder: &'static str, count: usize },
    /// Operation needs a saved entity (with an id).
    Unsaved(EntityKind),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted row cannot be converted into a valid entity.
    InvalidData(String),
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Paging(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::TooManyResults { finder, count } => write!(
                f,
                "{finder} expected at most one result but matched {count} rows"
            ),
            Self::Unsaved(entity) => write!(f, "{entity} has not been saved yet"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Paging(err) => Some(err),
            Self::NotFound { .. }
            | Self::TooManyResults { .. }
            | Self::Unsaved(_)
            | Self::UninitializedConnection { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PagingError> for RepoError {
    fn from(value: PagingError) -> Self {
        Self::Paging(value)
    }
}
