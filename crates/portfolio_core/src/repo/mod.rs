//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per collection.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes trust their input; services run `validated()` first.
//! - Repository APIs return semantic errors (`NotFound`, `PartitionChanged`)
//!   in addition to DB transport errors.
//! - Multi-row order writes are all-or-nothing.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod experience_repo;
pub mod profile_repo;
pub mod project_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error shared by every collection.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(Uuid),
    /// Partition membership differs from the order sequence being written.
    PartitionChanged {
        featured: bool,
        expected: usize,
        actual: usize,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::PartitionChanged {
                featured,
                expected,
                actual,
            } => write!(
                f,
                "partition featured={featured} has {actual} members, order sequence has {expected}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::PartitionChanged { .. } => None,
            Self::InvalidData(_) => None,
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

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn encode_json<T: serde::Serialize>(value: &T, column: &str) -> RepoResult<String> {
    serde_json::to_string(value)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode {column}: {err}")))
}

pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(
    value: &str,
    column: &str,
) -> RepoResult<T> {
    serde_json::from_str(value)
        .map_err(|err| RepoError::InvalidData(format!("invalid json in {column}: {err}")))
}
