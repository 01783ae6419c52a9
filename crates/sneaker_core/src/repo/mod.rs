//! Repositories over the key-value store.
//!
//! # Responsibility
//! - Own one key namespace each (`catalog:*`, `collection:*`).
//! - Translate storage failures and undecodable values into `RepoError`.
//!
//! # Invariants
//! - Write paths validate input before touching the store.
//! - Repositories never cache; every read observes the latest committed write.
//! - Read paths reject undecodable persisted values instead of masking them.

use crate::db::DbError;
use crate::model::item::{ItemId, ItemValidationError};
use crate::model::session::Capability;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod catalog_repo;
pub mod collection_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error taxonomy shared by repositories and the use-case service.
#[derive(Debug)]
pub enum RepoError {
    /// Malformed input; nothing was written.
    Validation(ItemValidationError),
    /// Underlying storage unavailable; retryable.
    Io(DbError),
    /// Referenced id is absent where existence was required.
    NotFound(ItemId),
    /// Create was asked for an id that is already stored.
    AlreadyExists(ItemId),
    /// A stored value could not be decoded.
    InvalidData(String),
    /// The session lacks the capability the operation needs.
    PermissionDenied(Capability),
}

impl RepoError {
    /// Whether the UI should offer a plain retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::AlreadyExists(id) => write!(f, "item already exists: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::PermissionDenied(capability) => {
                write!(f, "permission denied: requires `{capability}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::NotFound(_)
            | Self::AlreadyExists(_)
            | Self::InvalidData(_)
            | Self::PermissionDenied(_) => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Io(DbError::Sqlite(value))
    }
}

pub(crate) fn decode_value<T: DeserializeOwned>(key: &str, raw: &str) -> RepoResult<T> {
    serde_json::from_str(raw)
        .map_err(|err| RepoError::InvalidData(format!("value under `{key}`: {err}")))
}

pub(crate) fn encode_value<T: Serialize>(key: &str, value: &T) -> RepoResult<String> {
    serde_json::to_string(value)
        .map_err(|err| RepoError::InvalidData(format!("value for `{key}`: {err}")))
}
