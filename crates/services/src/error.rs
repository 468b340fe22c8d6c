//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{TestId, UserId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the test-taking session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("test {0} not found")]
    TestNotFound(TestId),
    #[error("option {index} is out of range for a question with {len} options")]
    OptionOutOfRange { index: usize, len: usize },
    #[error("session is submitting its result")]
    Submitting,
    #[error("session already finished")]
    Finished,
    #[error("failed to persist result: {0}")]
    PersistResult(#[source] StorageError),
    #[error("result saved but crediting points failed: {0}")]
    CreditPoints(#[source] StorageError),
    #[error(transparent)]
    Invalid(#[from] quiz_core::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Whether calling `finish` again may succeed without user action.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PersistResult(_) | Self::CreditPoints(_))
    }
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("test {0} not found")]
    NotFound(TestId),
    #[error(transparent)]
    Invalid(#[from] quiz_core::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by leaderboard, dashboard and admin queries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProfileService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("user {0} is already registered")]
    AlreadyRegistered(UserId),
    #[error(transparent)]
    Invalid(#[from] quiz_core::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while reading configuration from the environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{key} must not be empty")]
    Empty { key: &'static str },
    #[error("invalid {key} value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
