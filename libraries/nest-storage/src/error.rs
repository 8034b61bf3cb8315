/// Storage-specific errors
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// A precondition checked inside the commit no longer holds
    #[error("Expectation failed: {0}")]
    Expectation(String),

    /// A row targeted by an update disappeared before the commit
    #[error("Row vanished: {0}")]
    Vanished(String),

    /// A stored value cannot be represented in the domain model
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// Migration error
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<StorageError> for nest_core::NestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Expectation(msg) | StorageError::Vanished(msg) => {
                nest_core::NestError::conflict(msg)
            }
            other => nest_core::NestError::storage(other.to_string()),
        }
    }
}
