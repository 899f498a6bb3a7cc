//! Error types for the storage crate.

use thiserror::Error;

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors raised by the SQLite cache.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Record (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StorageError> for stridequest_core::Error {
    fn from(err: StorageError) -> Self {
        stridequest_core::Error::persistence(err.to_string())
    }
}
