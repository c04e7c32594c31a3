//! Storage error types.

use thiserror::Error;

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store could not be reached.
    #[error("database connection error: {message}")]
    ConnectionError { message: String },

    /// A read or write against the permission tables failed.
    #[error("database query error: {message}")]
    QueryError { message: String },

    /// Group not found.
    #[error("group not found: {group_id}")]
    GroupNotFound { group_id: i32 },

    /// Role not found.
    #[error("role not found: {role_id}")]
    RoleNotFound { role_id: i32 },

    /// Invalid input error.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Snapshot (de)serialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },

    /// I/O error while reading a snapshot file.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerializationError {
            message: err.to_string(),
        }
    }
}
