//! Domain error types for permission operations.

use permstore_storage::StorageError;
use thiserror::Error;

/// Domain-specific errors for permission operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The permission cache was queried before `initialize()`.
    #[error("permission cache is not initialized")]
    NotInitialized,

    /// A bit string does not match `^[0-1]{32}$`.
    #[error("invalid permission bit pattern: '{pattern}'")]
    InvalidBitPattern { pattern: String },

    /// A bit offset outside the 32-bit vector.
    #[error("permission bit {bit} is out of range")]
    BitOutOfRange { bit: u8 },

    /// An object id could not be resolved to a live object.
    #[error("cannot resolve {kind} {id}")]
    EntityResolutionFailure { kind: &'static str, id: i32 },

    /// The storage collaborator failed.
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl DomainError {
    /// Returns whether this error came from the storage collaborator.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, DomainError::Storage(_))
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
