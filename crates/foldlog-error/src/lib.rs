// Foldlog error handling framework
// Central location for error types and Result aliases

use thiserror::Error;

// Re-export common error handling tools for convenience
pub use anyhow;
pub use thiserror;

/// Errors reported by a log collaborator.
#[derive(Error, Debug, Clone)]
pub enum LogError {
    /// Entry lookup failed
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// Underlying storage failure
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Entry rejected before append
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),

    /// Serialization failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
}

impl LogError {
    /// Create a new not-found error
    pub fn not_found(id: impl Into<String>) -> Self {
        LogError::NotFound(id.into())
    }

    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        LogError::StorageError(message.into())
    }
}

/// Convenient Result type for log operations
pub type LogResult<T> = Result<T, LogError>;

/// Errors reported by the reconciliation engine.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Failure in the log collaborator
    #[error("Log error: {0}")]
    Log(#[from] LogError),

    /// Replay could not complete
    #[error("Replay failed: {0}")]
    ReplayFailed(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        StoreError::Internal(message.into())
    }
}

/// Convenient Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
