//! Error types for the Buzzwin node.

use thiserror::Error;

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in node operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or malformed request field
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Referenced document does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write conflicts with existing state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Caller does not own the resource
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rejected by the karma rules
    #[error(transparent)]
    Domain(#[from] buzzwin_karma::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(e: rocksdb::Error) -> Self {
        Error::Storage(e.to_string())
    }
}
