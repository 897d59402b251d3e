//! Error types for buzzwin-karma.

use thiserror::Error;

/// Result type for karma rule operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while interpreting karma and ritual inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A required field was missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The karma action tag is not part of the action table.
    #[error("unknown karma action: {0}")]
    UnknownAction(String),

    /// Effort level outside `minimal | moderate | significant`.
    #[error("invalid effort level: {0}")]
    InvalidEffortLevel(String),

    /// Ritual scope outside `global | personalized | public`.
    #[error("invalid ritual scope: {0}")]
    InvalidScope(String),

    /// Reaction type outside the supported set.
    #[error("invalid reaction type: {0}")]
    InvalidReaction(String),
}

/// Reject empty identifiers and identifiers containing the `:` key separator.
pub fn require_id<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument(format!("{} is required", field)));
    }
    if trimmed.contains(':') {
        return Err(Error::InvalidArgument(format!("{} must not contain ':'", field)));
    }
    Ok(trimmed)
}
