//! Error types shared across stores and API handlers.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to API callers within the request/response cycle.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input: bad time format, bad filename, non-multipart body.
    #[error("{0}")]
    Validation(String),

    /// The addressed resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Unexpected I/O failure while handling the request.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

/// Failure while writing a persisted document to disk.
///
/// Persistence is best-effort: callers log the error and keep serving from
/// the in-memory state, which stays authoritative for the running process.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_passthrough() {
        let err = ApiError::validation("Invalid filename");
        assert_eq!(err.to_string(), "Invalid filename");
    }

    #[test]
    fn test_not_found_message_passthrough() {
        let err = ApiError::not_found("File not found");
        assert_eq!(err.to_string(), "File not found");
    }
}
