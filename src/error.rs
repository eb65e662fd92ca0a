//! Custom error types for partlog
//!
//! This module defines the error hierarchy for the crate using thiserror
//! for ergonomic error definitions.
//!
//! "No matching row" is never an error for the audit log itself: queries return
//! an empty `Vec` or `None`. `NotFound` is only raised by the service and CLI
//! layers when a mutation targets an element that does not exist.

use thiserror::Error;

/// The main error type for partlog operations
#[derive(Error, Debug)]
pub enum PartLogError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Rejected input: unknown event kind, unmapped target type, payload that
    /// does not fit the event. Always raised before anything is written.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// The underlying store was unreachable or rejected the read/write
    #[error("Storage error: {0}")]
    Storage(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),
}

impl PartLogError {
    /// Create a "not found" error for tracked elements
    pub fn element_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Element",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for log entries
    pub fn log_entry_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Log entry",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this is a store failure
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl From<std::io::Error> for PartLogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PartLogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for partlog operations
pub type PartLogResult<T> = Result<T, PartLogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PartLogError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = PartLogError::element_not_found("part #42");
        assert_eq!(err.to_string(), "Element not found: part #42");
        assert!(err.is_not_found());
        assert!(!err.is_storage());
    }

    #[test]
    fn test_invalid_argument_error() {
        let err = PartLogError::InvalidArgument("unknown event kind 'moved'".into());
        assert_eq!(
            err.to_string(),
            "Invalid argument: unknown event kind 'moved'"
        );
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PartLogError = io_err.into();
        assert!(matches!(err, PartLogError::Io(_)));
    }
}
