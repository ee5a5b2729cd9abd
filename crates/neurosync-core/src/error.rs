//! Error types for NeuroSync.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire NeuroSync workspace.
///
/// Variants map onto the three failure classes the application distinguishes:
/// configuration (fatal), generation (recoverable, surfaced as a notice) and
/// input validation (rejected before any call is made).
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StudyError {
    /// Configuration error (missing credential, unreadable settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The generative service failed or returned no usable payload
    #[error("Generation error: {message}")]
    Generation {
        message: String,
        status_code: Option<u16>,
    },

    /// The service answered, but not with the declared schema
    #[error("Schema mismatch in {operation}: {message}")]
    Schema { operation: String, message: String },

    /// Rejected user input (unsupported file, short text, disabled action)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transition not allowed from the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StudyError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Generation error without an HTTP status
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
            status_code: None,
        }
    }

    /// Creates a Generation error carrying the HTTP status of the failed call
    pub fn generation_status(status_code: u16, message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Creates a Schema error for the named operation
    pub fn schema(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an InvalidState error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this error came from the generative service.
    ///
    /// Schema mismatches count: the call produced nothing usable.
    pub fn is_generation(&self) -> bool {
        matches!(self, Self::Generation { .. } | Self::Schema { .. })
    }

    /// Check if this is an input-validation error
    pub fn is_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Generation { .. } | Self::Schema { .. } => {
                format!("Operation failed: {}", self)
            }
            other => other.to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for StudyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

/// A type alias for `Result<T, StudyError>`.
pub type Result<T> = std::result::Result<T, StudyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_counts_as_generation() {
        let err = StudyError::schema("generate_session", "missing field `title`");
        assert!(err.is_generation());
        assert!(!err.is_config());
        assert!(err.user_message().starts_with("Operation failed"));
    }

    #[test]
    fn test_io_conversion_keeps_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StudyError = io.into();
        match err {
            StudyError::Io { message } => assert!(message.contains("NotFound")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_schema_error_deserializes_from_owned_json() {
        let err = StudyError::schema("evaluate_challenge", "missing field `score`");
        let json = serde_json::to_string(&err).unwrap();
        let restored: StudyError = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, err);
        match restored {
            StudyError::Schema { operation, .. } => assert_eq!(operation, "evaluate_challenge"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
