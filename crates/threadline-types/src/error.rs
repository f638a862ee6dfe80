//! Error types for threadline wire operations.

use thiserror::Error;

/// Errors that can occur while encoding or decoding wire types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypesError {
    /// A serialization error occurred.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// An event tag that is not part of the run-stream protocol.
    #[error("Invalid event type: {event_type}")]
    InvalidEventType { event_type: String },
}

impl TypesError {
    /// Create a new serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for TypesError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Result type for wire operations.
pub type TypesResult<T> = Result<T, TypesError>;
