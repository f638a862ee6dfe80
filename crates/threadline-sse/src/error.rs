//! Error types for the threadline server.

use thiserror::Error;

use crate::workflow::WorkflowError;

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that can occur in the threadline server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Workflow invocation error
    #[error("Workflow failed: {0}")]
    Workflow(#[from] WorkflowError),

    /// Wire type error
    #[error("Protocol error: {0}")]
    Types(#[from] threadline_types::TypesError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid request format
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Server configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Create a new invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a new configuration error.
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Text placed in the `error` record sent to stream clients.
    ///
    /// Workflow failures are reported with the workflow's own message.
    pub fn client_message(&self) -> String {
        match self {
            ServerError::Workflow(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_unwraps_workflow_errors() {
        let err = ServerError::from(WorkflowError::execution("graph recursion limit"));
        assert_eq!(err.client_message(), "graph recursion limit");
        assert_eq!(err.to_string(), "Workflow failed: graph recursion limit");
    }

    #[test]
    fn test_client_message_for_bad_requests() {
        let err = ServerError::invalid_request("missing field `input`");
        assert_eq!(err.client_message(), "Invalid request: missing field `input`");
    }
}
