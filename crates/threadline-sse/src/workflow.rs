//! The workflow seam and utilities around it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use threadline_types::Message;

/// Shared handle to a workflow, as held by the server.
pub type SharedWorkflow = Arc<dyn Workflow>;

/// What a workflow receives for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInput {
    /// Thread the run belongs to, exactly as given in the request path.
    pub thread_id: String,
    /// Conversation messages, unmodified.
    pub messages: Vec<Message>,
    /// Opaque run configuration from the request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl WorkflowInput {
    pub fn new(thread_id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages,
            config: None,
        }
    }

    pub fn with_config(mut self, config: Option<serde_json::Value>) -> Self {
        self.config = config;
        self
    }
}

/// What a workflow hands back once it has finished.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowOutput {
    /// Final message list of the run, in order.
    pub messages: Vec<Message>,
}

impl WorkflowOutput {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

/// Errors a workflow invocation can end with.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// The workflow could not be reached.
    #[error("Workflow transport failed: {0}")]
    Transport(String),

    /// The workflow answered with a non-success status.
    #[error("Workflow returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The workflow's answer could not be decoded.
    #[error("Invalid workflow response: {0}")]
    InvalidResponse(String),

    /// The workflow ran and reported a failure.
    #[error("{0}")]
    Execution(String),
}

impl WorkflowError {
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

/// An externally defined language-model workflow.
///
/// The server knows nothing about how a workflow reaches its answer; it
/// hands over the conversation and waits for the final message list.
#[async_trait]
pub trait Workflow: Send + Sync + 'static {
    /// Run the workflow to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the workflow cannot be reached or fails. The
    /// server reports it to the client as a single `error` record.
    async fn invoke(&self, input: WorkflowInput) -> Result<WorkflowOutput, WorkflowError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "workflow"
    }
}
