//! HTTP client for workflows hosted as a separate service.
//!
//! The service receives `{"input": {"messages": […]}, "config": …,
//! "thread_id": …}` and must answer with the final state, of which only
//! `messages` is read.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde::Serialize;
use std::time::Duration;
use threadline_sse::{Workflow, WorkflowError, WorkflowInput, WorkflowOutput};
use threadline_types::Message;

use crate::config::RemoteWorkflowConfig;
use crate::errors::ConfigError;

/// Longest slice of an error body kept in error messages.
const MAX_ERROR_BODY: usize = 512;

#[derive(Serialize)]
struct InvokeInput<'a> {
    messages: &'a [Message],
}

#[derive(Serialize)]
struct InvokeRequest<'a> {
    input: InvokeInput<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<&'a serde_json::Value>,
    thread_id: &'a str,
}

/// Workflow reached over HTTP.
pub struct RemoteWorkflow {
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl RemoteWorkflow {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a client from configuration, with the bearer token and extra
    /// headers attached to every request.
    pub fn from_config(config: &RemoteWorkflowConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();

        if let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| ConfigError::Workflow(format!("Invalid API key: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ConfigError::Workflow(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ConfigError::Workflow(format!("Invalid value for header '{}': {}", name, e)))?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            url: config.url.clone(),
            client,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_string(),
    }
}

#[async_trait]
impl Workflow for RemoteWorkflow {
    async fn invoke(&self, input: WorkflowInput) -> Result<WorkflowOutput, WorkflowError> {
        let payload = InvokeRequest {
            input: InvokeInput {
                messages: &input.messages,
            },
            config: input.config.as_ref(),
            thread_id: &input.thread_id,
        };

        log::debug!(
            "Invoking remote workflow at {} for thread {}",
            self.url,
            input.thread_id
        );

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| WorkflowError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkflowError::Status {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| WorkflowError::Transport(e.to_string()))?;

        serde_json::from_slice::<WorkflowOutput>(&body)
            .map_err(|e| WorkflowError::invalid_response(e.to_string()))
    }

    fn name(&self) -> &str {
        "remote"
    }
}
