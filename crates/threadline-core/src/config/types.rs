//! Configuration types for the threadline server
//!
//! A configuration file has three sections, all optional:
//!
//! ```yaml
//! server:
//!   bind_addr: "127.0.0.1:3002"
//!   cors_origins: ["http://localhost:5173"]
//!   keepalive_secs: 15
//! logging:
//!   level: debug
//! workflow:
//!   kind: remote
//!   url: "http://localhost:8123/invoke"
//!   api_key: "${WORKFLOW_API_KEY:-}"
//! ```

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use threadline_sse::ServerConfig;

/// Port used when neither the config nor `PORT` names one.
pub const DEFAULT_PORT: u16 = 3002;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThreadlineConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub logging: LoggingSection,

    #[serde(default)]
    pub workflow: WorkflowConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    /// Full bind address; when absent the server binds `0.0.0.0` on `PORT`.
    #[serde(default)]
    pub bind_addr: Option<String>,

    #[serde(default = "default_true")]
    pub cors: bool,

    /// Allowed origins; empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    #[serde(default = "default_true")]
    pub request_logging: bool,

    /// Interval of `: keep-alive` comments while a run is idle; 0 disables them.
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: None,
            cors: true,
            cors_origins: Vec::new(),
            max_body_size: default_max_body_size(),
            request_logging: true,
            keepalive_secs: default_keepalive_secs(),
        }
    }
}

impl ServerSection {
    /// Resolve the bind address, falling back to `0.0.0.0:<port>` where the
    /// port comes from `port_env` (the `PORT` variable) or the default.
    pub fn resolve_bind_addr(&self, port_env: Option<&str>) -> Result<SocketAddr, ConfigError> {
        if let Some(addr) = &self.bind_addr {
            return addr.parse().map_err(|e| {
                ConfigError::Validation(format!("Invalid bind address '{}': {}", addr, e))
            });
        }

        let port = match port_env {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                ConfigError::Validation(format!("Invalid PORT value '{}': {}", raw, e))
            })?,
            None => DEFAULT_PORT,
        };
        Ok(SocketAddr::from(([0, 0, 0, 0], port)))
    }

    /// Build the server configuration.
    pub fn to_server_config(&self, port_env: Option<&str>) -> Result<ServerConfig, ConfigError> {
        let keepalive = match self.keepalive_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(ServerConfig::new()
            .with_bind_addr(self.resolve_bind_addr(port_env)?)
            .with_cors(self.cors)
            .with_cors_origins(self.cors_origins.clone())
            .with_max_body_size(self.max_body_size)
            .with_logging(self.request_logging)
            .with_sse_keepalive(keepalive))
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    /// `env_logger` filter, e.g. `info` or `threadline_sse=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Which workflow the server proxies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WorkflowConfig {
    /// A workflow served over HTTP.
    Remote(RemoteWorkflowConfig),
    /// The built-in echo workflow.
    Echo(EchoWorkflowConfig),
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        WorkflowConfig::Echo(EchoWorkflowConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteWorkflowConfig {
    /// Invoke endpoint of the workflow service.
    pub url: String,

    /// Sent as a bearer token when non-empty.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra request headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl RemoteWorkflowConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            headers: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoWorkflowConfig {
    /// Text placed before the echoed message.
    #[serde(default = "default_echo_prefix")]
    pub prefix: String,
}

impl Default for EchoWorkflowConfig {
    fn default() -> Self {
        Self {
            prefix: default_echo_prefix(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_body_size() -> usize {
    2 * 1024 * 1024
}

fn default_keepalive_secs() -> u64 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_echo_prefix() -> String {
    "Echo: ".to_string()
}
