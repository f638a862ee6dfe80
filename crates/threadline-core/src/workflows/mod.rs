//! Workflow adapters the server can proxy to.

pub mod echo;
pub mod remote;

pub use echo::EchoWorkflow;
pub use remote::RemoteWorkflow;

use crate::config::WorkflowConfig;
use crate::errors::ConfigError;
use std::sync::Arc;
use threadline_sse::SharedWorkflow;

/// Build the workflow described by `config`.
pub fn build_workflow(config: &WorkflowConfig) -> Result<SharedWorkflow, ConfigError> {
    match config {
        WorkflowConfig::Remote(remote) => {
            log::info!("Using remote workflow at {}", remote.url);
            Ok(Arc::new(RemoteWorkflow::from_config(remote)?))
        }
        WorkflowConfig::Echo(echo) => {
            log::info!("Using built-in echo workflow");
            Ok(Arc::new(EchoWorkflow::new(echo.prefix.clone())))
        }
    }
}
