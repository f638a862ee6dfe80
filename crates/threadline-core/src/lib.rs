//! Configuration and workflow adapters for threadline
//!
//! The server crate only knows the `Workflow` trait. This crate turns a YAML
//! configuration into a concrete workflow: either a remote service reached
//! over HTTP or the built-in echo workflow for local runs.

pub mod config;
pub mod errors;
pub mod workflows;

pub use config::{ConfigLoader, ThreadlineConfig, WorkflowConfig};
pub use errors::ConfigError;
pub use workflows::{build_workflow, EchoWorkflow, RemoteWorkflow};
