//! Configuration module for the threadline server
//!
//! Supports YAML configuration files with environment references; every
//! section falls back to defaults so an empty file is a valid configuration.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;


use crate::errors::ConfigError;
use std::path::Path;

/// Load a configuration from a YAML file
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<ThreadlineConfig, ConfigError> {
    ConfigLoader::from_file(path).await
}
