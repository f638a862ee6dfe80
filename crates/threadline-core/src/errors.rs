//! Error types for configuration and workflow construction

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },
    #[error("Failed to parse YAML config: {0}")]
    Parse(String),
    #[error("Environment variable '{0}' is not set and has no default")]
    MissingEnv(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Failed to build workflow: {0}")]
    Workflow(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for ConfigError {
    fn from(err: reqwest::Error) -> Self {
        ConfigError::Workflow(err.to_string())
    }
}
