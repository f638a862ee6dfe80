//! Configuration loader for YAML files and environment resolution
//!
//! `${VAR}` and `${VAR:-default}` references are substituted before the YAML
//! is parsed, so they can appear in any string value. Full-line comments are
//! left alone.

use crate::config::types::*;
use crate::errors::ConfigError;
use regex::{Captures, Regex};
use std::env;
use std::path::Path;
use std::sync::OnceLock;
use tokio::fs;

fn env_reference() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("environment reference pattern is valid")
    })
}

/// Configuration loader with environment resolution
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<ThreadlineConfig, ConfigError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Read {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        log::debug!("Read {} bytes of configuration from {}", content.len(), path.display());
        Self::from_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_str(content: &str) -> Result<ThreadlineConfig, ConfigError> {
        let resolved = Self::resolve_environment(content, |name| env::var(name).ok())?;

        // An empty document means "all defaults".
        let config: ThreadlineConfig = if resolved.trim().is_empty() {
            ThreadlineConfig::default()
        } else {
            serde_yaml::from_str(&resolved)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Substitute environment references using `lookup`.
    ///
    /// Full-line YAML comments are copied untouched, so a commented-out
    /// `${VAR}` never has to be set.
    pub fn resolve_environment<F>(content: &str, lookup: F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = None;
        let mut resolved = String::with_capacity(content.len());

        for line in content.split_inclusive('\n') {
            if line.trim_start().starts_with('#') {
                resolved.push_str(line);
                continue;
            }

            let replaced = env_reference().replace_all(line, |caps: &Captures| {
                let name = &caps[1];
                match (lookup(name), caps.get(2)) {
                    (Some(value), _) => value,
                    (None, Some(default)) => default.as_str().to_string(),
                    (None, None) => {
                        missing.get_or_insert_with(|| name.to_string());
                        String::new()
                    }
                }
            });
            resolved.push_str(&replaced);
        }

        match missing {
            Some(name) => Err(ConfigError::MissingEnv(name)),
            None => Ok(resolved),
        }
    }
}

impl ThreadlineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.max_body_size == 0 {
            return Err(ConfigError::Validation(
                "server.max_body_size must be greater than zero".to_string(),
            ));
        }

        if let Some(addr) = &self.server.bind_addr {
            self.server.resolve_bind_addr(None).map_err(|_| {
                ConfigError::Validation(format!("server.bind_addr '{}' is not a socket address", addr))
            })?;
        }

        if let WorkflowConfig::Remote(remote) = &self.workflow {
            if remote.url.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "workflow.url is required for remote workflows".to_string(),
                ));
            }
            if !(remote.url.starts_with("http://") || remote.url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "workflow.url must be an http(s) URL, got '{}'",
                    remote.url
                )));
            }
            if remote.timeout_secs == 0 {
                return Err(ConfigError::Validation(
                    "workflow.timeout_secs must be greater than zero".to_string(),
                ));
            }
        }

        Ok(())
    }
}
