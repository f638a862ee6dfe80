//! HTTP server that streams LLM workflow runs to clients as server-sent events
//!
//! Loads an optional YAML configuration, applies command-line overrides,
//! builds the configured workflow and serves the thread routes until Ctrl+C
//! or SIGTERM.

use anyhow::Result;
use clap::Parser;
use threadline_core::config::{EchoWorkflowConfig, RemoteWorkflowConfig};
use threadline_core::{build_workflow, ConfigLoader, ThreadlineConfig, WorkflowConfig};
use threadline_sse::{shutdown_signal, ThreadlineServer};

#[derive(Parser, Debug)]
#[clap(author, version, about = "threadline - stream LLM workflow runs over SSE")]
struct Cli {
    #[clap(long, short, help = "Path to a YAML configuration file")]
    config: Option<String>,

    #[clap(long, short, help = "Bind address, e.g. 127.0.0.1:3002 (defaults to 0.0.0.0:$PORT)")]
    bind: Option<String>,

    #[clap(long, help = "Invoke URL of a remote workflow service")]
    workflow_url: Option<String>,

    #[clap(long, conflicts_with = "workflow_url", help = "Use the built-in echo workflow")]
    echo: bool,

    #[clap(long, short, help = "Log level or env_logger filter (overrides the config file)")]
    log_level: Option<String>,

    #[clap(long, help = "Disable the CORS layer")]
    no_cors: bool,
}

impl Cli {
    fn apply(&self, config: &mut ThreadlineConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind_addr = Some(bind.clone());
        }
        if let Some(url) = &self.workflow_url {
            config.workflow = WorkflowConfig::Remote(RemoteWorkflowConfig::new(url.clone()));
        }
        if self.echo {
            config.workflow = WorkflowConfig::Echo(EchoWorkflowConfig::default());
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.no_cors {
            config.server.cors = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ConfigLoader::from_file(path).await?,
        None => ThreadlineConfig::default(),
    };
    cli.apply(&mut config);
    config.validate()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    if let Some(path) = &cli.config {
        log::info!("Configuration loaded from: {}", path);
    }

    let port_env = std::env::var("PORT").ok();
    let server_config = config.server.to_server_config(port_env.as_deref())?;
    let workflow = build_workflow(&config.workflow)?;

    log::info!("Starting threadline server on {}...", server_config.bind_addr);
    log::info!("  CORS enabled: {}", server_config.enable_cors);
    log::info!("  Max body size: {} bytes", server_config.max_body_size);
    log::info!("  SSE keep-alive: {:?}", server_config.sse_keepalive_interval);

    let server = ThreadlineServer::with_config(workflow, server_config);

    if let Err(e) = server.serve_with_shutdown(shutdown_signal()).await {
        log::error!("Server failed: {}", e);
        return Err(e.into());
    }

    log::info!("threadline server shut down gracefully.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "threadline-server",
            "--bind",
            "127.0.0.1:4100",
            "--workflow-url",
            "http://localhost:8123/invoke",
            "--log-level",
            "debug",
            "--no-cors",
        ]);

        let mut config = ThreadlineConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.server.bind_addr.as_deref(), Some("127.0.0.1:4100"));
        assert!(!config.server.cors);
        assert_eq!(config.logging.level, "debug");
        assert!(matches!(config.workflow, WorkflowConfig::Remote(ref r) if r.url == "http://localhost:8123/invoke"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_echo_and_url_conflict() {
        let result = Cli::try_parse_from([
            "threadline-server",
            "--echo",
            "--workflow-url",
            "http://localhost:8123/invoke",
        ]);
        assert!(result.is_err());
    }
}
