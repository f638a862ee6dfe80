//! Server-Sent Events (SSE) front end for externally defined LLM workflows
//!
//! Clients create a thread, then post a conversation to the thread's
//! run-stream route. The server echoes the input, calls the configured
//! [`Workflow`], reshapes the AI and tool messages it returns and writes
//! everything back as `messages/partial` records, followed by
//! `messages/complete`, a heartbeat comment and the end of the response.

pub mod error;
pub mod run;
pub mod sse;
pub mod workflow;

pub use error::{Result, ServerError};
pub use run::{run_events, RunStream};
pub use sse::{SseEvent, SseStream, ToSseEvent};
pub use workflow::{SharedWorkflow, Workflow, WorkflowError, WorkflowInput, WorkflowOutput};

// Re-export commonly used wire types
pub use threadline_types::{
    EventMessage, Message, MessageType, RunStreamRequest, StreamEvent, ThreadCreated, ToolCall,
};

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, HeaderValue, Method};
use axum::response::{Json, Response};
use axum::routing::{get, post};
use axum::{middleware, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

/// Configuration for the threadline server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Enable CORS
    pub enable_cors: bool,
    /// CORS allowed origins (if None, allows any origin)
    pub cors_origins: Option<Vec<String>>,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Enable request logging
    pub enable_logging: bool,
    /// Keep-alive comment interval while a run is idle; `None` disables it
    pub sse_keepalive_interval: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3002)),
            enable_cors: true,
            cors_origins: None,
            max_body_size: 2 * 1024 * 1024,
            enable_logging: true,
            sse_keepalive_interval: Some(Duration::from_secs(15)),
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Parse and set the bind address from a string.
    pub fn with_bind_addr_str(mut self, addr: &str) -> Result<Self> {
        self.bind_addr = addr
            .parse()
            .map_err(|e| ServerError::config_error(format!("Invalid bind address: {}", e)))?;
        Ok(self)
    }

    /// Enable or disable CORS.
    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    /// Set allowed CORS origins. An empty list allows any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = if origins.is_empty() {
            None
        } else {
            Some(origins)
        };
        self
    }

    /// Set maximum request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Enable or disable request logging.
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }

    /// Set the SSE keep-alive interval.
    pub fn with_sse_keepalive(mut self, interval: Option<Duration>) -> Self {
        self.sse_keepalive_interval = interval;
        self
    }
}

/// Shared application state containing the workflow and configuration.
#[derive(Clone)]
pub struct AppState {
    pub workflow: SharedWorkflow,
    pub config: ServerConfig,
}

/// Handler for the /api/threads POST endpoint.
async fn create_thread_handler() -> Json<ThreadCreated> {
    let thread_id = threadline_types::ids::thread_id();
    log::info!("Created thread {}", thread_id);
    Json(ThreadCreated { thread_id })
}

/// Handler for the /api/threads/{thread_id}/runs/stream POST endpoint.
///
/// Always answers 200 with an event stream; failures are reported inside it.
async fn stream_handler(
    State(app_state): State<AppState>,
    Path(thread_id): Path<String>,
    body: Bytes,
) -> Response {
    log::info!("Received stream request for thread: {}", thread_id);

    let events = run_events(app_state.workflow.clone(), thread_id, body);
    sse::create_sse_response(events, app_state.config.sse_keepalive_interval)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Logs every request with a short-lived id and its latency.
async fn log_requests(
    request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();

    log::info!("Request {} {} {}", request_id, method, uri);
    log::debug!("Request {} headers: {:?}", request_id, request.headers());

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    log::info!(
        "Response {} {} in {:?}",
        request_id,
        response.status(),
        duration
    );

    response
}

fn cors_layer(origins: Option<&Vec<String>>) -> CorsLayer {
    let allow_origin = match origins {
        Some(origins) => {
            let parsed: std::result::Result<Vec<HeaderValue>, _> =
                origins.iter().map(|s| s.parse()).collect();
            match parsed {
                Ok(parsed) => AllowOrigin::list(parsed),
                Err(_) => {
                    log::warn!("Invalid CORS origin list {:?}, allowing any origin", origins);
                    AllowOrigin::from(Any)
                }
            }
        }
        None => AllowOrigin::from(Any),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// The threadline SSE server.
pub struct ThreadlineServer {
    workflow: SharedWorkflow,
    config: ServerConfig,
}

impl ThreadlineServer {
    /// Create a new server with the given workflow and default configuration.
    pub fn new(workflow: SharedWorkflow) -> Self {
        Self {
            workflow,
            config: ServerConfig::default(),
        }
    }

    /// Create a new server with custom configuration.
    pub fn with_config(workflow: SharedWorkflow, config: ServerConfig) -> Self {
        Self { workflow, config }
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the Axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let state = AppState {
            workflow: self.workflow.clone(),
            config: self.config.clone(),
        };

        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/api/threads", post(create_thread_handler))
            .route("/api/threads/{thread_id}/runs/stream", post(stream_handler))
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .with_state(state);

        if self.config.enable_logging {
            router = router.layer(middleware::from_fn(log_requests));
        }

        router = router.layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            router = router.layer(cors_layer(self.config.cors_origins.as_ref()));
        }

        router
    }

    async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind(self.config.bind_addr).await.map_err(|e| {
            ServerError::config_error(format!(
                "Failed to bind to {}: {}",
                self.config.bind_addr, e
            ))
        })
    }

    fn log_endpoints(&self, addr: SocketAddr) {
        log::info!("threadline server starting on {}", addr);
        log::info!("Workflow: {}", self.workflow.name());
        log::info!("Health check: http://{}/health", addr);
        log::info!("Create thread: POST http://{}/api/threads", addr);
        log::info!(
            "Run stream: POST http://{}/api/threads/{{thread_id}}/runs/stream",
            addr
        );
    }

    /// Start the server and listen for connections.
    ///
    /// This method will block until the server is shut down.
    pub async fn serve(self) -> Result<()> {
        let listener = self.bind().await?;
        self.log_endpoints(listener.local_addr()?);

        axum::serve(listener, self.build_router())
            .await
            .map_err(|e| ServerError::internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Start the server with graceful shutdown support.
    ///
    /// The server will shut down when the provided shutdown signal is received.
    pub async fn serve_with_shutdown<F>(self, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        self.log_endpoints(listener.local_addr()?);

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::internal(format!("Server error: {}", e)))?;

        log::info!("threadline server shut down gracefully");
        Ok(())
    }
}

/// Utility function to create a shutdown signal from Ctrl+C.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            log::info!("Received SIGTERM, shutting down...");
        },
    }
}
