//! HTTP boundary for the Crucible sandbox.
//!
//! A thin axum layer over [`crucible_core::Sandbox`]: one execute endpoint
//! plus health, with CORS, tracing, and request logging. The server holds no
//! per-request state; each request is an independent task over the shared
//! sandbox.

pub mod error;

pub use error::{ApiError, Result};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Json as AxumJson, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::{middleware, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crucible_core::{ExecutionOutcome, ExecutionRequest, OutcomeStatus, Sandbox};

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Enable CORS
    pub enable_cors: bool,
    /// Enable request logging
    pub enable_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".parse().expect("static address parses"),
            enable_cors: true,
            enable_logging: true,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Enable or disable CORS.
    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    /// Enable or disable request logging.
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub sandbox: Arc<Sandbox>,
}

/// Wire shape of the execute request. Fields are optional here so that
/// missing ones classify as client errors with a named field instead of a
/// deserialization failure.
#[derive(Debug, Deserialize)]
struct ExecutePayload {
    code: Option<String>,
    language: Option<String>,
    stdin: Option<String>,
}

/// Map a classified outcome to the wire shape: success carries streams and
/// warnings, failure carries an error summary plus details.
fn outcome_response(outcome: &ExecutionOutcome) -> Value {
    match outcome.status {
        OutcomeStatus::Success | OutcomeStatus::SuccessWithWarnings => json!({
            "status": outcome.status,
            "stdout": outcome.stdout,
            "stderr": outcome.stderr,
            "warnings": outcome.warnings,
        }),
        OutcomeStatus::ExecutionError => json!({
            "status": outcome.status,
            "error": "Execution failed",
            "details": outcome.stderr,
        }),
        OutcomeStatus::Timeout => json!({
            "status": outcome.status,
            "error": "Execution timed out",
            "details": if outcome.stderr.is_empty() {
                "wall-clock limit exceeded".to_string()
            } else {
                outcome.stderr.clone()
            },
        }),
    }
}

/// Handler for the /execute POST endpoint.
async fn execute_handler(
    State(state): State<AppState>,
    AxumJson(payload): AxumJson<ExecutePayload>,
) -> Result<Json<Value>> {
    let code = payload
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or(ApiError::MissingField("code"))?;
    let language = payload
        .language
        .filter(|l| !l.trim().is_empty())
        .ok_or(ApiError::MissingField("language"))?;

    let mut request = ExecutionRequest::new(code, language);
    request.stdin = payload.stdin;

    let outcome = state.sandbox.execute(request).await?;
    Ok(Json(outcome_response(&outcome)))
}

pub struct CrucibleServer {
    sandbox: Arc<Sandbox>,
    config: ServerConfig,
}

impl CrucibleServer {
    pub fn new(sandbox: Arc<Sandbox>) -> Self {
        Self::with_config(sandbox, ServerConfig::default())
    }

    pub fn with_config(sandbox: Arc<Sandbox>, config: ServerConfig) -> Self {
        Self { sandbox, config }
    }

    pub fn build_router(&self) -> Router {
        let state = AppState {
            sandbox: Arc::clone(&self.sandbox),
        };

        let mut router = Router::new()
            .route("/health", get(|| async {
                Json(HealthResponse {
                    status: "healthy".to_string(),
                    timestamp: chrono::Utc::now(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                })
            }))
            .route("/execute", post(execute_handler))
            .with_state(state);

        if self.config.enable_logging {
            router = router.layer(middleware::from_fn(
                |request: axum::http::Request<axum::body::Body>,
                 next: axum::middleware::Next| async {
                    let request_id = uuid::Uuid::new_v4().to_string();
                    let method = request.method().clone();
                    let uri = request.uri().clone();
                    log::info!("Request {} {} {}", request_id, method, uri);

                    let start = std::time::Instant::now();
                    let response = next.run(request).await;
                    log::info!("Response {} completed in {:?}", request_id, start.elapsed());

                    response
                },
            ));
        }

        router = router.layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            router = router.layer(CorsLayer::permissive());
        }

        router
    }

    /// Start the server and listen for connections. Blocks until shutdown.
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = self.config.bind_addr;
        let listener = TcpListener::bind(addr).await?;
        log::info!("crucible server listening on {}", addr);
        axum::serve(listener, self.build_router()).await?;
        Ok(())
    }

    /// Start the server with a graceful-shutdown future.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.bind_addr;
        let listener = TcpListener::bind(addr).await?;
        log::info!("crucible server listening on {}", addr);
        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

/// Wait for Ctrl+C or SIGTERM.
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
