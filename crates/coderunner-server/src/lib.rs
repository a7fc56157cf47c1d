//! HTTP front end for the sandboxed code executor
//!
//! Exposes the executor and the test-case judge as JSON endpoints. The server is a
//! thin translation layer: it parses request bodies, hands them to a
//! [`CodeExecutor`], and maps the outcome onto the response contract. Request
//! problems become `400 {error}`, executions (successful or not) become
//! `200 {output, status}`, and executor faults become `500 {output, status}`.

pub mod error;

pub use error::{Result, ServerError};

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Json as AxumJson, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::{middleware, Router};
use coderunner_core::config::ServerSettings;
use coderunner_core::executors::toolchain::RuntimeInfo;
use coderunner_core::judge::{self, JudgeReport, TestCase};
use coderunner_core::{CodeExecutor, ExecutionRequest, ExecutionResponse};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const MISSING_FIELDS: &str = "Code and language are required";

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
    /// Enable permissive CORS
    pub enable_cors: bool,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Enable request logging
    pub enable_logging: bool,
    /// Upper bound on test cases per judge request
    pub max_test_cases: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            enable_cors: true,
            max_body_size: 256 * 1024,
            enable_logging: true,
            max_test_cases: 20,
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `server` section of the runner configuration.
    pub fn from_settings(settings: &ServerSettings, max_test_cases: usize) -> Result<Self> {
        Self::default()
            .with_bind_addr_str(&settings.bind_addr)
            .map(|config| {
                config
                    .with_cors(settings.enable_cors)
                    .with_logging(settings.enable_logging)
                    .with_max_body_size(settings.max_body_size)
                    .with_max_test_cases(max_test_cases)
            })
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
            .map_err(|e| ServerError::config_error(format!("Invalid bind address '{}': {}", addr, e)))?;
        Ok(self)
    }

    /// Enable or disable CORS.
    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
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

    pub fn with_max_test_cases(mut self, max: usize) -> Self {
        self.max_test_cases = max;
        self
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<dyn CodeExecutor>,
    pub config: ServerConfig,
}

/// Body of `POST /api/execute`. Fields are optional so that missing ones can be
/// reported with a specific message instead of a generic parse failure.
#[derive(Debug, Deserialize)]
pub struct ExecuteBody {
    pub code: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
}

/// Body of `POST /api/execute/tests`.
#[derive(Debug, Deserialize)]
pub struct JudgeBody {
    pub code: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

fn parse_body<T>(body: std::result::Result<AxumJson<T>, JsonRejection>) -> Result<T> {
    body.map(|AxumJson(value)| value)
        .map_err(|rejection| ServerError::invalid_request(format!("Invalid request body: {}", rejection.body_text())))
}

/// Both fields must be present and non-empty strings; emptiness after trimming is
/// the executor's call.
fn required_fields(code: Option<String>, language: Option<String>) -> Result<(String, String)> {
    match (code, language) {
        (Some(code), Some(language)) if !code.is_empty() && !language.is_empty() => Ok((code, language)),
        _ => Err(ServerError::invalid_request(MISSING_FIELDS)),
    }
}

/// Handler for the /api/execute POST endpoint.
async fn execute_handler(
    State(app_state): State<AppState>,
    body: std::result::Result<AxumJson<ExecuteBody>, JsonRejection>,
) -> Result<Json<ExecutionResponse>> {
    let body = parse_body(body)?;
    let (code, language) = required_fields(body.code, body.language)?;
    let request = ExecutionRequest::new(code, language, body.input.unwrap_or_default());

    let result = app_state.executor.execute(&request).await?;
    Ok(Json(result.into()))
}

/// Handler for the /api/execute/tests POST endpoint.
async fn judge_handler(
    State(app_state): State<AppState>,
    body: std::result::Result<AxumJson<JudgeBody>, JsonRejection>,
) -> Result<Json<JudgeReport>> {
    let body = parse_body(body)?;
    let (code, language) = required_fields(body.code, body.language)?;

    let report = judge::judge(
        app_state.executor.as_ref(),
        &code,
        &language,
        &body.test_cases,
        app_state.config.max_test_cases,
    )
    .await?;
    Ok(Json(report))
}

/// Handler for the /runtimes GET endpoint.
async fn runtimes_handler(State(app_state): State<AppState>) -> Result<Json<Vec<RuntimeInfo>>> {
    // The inventory scans PATH.
    let executor = app_state.executor.clone();
    let runtimes = tokio::task::spawn_blocking(move || executor.runtimes())
        .await
        .map_err(|e| ServerError::internal(format!("Runtime inventory failed: {}", e)))?;
    Ok(Json(runtimes))
}

/// The code execution HTTP server.
pub struct CoderunnerServer {
    executor: Arc<dyn CodeExecutor>,
    config: ServerConfig,
}

impl CoderunnerServer {
    /// Create a new server with default configuration.
    pub fn new(executor: Arc<dyn CodeExecutor>) -> Self {
        Self {
            executor,
            config: ServerConfig::default(),
        }
    }

    /// Create a new server with custom configuration.
    pub fn with_config(executor: Arc<dyn CodeExecutor>, config: ServerConfig) -> Self {
        Self { executor, config }
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the Axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let state = AppState {
            executor: self.executor.clone(),
            config: self.config.clone(),
        };

        let mut router = Router::new()
            .route("/health", get(|| async {
                Json(HealthResponse {
                    status: "healthy".to_string(),
                    timestamp: chrono::Utc::now(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                })
            }))
            .route("/runtimes", get(runtimes_handler))
            // OPTIONS answers CORS preflight
            .route(
                "/api/execute",
                post(execute_handler).options(|| async { StatusCode::OK }),
            )
            .route(
                "/api/execute/tests",
                post(judge_handler).options(|| async { StatusCode::OK }),
            )
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .with_state(state);

        if self.config.enable_logging {
            router = router.layer(middleware::from_fn(
                |request: axum::http::Request<axum::body::Body>, next: axum::middleware::Next| async move {
                    let request_id = uuid::Uuid::new_v4().to_string();
                    let method = request.method().clone();
                    let uri = request.uri().clone();

                    // Health probes are noisy
                    if uri.path() == "/health" {
                        log::debug!("Request {} {} {}", request_id, method, uri);
                    } else {
                        log::info!("Request {} {} {}", request_id, method, uri);
                    }

                    let start = std::time::Instant::now();
                    let response = next.run(request).await;
                    log::info!(
                        "Response {} {} completed in {:?}",
                        request_id,
                        response.status(),
                        start.elapsed()
                    );

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

    /// Start the server with graceful shutdown support.
    ///
    /// The server will shut down when the provided shutdown signal is received.
    pub async fn serve_with_shutdown<F>(self, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let listener = TcpListener::bind(self.config.bind_addr)
            .await
            .map_err(|e| {
                ServerError::config_error(format!(
                    "Failed to bind to {}: {}",
                    self.config.bind_addr, e
                ))
            })?;

        log::info!("coderunner server listening on {}", self.config.bind_addr);
        log::info!("Execute endpoint: http://{}/api/execute", self.config.bind_addr);
        log::info!("Judge endpoint: http://{}/api/execute/tests", self.config.bind_addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::internal(format!("Server error: {}", e)))?;

        log::info!("coderunner server shut down gracefully");
        Ok(())
    }
}

/// Utility function to create a shutdown signal from Ctrl+C.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
