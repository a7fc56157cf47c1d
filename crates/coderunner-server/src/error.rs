//! Error types for the HTTP front end.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use coderunner_core::{ExecutionResponse, ExecutorError};
use serde_json::json;
use thiserror::Error;

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that can occur in the server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Rejected by the executor or while dispatching to it
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// Invalid request format
    #[error("{0}")]
    InvalidRequest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Server configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Create a new invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a new configuration error.
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::Executor(e) => e.status_code(),
            ServerError::InvalidRequest(_) => 400,
            ServerError::Io(_) | ServerError::Config(_) | ServerError::Internal(_) => 500,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::Executor(e) => e.error_type(),
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::Io(_) => "io_error",
            ServerError::Config(_) => "config_error",
            ServerError::Internal(_) => "internal_error",
        }
    }
}

/// Request errors become `{error}` with 400; everything else keeps the
/// `{output, status: "Error"}` execution shape with 500.
impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status == StatusCode::BAD_REQUEST {
            log::info!("Rejected request ({}): {}", self.error_type(), self);
            return (status, Json(json!({ "error": self.to_string() }))).into_response();
        }

        log::error!("Request failed ({}): {}", self.error_type(), self);
        let message = match &self {
            ServerError::Executor(ExecutorError::Internal(msg)) => msg.clone(),
            other => other.to_string(),
        };
        (status, Json(ExecutionResponse::server_error(message))).into_response()
    }
}
