//! Error types for request rejection and executor faults
//!
//! Only two kinds of failure ever leave the executor as an `Err`: problems with the
//! request itself, which are detected before anything is allocated, and faults in
//! the executor's own machinery. Everything that happens to user code (runtime
//! errors, missing interpreters, timeouts) is reported as an unsuccessful
//! `ExecutionResult` instead.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Code cannot be empty")]
    EmptyCode,
    /// Carries the rejected value for logging; the message is fixed.
    #[error("Unsupported language. Use \"javascript\" or \"python\"")]
    UnsupportedLanguage(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for ExecutorError {
    fn from(err: std::io::Error) -> Self {
        ExecutorError::IoError(err.to_string())
    }
}

impl ExecutorError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for rejections that happen before any process is launched.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            ExecutorError::InvalidRequest(_)
                | ExecutorError::EmptyCode
                | ExecutorError::UnsupportedLanguage(_)
        )
    }

    /// HTTP-equivalent status for this error.
    pub fn status_code(&self) -> u16 {
        if self.is_request_error() {
            400
        } else {
            500
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ExecutorError::InvalidRequest(_) => "invalid_request",
            ExecutorError::EmptyCode => "empty_code",
            ExecutorError::UnsupportedLanguage(_) => "unsupported_language",
            ExecutorError::ConfigError(_) => "config_error",
            ExecutorError::IoError(_) => "io_error",
            ExecutorError::Internal(_) => "internal_error",
        }
    }
}
