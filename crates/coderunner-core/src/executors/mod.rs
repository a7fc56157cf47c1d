//! Code execution environments for untrusted submissions.
//!
//! Each execution wraps the submitted source into a self-contained program, writes
//! it to a scratch file, and runs it with the language's interpreter as a separate
//! process under a hard timeout. The only value that comes back is an
//! [`ExecutionResult`]: captured stdout on success, a diagnostic otherwise.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ExecutorError;

pub mod language;
pub mod local;
pub mod process;
pub mod toolchain;
pub mod workspace;
pub mod wrapper;

/// One submission to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub input: String,
}

impl ExecutionRequest {
    pub fn new(
        code: impl Into<String>,
        language: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
            input: input.into(),
        }
    }
}

/// Outcome of one execution. `output` is trimmed stdout when `success` is true and
/// a diagnostic message otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub output: String,
}

impl ExecutionResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Run one request. `Err` is reserved for rejected requests and executor faults;
    /// user-code failures come back as an unsuccessful `ExecutionResult`.
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, ExecutorError>;

    /// Installed-runtime report for the supported languages.
    fn runtimes(&self) -> Vec<toolchain::RuntimeInfo>;
}
