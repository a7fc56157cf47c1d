//! External response contract for executions.

use serde::{Deserialize, Serialize};

use crate::executors::ExecutionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Success,
    Error,
}

/// `{output, status}` as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub output: String,
    pub status: ExecutionStatus,
}

impl ExecutionResponse {
    /// Generic shape for faults inside the executor itself.
    pub fn server_error(message: impl std::fmt::Display) -> Self {
        Self {
            output: format!("Server Error: {}", message),
            status: ExecutionStatus::Error,
        }
    }
}

impl From<ExecutionResult> for ExecutionResponse {
    fn from(result: ExecutionResult) -> Self {
        let status = if result.success {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Error
        };
        Self {
            output: result.output,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_serializes_as_capitalized_word() {
        let ok: ExecutionResponse = ExecutionResult::success("2").into();
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"output": "2", "status": "Success"}));

        let failed: ExecutionResponse = ExecutionResult::failure("Runtime Error: bad").into();
        assert_eq!(failed.status, ExecutionStatus::Error);
        assert_eq!(failed.output, "Runtime Error: bad");
    }

    #[test]
    fn test_server_error_shape() {
        let response = ExecutionResponse::server_error("disk full");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"output": "Server Error: disk full", "status": "Error"})
        );
    }
}
