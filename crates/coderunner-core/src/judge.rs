//! Test-case judging for a single submission.
//!
//! A submission is run once per test case, sequentially, through any
//! [`CodeExecutor`]. A case passes when the run succeeded and its trimmed output
//! equals the trimmed expected output. Failing or timed-out cases never stop the
//! remaining ones.

use serde::{Deserialize, Serialize};

use crate::errors::ExecutorError;
use crate::executors::local::LocalCodeExecutor;
use crate::executors::{CodeExecutor, ExecutionRequest};
use crate::response::ExecutionStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub expected_output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseReport {
    /// 1-based position in the submitted list
    pub test_case: usize,
    pub input: String,
    pub expected_output: String,
    pub actual_output: String,
    pub status: ExecutionStatus,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeReport {
    pub results: Vec<TestCaseReport>,
    pub tests_passed: usize,
    pub tests_total: usize,
    pub all_passed: bool,
}

/// Run `code` against every case in `cases`, at most `max_cases` of them.
pub async fn judge(
    executor: &dyn CodeExecutor,
    code: &str,
    language: &str,
    cases: &[TestCase],
    max_cases: usize,
) -> Result<JudgeReport, ExecutorError> {
    let probe = ExecutionRequest::new(code, language, "");
    LocalCodeExecutor::validate(&probe)?;

    if cases.is_empty() {
        return Err(ExecutorError::invalid_request("At least one test case is required"));
    }
    if cases.len() > max_cases {
        return Err(ExecutorError::invalid_request(format!(
            "Too many test cases: {} submitted, at most {} allowed",
            cases.len(),
            max_cases
        )));
    }

    let mut results = Vec::with_capacity(cases.len());
    for (index, case) in cases.iter().enumerate() {
        let request = ExecutionRequest::new(code, language, case.input.clone());
        let result = executor.execute(&request).await?;

        let passed = result.success && result.output.trim() == case.expected_output.trim();
        log::debug!("Test case {} {}", index + 1, if passed { "passed" } else { "failed" });

        results.push(TestCaseReport {
            test_case: index + 1,
            input: case.input.clone(),
            expected_output: case.expected_output.clone(),
            status: if result.success {
                ExecutionStatus::Success
            } else {
                ExecutionStatus::Error
            },
            actual_output: result.output,
            passed,
        });
    }

    let tests_total = results.len();
    let tests_passed = results.iter().filter(|r| r.passed).count();
    log::info!("Judged submission: {}/{} test cases passed", tests_passed, tests_total);

    Ok(JudgeReport {
        results,
        tests_passed,
        tests_total,
        all_passed: tests_total > 0 && tests_passed == tests_total,
    })
}
