//! End-to-end runs against the host's real interpreters.
//!
//! Each test returns early when its runtime is not installed.

use coderunner_core::executors::toolchain;
use coderunner_core::judge::{judge, TestCase};
use coderunner_core::{
    CodeExecutor, ExecutionRequest, ExecutionResponse, ExecutionStatus, ExecutorError,
    LocalCodeExecutor, RunnerConfig,
};
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::{tempdir, TempDir};

fn runtime_available(language: &str) -> bool {
    let available = toolchain::inventory(&RunnerConfig::default())
        .iter()
        .any(|info| info.language == language && info.available);
    if !available {
        eprintln!("skipping: {} runtime not installed", language);
    }
    available
}

fn executor(dir: &TempDir, timeout_ms: u64) -> LocalCodeExecutor {
    let mut config = RunnerConfig::default();
    config.execution.scratch_dir = Some(dir.path().to_path_buf());
    config.execution.timeout_ms = timeout_ms;
    LocalCodeExecutor::new(config)
}

fn scratch_is_empty(path: &Path) -> bool {
    match std::fs::read_dir(path) {
        Ok(entries) => entries.count() == 0,
        Err(_) => true,
    }
}

async fn respond(executor: &LocalCodeExecutor, code: &str, language: &str, input: &str) -> ExecutionResponse {
    executor
        .execute(&ExecutionRequest::new(code, language, input))
        .await
        .expect("request should be accepted")
        .into()
}

#[tokio::test]
async fn test_javascript_prints_sum() {
    if !runtime_available("javascript") {
        return;
    }
    let dir = tempdir().unwrap();
    let executor = executor(&dir, 5000);

    let response = respond(&executor, "console.log(1+1)", "javascript", "").await;
    assert_eq!(response.status, ExecutionStatus::Success);
    assert_eq!(response.output, "2");
    assert!(scratch_is_empty(dir.path()));
}

#[tokio::test]
async fn test_javascript_formats_values_and_reads_input() {
    if !runtime_available("javascript") {
        return;
    }
    let dir = tempdir().unwrap();
    let executor = executor(&dir, 5000);

    let code = "const nums = JSON.parse(INPUT);\nconsole.log(nums.map(n => n * 2), true, 'x');\nconsole.log({ ok: 1 })";
    let response = respond(&executor, code, "js", "[1,2,3]").await;
    assert_eq!(response.status, ExecutionStatus::Success);
    assert_eq!(response.output, "[2,4,6] true x\n{\"ok\":1}");
}

#[tokio::test]
async fn test_javascript_runtime_error_goes_to_output() {
    if !runtime_available("javascript") {
        return;
    }
    let dir = tempdir().unwrap();
    let executor = executor(&dir, 5000);

    let response = respond(&executor, "console.log('before');\nthrow new Error('kaput')", "javascript", "").await;
    assert_eq!(response.status, ExecutionStatus::Error);
    assert!(response.output.starts_with("Runtime Error: kaput"), "{}", response.output);
    assert!(!response.output.contains("before"));
    assert!(scratch_is_empty(dir.path()));
}

#[tokio::test]
async fn test_javascript_async_output_is_kept() {
    if !runtime_available("javascript") {
        return;
    }
    let dir = tempdir().unwrap();
    let executor = executor(&dir, 5000);

    let code = "async function main() {\n  const n = await Promise.resolve(Number(INPUT));\n  console.log(n * 2);\n}\nmain();";
    let response = respond(&executor, code, "javascript", "21").await;
    assert_eq!(response.status, ExecutionStatus::Success);
    assert_eq!(response.output, "42");

    let response = respond(&executor, "console.log('now');\nsetTimeout(() => console.log('late'), 10);", "javascript", "").await;
    assert_eq!(response.status, ExecutionStatus::Success);
    assert_eq!(response.output, "now\nlate");
    assert!(scratch_is_empty(dir.path()));
}

#[tokio::test]
async fn test_javascript_process_exit_keeps_output() {
    if !runtime_available("javascript") {
        return;
    }
    let dir = tempdir().unwrap();
    let executor = executor(&dir, 5000);

    let response = respond(&executor, "console.log('a');\nprocess.exit(0);\nconsole.log('b');", "javascript", "").await;
    assert_eq!(response.status, ExecutionStatus::Success);
    assert_eq!(response.output, "a");
}

#[tokio::test]
async fn test_javascript_async_rejection_reports_once() {
    if !runtime_available("javascript") {
        return;
    }
    let dir = tempdir().unwrap();
    let executor = executor(&dir, 5000);

    let code = "console.log('partial');\nasync function main() { await null; throw new Error('later'); }\nmain();";
    let response = respond(&executor, code, "javascript", "").await;
    assert_eq!(response.status, ExecutionStatus::Error);
    assert!(response.output.starts_with("Runtime Error: later"), "{}", response.output);
    assert!(!response.output.contains("partial"));
}

#[tokio::test]
async fn test_python_cannot_see_other_programs() {
    if !runtime_available("python") {
        return;
    }
    let dir = tempdir().unwrap();
    let executor = executor(&dir, 5000);

    let response = respond(&executor, "import os\nprint(len(os.listdir('.')))", "python", "").await;
    assert_eq!(response.status, ExecutionStatus::Success);
    assert_eq!(response.output, "1");
}

#[tokio::test]
async fn test_python_raise_reports_runtime_error() {
    if !runtime_available("python") {
        return;
    }
    let dir = tempdir().unwrap();
    let executor = executor(&dir, 5000);

    let response = respond(&executor, "raise ValueError('bad')", "python", "").await;
    assert_eq!(response.status, ExecutionStatus::Error);
    assert!(response.output.contains("Runtime Error: bad"), "{}", response.output);
    assert!(response.output.contains("ValueError"));
    assert!(scratch_is_empty(dir.path()));
}

#[tokio::test]
async fn test_python_preserves_indentation_and_multiline_strings() {
    if !runtime_available("python") {
        return;
    }
    let dir = tempdir().unwrap();
    let executor = executor(&dir, 5000);

    let code = "def solve(n):\n    if n <= 1:\n        return 1\n    return n * solve(n - 1)\n\nbanner = \"\"\"a\n  b\"\"\"\nprint(banner)\nprint(solve(int(INPUT)))\n";
    let response = respond(&executor, code, "py", "5").await;
    assert_eq!(response.status, ExecutionStatus::Success);
    assert_eq!(response.output, "a\n  b\n120");
}

#[tokio::test]
async fn test_python_sys_exit_zero_is_success() {
    if !runtime_available("python") {
        return;
    }
    let dir = tempdir().unwrap();
    let executor = executor(&dir, 5000);

    let response = respond(&executor, "print('done')\nsys.exit(0)", "python", "").await;
    assert_eq!(response.status, ExecutionStatus::Success);
    assert_eq!(response.output, "done");
}

#[tokio::test]
async fn test_python_infinite_loop_times_out() {
    if !runtime_available("python") {
        return;
    }
    let dir = tempdir().unwrap();
    let executor = executor(&dir, 1000);

    let started = Instant::now();
    let response = respond(&executor, "while True: pass", "python", "").await;
    assert_eq!(response.status, ExecutionStatus::Error);
    assert_eq!(response.output, "Time Limit Exceeded (1 seconds)");
    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(scratch_is_empty(dir.path()));
}

#[tokio::test]
async fn test_shell_metacharacters_are_inert() {
    if !runtime_available("python") {
        return;
    }
    let dir = tempdir().unwrap();
    let canary = dir.path().join("canary");
    let executor = executor(&dir, 5000);

    let input = format!("\"; touch {} ; echo \"", canary.display());
    let code = "print(INPUT)\nx = '`touch /tmp/never` $(touch /tmp/never)'\n";
    let response = respond(&executor, code, "python", &input).await;
    assert_eq!(response.status, ExecutionStatus::Success);
    assert_eq!(response.output, input.trim());
    assert!(!canary.exists());
}

#[tokio::test]
async fn test_identical_requests_give_identical_responses() {
    if !runtime_available("python") {
        return;
    }
    let dir = tempdir().unwrap();
    let executor = executor(&dir, 5000);

    let first = respond(&executor, "print(len(INPUT))", "python", "abcd").await;
    let second = respond(&executor, "print(len(INPUT))", "python", "abcd").await;
    assert_eq!(first, second);
    assert_eq!(first.output, "4");
}

#[tokio::test]
async fn test_concurrent_executions_are_independent() {
    if !runtime_available("python") {
        return;
    }
    let dir = tempdir().unwrap();
    let executor = executor(&dir, 5000);

    let runs = (0..6).map(|i| {
        let executor = executor.clone();
        tokio::spawn(async move {
            let request = ExecutionRequest::new("print(int(INPUT) * 10)", "python", i.to_string());
            executor.execute(&request).await.unwrap()
        })
    });
    let handles: Vec<_> = runs.collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, (i * 10).to_string());
    }
    assert!(scratch_is_empty(dir.path()));
}

#[tokio::test]
async fn test_whitespace_code_never_launches() {
    let dir = tempdir().unwrap();
    let executor = executor(&dir, 5000);

    let err = executor
        .execute(&ExecutionRequest::new("   ", "python", ""))
        .await
        .unwrap_err();
    assert_eq!(err, ExecutorError::EmptyCode);
    assert!(scratch_is_empty(dir.path()));
}

#[tokio::test]
async fn test_judge_runs_every_case() {
    if !runtime_available("javascript") {
        return;
    }
    let dir = tempdir().unwrap();
    let executor = executor(&dir, 5000);

    let cases = vec![
        TestCase { input: "2".into(), expected_output: "4".into() },
        TestCase { input: "5".into(), expected_output: "25".into() },
        TestCase { input: "3".into(), expected_output: "10".into() },
    ];
    let report = judge(&executor, "const n = Number(INPUT);\nconsole.log(n * n)", "javascript", &cases, 20)
        .await
        .unwrap();
    assert_eq!(report.tests_total, 3);
    assert_eq!(report.tests_passed, 2);
    assert!(!report.all_passed);
    assert_eq!(report.results[2].actual_output, "9");
}
