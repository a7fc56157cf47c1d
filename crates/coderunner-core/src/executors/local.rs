//! Host-process executor: the public entry point for running submissions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::language::{self, LanguageProfile};
use super::process::{self, Interpreter, RunLimits};
use super::toolchain::{self, RuntimeInfo};
use super::workspace::ScratchDir;
use super::wrapper::WrapOptions;
use super::{CodeExecutor, ExecutionRequest, ExecutionResult};
use crate::config::RunnerConfig;
use crate::errors::ExecutorError;

/// Runs submissions as child processes of the current host.
///
/// The timeout and every other limit come from [`RunnerConfig`]; nothing in an
/// [`ExecutionRequest`] can change them. Interpreters are resolved once, when the
/// executor is built.
#[derive(Debug, Clone)]
pub struct LocalCodeExecutor {
    config: RunnerConfig,
    interpreters: Arc<HashMap<&'static str, Interpreter>>,
    scratch: ScratchDir,
    limits: RunLimits,
    wrap_options: WrapOptions,
}

impl LocalCodeExecutor {
    pub fn new(config: RunnerConfig) -> Self {
        let scratch = ScratchDir::new(config.execution.scratch_dir());
        let limits = RunLimits {
            timeout: config.execution.timeout(),
            drain_grace: config.execution.drain_grace(),
            max_output_bytes: config.execution.max_output_bytes,
        };
        let wrap_options = WrapOptions {
            passthrough: config.execution.passthrough,
        };
        let interpreters = Arc::new(toolchain::resolve_all(&config));
        for interpreter in interpreters.values() {
            log::debug!("Resolved {} to {}", interpreter.runtime, interpreter.program.display());
        }
        Self {
            config,
            interpreters,
            scratch,
            limits,
            wrap_options,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn scratch_dir(&self) -> &ScratchDir {
        &self.scratch
    }

    /// The interpreter chosen for a canonical language name.
    pub fn interpreter(&self, language: &str) -> Option<&Interpreter> {
        self.interpreters.get(language)
    }

    /// Check the request shape and resolve its language. Nothing is allocated.
    pub fn validate(request: &ExecutionRequest) -> Result<&'static LanguageProfile, ExecutorError> {
        if request.code.trim().is_empty() {
            return Err(ExecutorError::EmptyCode);
        }
        language::lookup(&request.language)
            .ok_or_else(|| ExecutorError::UnsupportedLanguage(request.language.clone()))
    }

    async fn dispatch(
        &self,
        profile: &'static LanguageProfile,
        request: &ExecutionRequest,
    ) -> Result<ExecutionResult, ExecutorError> {
        let program = profile.wrap_program(&request.code, &request.input, &self.wrap_options);
        let interpreter = self.interpreter(profile.name).ok_or_else(|| {
            ExecutorError::internal(format!("No interpreter resolved for {}", profile.name))
        })?;

        let scratch = self.scratch.allocate(profile).await?;
        // A failed write still owns the file; dropping `scratch` removes it.
        scratch.write(&program).await?;

        Ok(process::run(scratch, interpreter, &self.limits).await)
    }
}

#[async_trait]
impl CodeExecutor for LocalCodeExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult, ExecutorError> {
        log::debug!("Execution received: language={}", request.language);

        let profile = match Self::validate(request) {
            Ok(profile) => profile,
            Err(e) => {
                match &e {
                    ExecutorError::UnsupportedLanguage(language) => {
                        log::info!("Execution rejected: unsupported language '{}'", language)
                    }
                    other => log::info!("Execution rejected: {}", other),
                }
                return Err(e);
            }
        };
        log::debug!("Execution validated, dispatching to {}", profile.name);

        match self.dispatch(profile, request).await {
            Ok(result) => {
                if result.success {
                    log::debug!("{} execution succeeded", profile.name);
                } else {
                    log::debug!("{} execution failed", profile.name);
                }
                Ok(result)
            }
            Err(e) => {
                log::error!("{} execution aborted by internal error: {}", profile.name, e);
                Err(match e {
                    ExecutorError::Internal(_) => e,
                    other => ExecutorError::internal(other.to_string()),
                })
            }
        }
    }

    fn runtimes(&self) -> Vec<RuntimeInfo> {
        toolchain::inventory(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeOverride;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn executor_in(dir: &std::path::Path) -> LocalCodeExecutor {
        let mut config = RunnerConfig::default();
        config.execution.scratch_dir = Some(dir.to_path_buf());
        config.execution.timeout_ms = 2000;
        LocalCodeExecutor::new(config)
    }

    #[tokio::test]
    async fn test_whitespace_code_is_rejected_before_allocation() {
        let dir = tempdir().unwrap();
        let scratch_root = dir.path().join("scratch");
        let executor = executor_in(&scratch_root);

        let err = executor
            .execute(&ExecutionRequest::new("   \n\t", "python", ""))
            .await
            .unwrap_err();
        assert_eq!(err, ExecutorError::EmptyCode);
        assert!(!scratch_root.exists(), "no workspace should be touched");
    }

    #[tokio::test]
    async fn test_unsupported_language_is_rejected() {
        let dir = tempdir().unwrap();
        let scratch_root = dir.path().join("scratch");
        let executor = executor_in(&scratch_root);

        let err = executor
            .execute(&ExecutionRequest::new("puts 1", "ruby", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::UnsupportedLanguage(ref l) if l == "ruby"));
        assert_eq!(err.status_code(), 400);
        assert!(!scratch_root.exists());
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_a_failed_result() {
        let dir = tempdir().unwrap();
        let mut config = RunnerConfig::default();
        config.execution.scratch_dir = Some(dir.path().to_path_buf());
        config.runtimes.insert(
            "python".to_string(),
            RuntimeOverride {
                command: PathBuf::from("/nonexistent/python3"),
            },
        );
        let executor = LocalCodeExecutor::new(config);

        let result = executor
            .execute(&ExecutionRequest::new("print(1)", "PY", ""))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("Python is not installed"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unwritable_scratch_dir_is_internal_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        let executor = executor_in(&blocker.join("scratch"));

        let err = executor
            .execute(&ExecutionRequest::new("print(1)", "python", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::Internal(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_interpreters_are_resolved_at_construction() {
        let mut config = RunnerConfig::default();
        config.runtimes.insert(
            "python".to_string(),
            RuntimeOverride {
                command: PathBuf::from("/opt/py/bin/python3"),
            },
        );
        let executor = LocalCodeExecutor::new(config);

        let python = executor.interpreter("python").unwrap();
        assert_eq!(python.program, PathBuf::from("/opt/py/bin/python3"));
        assert!(executor.interpreter("javascript").is_some());
        assert!(executor.interpreter("ruby").is_none());

        // Clones share the resolved table.
        let clone = executor.clone();
        assert!(Arc::ptr_eq(&executor.interpreters, &clone.interpreters));
    }

    #[test]
    fn test_request_cannot_carry_a_timeout() {
        let request: ExecutionRequest = serde_json::from_str(
            r#"{"code":"x","language":"js","timeout_ms":999999}"#,
        )
        .unwrap();
        assert_eq!(request.input, "");
        let executor = LocalCodeExecutor::new(RunnerConfig::default());
        assert_eq!(executor.limits.timeout.as_millis(), 5000);
    }
}
