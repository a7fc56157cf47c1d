//! Configuration types

use crate::errors::ExecutorError;
use crate::executors::language;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration document
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RunnerConfig {
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Per-language interpreter overrides keyed by canonical language name
    #[serde(default)]
    pub runtimes: HashMap<String, RuntimeOverride>,
    #[serde(default)]
    pub server: ServerSettings,
}

/// Limits and behaviour of a single execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionConfig {
    /// Hard wall-clock limit per execution, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Directory for scratch files; defaults to `<temp dir>/coderunner`
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
    /// Cap on bytes retained per output stream
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
    /// How long to keep draining pipes after the child has exited
    #[serde(default = "default_drain_grace_ms")]
    pub drain_grace_ms: u64,
    /// Forward captured writes to the real stdout as they happen
    #[serde(default)]
    pub passthrough: bool,
    #[serde(default = "default_max_test_cases")]
    pub max_test_cases: usize,
}

/// Explicit interpreter for one language
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuntimeOverride {
    pub command: PathBuf,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_true")]
    pub enable_cors: bool,
    #[serde(default = "default_true")]
    pub enable_logging: bool,
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

// Default value functions
fn default_timeout_ms() -> u64 { 5000 }
fn default_max_output_bytes() -> usize { 1024 * 1024 }
fn default_drain_grace_ms() -> u64 { 250 }
fn default_max_test_cases() -> usize { 20 }
fn default_bind_addr() -> String { "127.0.0.1:3001".to_string() }
fn default_max_body_size() -> usize { 256 * 1024 }
fn default_true() -> bool { true }

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            scratch_dir: None,
            max_output_bytes: default_max_output_bytes(),
            drain_grace_ms: default_drain_grace_ms(),
            passthrough: false,
            max_test_cases: default_max_test_cases(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            enable_cors: true,
            enable_logging: true,
            max_body_size: default_max_body_size(),
        }
    }
}

impl ExecutionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn drain_grace(&self) -> Duration {
        Duration::from_millis(self.drain_grace_ms)
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("coderunner"))
    }
}

impl RunnerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExecutorError> {
        if self.execution.timeout_ms == 0 {
            return Err(ExecutorError::ConfigError(
                "execution.timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.execution.max_output_bytes == 0 {
            return Err(ExecutorError::ConfigError(
                "execution.max_output_bytes must be greater than 0".to_string(),
            ));
        }

        if self.execution.max_test_cases == 0 {
            return Err(ExecutorError::ConfigError(
                "execution.max_test_cases must be greater than 0".to_string(),
            ));
        }

        for (name, runtime) in &self.runtimes {
            if language::lookup(name).is_none() {
                return Err(ExecutorError::ConfigError(format!(
                    "Unknown runtime '{}' in runtimes section",
                    name
                )));
            }
            if runtime.command.as_os_str().is_empty() {
                return Err(ExecutorError::ConfigError(format!(
                    "Runtime '{}' command cannot be empty",
                    name
                )));
            }
        }

        if self.server.bind_addr.trim().is_empty() {
            return Err(ExecutorError::ConfigError(
                "server.bind_addr cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Interpreter override for a language, matched by any of its aliases
    pub fn runtime_override(&self, language_name: &str) -> Option<&PathBuf> {
        self.runtimes
            .iter()
            .find(|(key, _)| {
                language::lookup(key).map(|profile| profile.name) == Some(language_name)
            })
            .map(|(_, runtime)| &runtime.command)
    }
}
