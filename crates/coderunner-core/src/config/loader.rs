//! Configuration loader for YAML files and environment overrides

use crate::config::types::*;
use crate::errors::ExecutorError;
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const ENV_TIMEOUT_MS: &str = "CODERUNNER_TIMEOUT_MS";
pub const ENV_SCRATCH_DIR: &str = "CODERUNNER_SCRATCH_DIR";
pub const ENV_BIND_ADDR: &str = "CODERUNNER_BIND_ADDR";

/// Configuration loader with environment resolution
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<RunnerConfig, ExecutorError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).await.map_err(|e| {
            ExecutorError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_str(&content)
    }

    /// Load configuration from a file if it exists, otherwise start from defaults.
    pub async fn from_file_or_default<P: AsRef<Path>>(
        path: P,
    ) -> Result<RunnerConfig, ExecutorError> {
        let path = path.as_ref();
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::from_file(path).await
        } else {
            log::info!(
                "Config file {} not found, using defaults",
                path.display()
            );
            Self::finish(RunnerConfig::default())
        }
    }

    /// Load configuration from a YAML string
    pub fn from_str(content: &str) -> Result<RunnerConfig, ExecutorError> {
        let config: RunnerConfig = if content.trim().is_empty() {
            RunnerConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| {
                ExecutorError::ConfigError(format!("Failed to parse YAML config: {}", e))
            })?
        };

        Self::finish(config)
    }

    fn finish(mut config: RunnerConfig) -> Result<RunnerConfig, ExecutorError> {
        Self::apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CODERUNNER_*` environment variables on top of the parsed document
    pub fn apply_env_overrides(config: &mut RunnerConfig) -> Result<(), ExecutorError> {
        if let Ok(value) = env::var(ENV_TIMEOUT_MS) {
            config.execution.timeout_ms = value.trim().parse().map_err(|e| {
                ExecutorError::ConfigError(format!(
                    "Invalid {} value '{}': {}",
                    ENV_TIMEOUT_MS, value, e
                ))
            })?;
            log::debug!("Timeout overridden from environment: {}ms", config.execution.timeout_ms);
        }

        if let Ok(value) = env::var(ENV_SCRATCH_DIR) {
            if !value.trim().is_empty() {
                config.execution.scratch_dir = Some(PathBuf::from(value));
            }
        }

        if let Ok(value) = env::var(ENV_BIND_ADDR) {
            config.server.bind_addr = value;
        }

        Ok(())
    }
}
