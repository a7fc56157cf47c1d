//! Configuration for the executor and its HTTP front end
//!
//! Configuration is read from an optional YAML file, then selected fields can be
//! overridden from the environment. Every field has a default so an empty document
//! is a valid configuration.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;


use crate::errors::ExecutorError;
use std::path::Path;

/// Load a configuration from a YAML file
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<RunnerConfig, ExecutorError> {
    ConfigLoader::from_file(path).await
}
