//! Sandboxed execution of untrusted code submissions.
//!
//! This crate runs user-submitted JavaScript or Python against a single input
//! value in a separate interpreter process, bounded by a wall-clock timeout, and
//! reports either the captured standard output or a categorized error.
//!
//! # Architecture Overview
//!
//! - **Language registry**: closed table of supported runtimes and their wrappers
//! - **Code wrapper**: turns raw source into a self-contained program with input
//!   binding, output capture and a top-level error trap
//! - **Workspace**: uniquely named scratch files that are always removed
//! - **Process runner**: launches the interpreter, drains both streams and
//!   enforces the timeout with an unconditional kill
//! - **Dispatcher**: validates requests and normalizes results
//! - **Judge**: runs one submission against a list of test cases
//! - **Configuration**: YAML file with environment overrides

pub mod config;
pub mod errors;
pub mod executors;
pub mod judge;
pub mod response;

pub use config::{ConfigLoader, RunnerConfig};
pub use errors::ExecutorError;
pub use executors::local::LocalCodeExecutor;
pub use executors::{CodeExecutor, ExecutionRequest, ExecutionResult};
pub use judge::{JudgeReport, TestCase, TestCaseReport};
pub use response::{ExecutionResponse, ExecutionStatus};
