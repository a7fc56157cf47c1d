//! Interpreter process supervision.
//!
//! A run has exactly one terminal transition: normal exit (zero or non-zero),
//! launch failure, or timeout. [`Supervisor`] commits the first one and turns
//! anything observed afterwards (for example the exit status reaped after a
//! timeout kill) into a logged no-op. The scratch file is released once, after the
//! terminal transition, on every path.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::workspace::ScratchFile;
use super::ExecutionResult;

/// Variables passed through to the interpreter; everything else is cleared.
const INHERITED_ENV: &[&str] = &["PATH", "LANG", "LC_ALL", "SYSTEMROOT", "TEMP", "TMP"];

const READ_CHUNK: usize = 8 * 1024;

/// A resolved interpreter ready to be launched.
#[derive(Debug, Clone)]
pub struct Interpreter {
    /// Runtime name used in diagnostics
    pub runtime: &'static str,
    pub program: PathBuf,
    pub env: &'static [(&'static str, &'static str)],
    pub install_hint: &'static str,
}

/// Bounds applied to one run.
#[derive(Debug, Clone)]
pub struct RunLimits {
    pub timeout: Duration,
    pub drain_grace: Duration,
    pub max_output_bytes: usize,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            drain_grace: Duration::from_millis(250),
            max_output_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Launching,
    Running,
    Succeeded,
    Failed,
    LaunchFailed,
    TimedOut,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunState::Launching | RunState::Running)
    }
}

/// One-shot guard over a run's lifecycle.
#[derive(Debug)]
pub struct Supervisor {
    label: String,
    state: RunState,
}

impl Supervisor {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: RunState::Launching,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Move to `next`. Returns false, and changes nothing, once a terminal state
    /// has been committed.
    pub fn transition(&mut self, next: RunState) -> bool {
        if self.state.is_terminal() {
            log::debug!(
                "Run {}: ignoring {:?}, already settled as {:?}",
                self.label,
                next,
                self.state
            );
            return false;
        }
        log::debug!("Run {}: {:?} -> {:?}", self.label, self.state, next);
        self.state = next;
        true
    }
}

#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

/// Append-only buffer fed by one output stream.
#[derive(Debug, Clone)]
struct OutputBuffer {
    inner: Arc<Mutex<Captured>>,
    limit: usize,
}

impl OutputBuffer {
    fn new(limit: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Captured::default())),
            limit,
        }
    }

    fn append(&self, chunk: &[u8]) {
        let mut captured = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let room = self.limit.saturating_sub(captured.bytes.len());
        if chunk.len() > room {
            captured.truncated = true;
        }
        let take = chunk.len().min(room);
        captured.bytes.extend_from_slice(&chunk[..take]);
    }

    /// Read `reader` to EOF in the background. Bytes past the limit are read and
    /// dropped so the child never stalls on a full pipe.
    fn drain<R>(&self, mut reader: R) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = self.clone();
        tokio::spawn(async move {
            let mut chunk = vec![0u8; READ_CHUNK];
            loop {
                match reader.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => buffer.append(&chunk[..n]),
                    Err(e) => {
                        log::debug!("Output stream closed with error: {}", e);
                        break;
                    }
                }
            }
        })
    }

    fn text(&self) -> String {
        let captured = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut text = String::from_utf8_lossy(&captured.bytes).trim().to_string();
        if captured.truncated {
            log::warn!("Output exceeded {} bytes and was truncated", self.limit);
            text.push_str("\n[output truncated]");
        }
        text
    }
}

/// Message reported when the time budget runs out.
pub fn time_limit_message(timeout: Duration) -> String {
    format!(
        "Time Limit Exceeded ({} seconds)",
        timeout.as_millis() as f64 / 1000.0
    )
}

fn launch_failure(interpreter: &Interpreter, err: &std::io::Error) -> ExecutionResult {
    if err.kind() == std::io::ErrorKind::NotFound {
        log::warn!(
            "Interpreter for {} not found at {}",
            interpreter.runtime,
            interpreter.program.display()
        );
        ExecutionResult::failure(interpreter.install_hint)
    } else {
        log::warn!(
            "Failed to launch {} ({}): {}",
            interpreter.runtime,
            interpreter.program.display(),
            err
        );
        ExecutionResult::failure(format!("Execution Error: {}", err))
    }
}

fn inherited_env() -> Vec<(OsString, OsString)> {
    std::env::vars_os()
        .filter(|(key, _)| {
            key.to_str()
                .map(|k| INHERITED_ENV.contains(&k))
                .unwrap_or(false)
        })
        .collect()
}

fn build_command(program_path: &Path, working_dir: &Path, interpreter: &Interpreter) -> Command {
    let mut command = Command::new(&interpreter.program);
    command
        .arg(program_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .env_clear()
        .envs(inherited_env())
        .envs(interpreter.env.iter().copied())
        .current_dir(working_dir)
        .kill_on_drop(true);
    command
}

/// Wait for the readers until `grace` runs out, then abandon the rest.
async fn join_readers(readers: Vec<JoinHandle<()>>, grace: Duration) {
    let deadline = Instant::now() + grace;
    for mut reader in readers {
        if tokio::time::timeout_at(deadline, &mut reader).await.is_err() {
            log::debug!("Output pipe still open after exit, abandoning reader");
            reader.abort();
        }
    }
}

fn exit_failure(status: ExitStatus, stderr: String) -> ExecutionResult {
    if status.code().is_none() && stderr.is_empty() {
        return ExecutionResult::failure(format!("Process terminated abnormally ({})", status));
    }
    ExecutionResult::failure(stderr)
}

/// Run the wrapped program in `scratch` with `interpreter` and release the file.
pub async fn run(scratch: ScratchFile, interpreter: &Interpreter, limits: &RunLimits) -> ExecutionResult {
    let label = scratch
        .path()
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut supervisor = Supervisor::new(label);

    let result = supervise(scratch.path(), scratch.dir(), interpreter, limits, &mut supervisor).await;
    scratch.release().await;
    result
}

async fn supervise(
    program_path: &Path,
    working_dir: &Path,
    interpreter: &Interpreter,
    limits: &RunLimits,
    supervisor: &mut Supervisor,
) -> ExecutionResult {
    let mut child = match build_command(program_path, working_dir, interpreter).spawn() {
        Ok(child) => child,
        Err(e) => {
            supervisor.transition(RunState::LaunchFailed);
            return launch_failure(interpreter, &e);
        }
    };
    supervisor.transition(RunState::Running);

    let stdout = OutputBuffer::new(limits.max_output_bytes);
    let stderr = OutputBuffer::new(limits.max_output_bytes);
    let mut readers = Vec::with_capacity(2);
    if let Some(pipe) = child.stdout.take() {
        readers.push(stdout.drain(pipe));
    }
    if let Some(pipe) = child.stderr.take() {
        readers.push(stderr.drain(pipe));
    }

    match tokio::time::timeout(limits.timeout, child.wait()).await {
        Ok(Ok(status)) => {
            join_readers(readers, limits.drain_grace).await;
            if status.success() {
                supervisor.transition(RunState::Succeeded);
                ExecutionResult::success(stdout.text())
            } else {
                supervisor.transition(RunState::Failed);
                log::debug!("Interpreter exited with {}", status);
                exit_failure(status, stderr.text())
            }
        }
        Ok(Err(e)) => {
            supervisor.transition(RunState::Failed);
            log::error!("Failed to wait for {} process: {}", interpreter.runtime, e);
            if let Err(kill_err) = child.start_kill() {
                log::debug!("Kill after wait failure returned: {}", kill_err);
            }
            for reader in readers {
                reader.abort();
            }
            ExecutionResult::failure(format!("Execution Error: {}", e))
        }
        Err(_) => {
            supervisor.transition(RunState::TimedOut);
            log::warn!(
                "{} execution exceeded {:?}, killing process",
                interpreter.runtime,
                limits.timeout
            );
            // SIGKILL on unix; the child cannot catch or ignore it.
            if let Err(e) = child.start_kill() {
                log::warn!("Failed to kill timed out process: {}", e);
            }
            for reader in readers {
                reader.abort();
            }
            match tokio::time::timeout(limits.drain_grace, child.wait()).await {
                Ok(Ok(status)) => {
                    let late = if status.success() {
                        RunState::Succeeded
                    } else {
                        RunState::Failed
                    };
                    supervisor.transition(late);
                }
                Ok(Err(e)) => log::debug!("Reaping killed process failed: {}", e),
                Err(_) => log::warn!("Killed process was not reaped within {:?}", limits.drain_grace),
            }
            ExecutionResult::failure(time_limit_message(limits.timeout))
        }
    }
}
