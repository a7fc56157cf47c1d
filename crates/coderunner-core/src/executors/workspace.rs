//! Scratch files for wrapped programs.
//!
//! Every execution gets a private directory under the shared scratch root, holding
//! only its own program file. The interpreter runs with that directory as its
//! working directory, so a submission cannot list or read another execution's
//! program. Names come from `tempfile`, which creates with `O_EXCL` and removes
//! both the file and the directory when they are dropped. Removal is
//! best-effort: a failed delete is logged and otherwise ignored.

use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile, TempDir};
use tokio::fs;

use super::language::LanguageProfile;
use crate::errors::ExecutorError;

/// Shared directory that per-execution directories are allocated in.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create a private directory and an empty, uniquely named file in it for `profile`.
    ///
    /// The root is created if it does not exist yet.
    pub async fn allocate(&self, profile: &LanguageProfile) -> Result<ScratchFile, ExecutorError> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            ExecutorError::internal(format!(
                "Failed to create scratch directory {}: {}",
                self.root.display(),
                e
            ))
        })?;

        let dir = Builder::new()
            .prefix(&format!("run_{}_", profile.tag))
            .tempdir_in(&self.root)
            .map_err(|e| {
                ExecutorError::internal(format!(
                    "Failed to create execution directory in {}: {}",
                    self.root.display(),
                    e
                ))
            })?;

        let file = Builder::new()
            .prefix(&format!("code_{}_{}_", profile.tag, chrono::Utc::now().timestamp_millis()))
            .suffix(&format!(".{}", profile.extension))
            .tempfile_in(dir.path())
            .map_err(|e| {
                ExecutorError::internal(format!(
                    "Failed to create scratch file in {}: {}",
                    dir.path().display(),
                    e
                ))
            })?;

        log::debug!("Allocated scratch file {}", file.path().display());
        Ok(ScratchFile { file, dir })
    }
}

/// A scratch file owned by one in-flight execution, inside its private directory.
///
/// Call [`ScratchFile::release`] once the interpreter has terminated. If the owner
/// is dropped without releasing (for instance because the surrounding future was
/// cancelled), `tempfile` removes the file and then the directory.
#[derive(Debug)]
pub struct ScratchFile {
    // Field order matters: the file is dropped before its directory.
    file: NamedTempFile,
    dir: TempDir,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// The private directory the interpreter runs in.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub async fn write(&self, contents: &str) -> Result<(), ExecutorError> {
        fs::write(self.path(), contents).await.map_err(|e| {
            ExecutorError::internal(format!(
                "Failed to write scratch file {}: {}",
                self.path().display(),
                e
            ))
        })
    }

    /// Delete the file and its directory. Errors are logged, never returned.
    pub async fn release(self) {
        let ScratchFile { file, dir } = self;
        let path = file.path().to_path_buf();
        match file.close() {
            Ok(()) => log::debug!("Released scratch file {}", path.display()),
            Err(e) => log::warn!("Failed to remove scratch file {}: {}", path.display(), e),
        }
        let dir_path = dir.path().to_path_buf();
        if let Err(e) = dir.close() {
            log::warn!("Failed to remove execution directory {}: {}", dir_path.display(), e);
        }
    }
}
