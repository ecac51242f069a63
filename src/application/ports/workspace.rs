use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::ErrorKind;

/// Hands out working directories, each exclusive to one pipeline run.
pub trait WorkspaceProvider: Send + Sync {
    fn create(&self) -> Result<WorkingDirectory, WorkspaceError>;
}

/// Ephemeral directory owned by a single pipeline run.
///
/// The directory is removed exactly once: either by [`WorkingDirectory::release`] or,
/// if the owning future is dropped mid-stage (cancellation, panic), by `Drop`.
/// Removal failures are logged and never propagated.
#[derive(Debug)]
pub struct WorkingDirectory {
    path: PathBuf,
    inner: Option<TempDir>,
}

impl WorkingDirectory {
    pub fn new(dir: TempDir) -> Self {
        Self {
            path: dir.path().to_path_buf(),
            inner: Some(dir),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(mut self) {
        self.remove("released");
    }

    fn remove(&mut self, reason: &'static str) {
        let Some(dir) = self.inner.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), reason, "Working directory removed");
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %self.path.display(),
                    reason,
                    "Failed to remove working directory"
                );
            }
        }
    }
}

impl Drop for WorkingDirectory {
    fn drop(&mut self) {
        self.remove("dropped");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("cannot create working directory under {}: {source}", root.display())]
    Create {
        root: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WorkspaceError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}
