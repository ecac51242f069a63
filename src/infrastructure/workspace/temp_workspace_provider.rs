use std::path::PathBuf;

use crate::application::ports::{WorkingDirectory, WorkspaceError, WorkspaceProvider};

const WORKSPACE_PREFIX: &str = "verbatim-job-";

/// Unique temporary directories, under `root` or the system temp dir.
#[derive(Debug, Clone, Default)]
pub struct TempWorkspaceProvider {
    root: Option<PathBuf>,
}

impl TempWorkspaceProvider {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }
}

impl WorkspaceProvider for TempWorkspaceProvider {
    fn create(&self) -> Result<WorkingDirectory, WorkspaceError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let result = match &self.root {
            Some(root) => std::fs::create_dir_all(root).and_then(|_| builder.tempdir_in(root)),
            None => builder.tempdir(),
        };

        result
            .map(WorkingDirectory::new)
            .map_err(|source| WorkspaceError::Create {
                root: self.root.clone().unwrap_or_else(std::env::temp_dir),
                source,
            })
    }
}
