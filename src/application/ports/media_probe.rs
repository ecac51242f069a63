use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::ErrorKind;

/// Inspection and demuxing of source media.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe_duration(&self, path: &Path) -> Result<f64, MediaToolError>;

    async fn extract_audio(&self, video_path: &Path, out_path: &Path)
    -> Result<(), MediaToolError>;

    async fn file_size_mb(&self, path: &Path) -> Result<f64, MediaToolError>;
}

/// Physical cutting of an audio file into ordered segment files.
#[async_trait]
pub trait AudioSegmenter: Send + Sync {
    /// Returned paths are in playback order; position in the list is the segment index.
    async fn segment_audio(
        &self,
        audio_path: &Path,
        segment_seconds: f64,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, MediaToolError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaToolError {
    #[error("{tool} not found; install FFmpeg and make sure it is on PATH")]
    ToolNotFound { tool: String },
    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },
    #[error("{tool} produced unparseable output: {output:?}")]
    MalformedOutput { tool: String, output: String },
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MediaToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MediaToolError::ToolNotFound { .. } => ErrorKind::Configuration,
            MediaToolError::ToolFailed { .. } | MediaToolError::MalformedOutput { .. } => {
                ErrorKind::ToolFailure
            }
            MediaToolError::Io { .. } => ErrorKind::Internal,
        }
    }
}
