use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::ErrorKind;

#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    async fn transcribe(&self, audio_path: &Path, language: &str)
    -> Result<String, TranscriptionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("missing credential: {0}")]
    MissingCredential(String),
    #[error("authentication rejected: {0}")]
    Authentication(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("cannot read audio {}: {source}", path.display())]
    AudioUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to transcribe after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<TranscriptionError>,
    },
}

impl TranscriptionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranscriptionError::MissingCredential(_) | TranscriptionError::AudioUnreadable { .. } => {
                ErrorKind::Configuration
            }
            TranscriptionError::Authentication(_) => ErrorKind::Authentication,
            TranscriptionError::RateLimited(_)
            | TranscriptionError::ApiRequestFailed(_)
            | TranscriptionError::Network(_)
            | TranscriptionError::RetriesExhausted { .. } => ErrorKind::TransientService,
        }
    }
}
