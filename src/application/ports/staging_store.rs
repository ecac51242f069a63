use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use futures::stream::BoxStream;

use crate::domain::StoragePath;

/// Job-local storage for uploaded source files awaiting processing.
#[async_trait::async_trait]
pub trait StagingStore: Send + Sync {
    async fn store(
        &self,
        path: &StoragePath,
        stream: BoxStream<'_, Result<Bytes, io::Error>>,
        content_length: Option<u64>,
    ) -> Result<u64, StagingStoreError>;

    async fn delete(&self, path: &StoragePath) -> Result<(), StagingStoreError>;

    /// Filesystem location the media tools can read from.
    fn local_path(&self, path: &StoragePath) -> PathBuf;
}

#[derive(Debug, thiserror::Error)]
pub enum StagingStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("upload stream interrupted: {0}")]
    SourceStream(#[source] io::Error),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
