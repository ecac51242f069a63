use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{StagingStore, StagingStoreError};
use crate::domain::StoragePath;

/// Uploads staged as plain files under one directory.
pub struct LocalStagingStore {
    base_path: PathBuf,
}

impl LocalStagingStore {
    pub fn new(base_path: PathBuf) -> Result<Self, StagingStoreError> {
        std::fs::create_dir_all(&base_path).map_err(StagingStoreError::Io)?;
        Ok(Self { base_path })
    }

    async fn write_stream(
        &self,
        target: &Path,
        mut stream: BoxStream<'_, Result<Bytes, io::Error>>,
    ) -> Result<u64, StagingStoreError> {
        let mut file = tokio::fs::File::create(target)
            .await
            .map_err(|e| StagingStoreError::UploadFailed(format!("create: {}", e)))?;

        let mut total_bytes: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(StagingStoreError::SourceStream)?;
            total_bytes += bytes.len() as u64;
            file.write_all(&bytes)
                .await
                .map_err(|e| StagingStoreError::UploadFailed(format!("write: {}", e)))?;
        }

        file.flush()
            .await
            .map_err(|e| StagingStoreError::UploadFailed(format!("flush: {}", e)))?;
        Ok(total_bytes)
    }
}

#[async_trait::async_trait]
impl StagingStore for LocalStagingStore {
    async fn store(
        &self,
        path: &StoragePath,
        stream: BoxStream<'_, Result<Bytes, io::Error>>,
        content_length: Option<u64>,
    ) -> Result<u64, StagingStoreError> {
        let target = self.local_path(path);

        match self.write_stream(&target, stream).await {
            Ok(total_bytes) => {
                if let Some(expected) = content_length.filter(|&len| len != total_bytes) {
                    tracing::warn!(
                        path = %path,
                        expected,
                        received = total_bytes,
                        "Upload size differs from declared length"
                    );
                }
                tracing::debug!(path = %path, bytes = total_bytes, "Upload staged");
                Ok(total_bytes)
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&target).await {
                    if cleanup.kind() != io::ErrorKind::NotFound {
                        tracing::warn!(error = %cleanup, path = %path, "Failed to remove partial upload");
                    }
                }
                Err(e)
            }
        }
    }

    async fn delete(&self, path: &StoragePath) -> Result<(), StagingStoreError> {
        match tokio::fs::remove_file(self.local_path(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StagingStoreError::DeleteFailed(e.to_string())),
        }
    }

    fn local_path(&self, path: &StoragePath) -> PathBuf {
        self.base_path.join(path.as_str())
    }
}
