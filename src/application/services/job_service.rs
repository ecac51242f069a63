use std::io;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::BoxStream;
use tokio::sync::mpsc;

use crate::application::ports::{JobRepository, RepositoryError, StagingStore, StagingStoreError};
use crate::domain::{Job, JobId, MediaKind, StoragePath, UnsupportedMedia};

use super::running_jobs::RunningJobs;
use super::transcription_worker::TranscriptionMessage;

pub const DEFAULT_LANGUAGE: &str = "it";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, Default)]
pub struct NewTranscription {
    pub filename: String,
    pub language: Option<String>,
    pub model_hint: Option<String>,
    pub custom_prompt: Option<String>,
}

impl NewTranscription {
    fn options(&self) -> JobOptions {
        JobOptions {
            language: self.language.clone(),
            model_hint: self.model_hint.clone(),
            custom_prompt: self.custom_prompt.clone(),
        }
    }
}

/// Per-job overrides; blank values fall back to [`JobDefaults`].
#[derive(Debug, Clone, Default)]
pub struct JobOptions {
    pub language: Option<String>,
    pub model_hint: Option<String>,
    pub custom_prompt: Option<String>,
}

/// An upload written to the staging store under a reserved job id. It becomes a
/// job through [`JobService::enqueue`] or is thrown away with [`JobService::discard`].
#[derive(Debug)]
pub struct StagedSubmission {
    job_id: JobId,
    filename: String,
    storage_path: StoragePath,
    bytes: u64,
}

impl StagedSubmission {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

#[derive(Debug, Clone)]
pub struct JobDefaults {
    pub language: String,
    pub model_hint: String,
}

impl Default for JobDefaults {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            model_hint: DEFAULT_ANALYSIS_MODEL.to_string(),
        }
    }
}

/// Submission and administration of transcription jobs.
pub struct JobService {
    job_repository: Arc<dyn JobRepository>,
    staging_store: Arc<dyn StagingStore>,
    sender: mpsc::Sender<TranscriptionMessage>,
    running: RunningJobs,
    defaults: JobDefaults,
}

impl JobService {
    pub fn new(
        job_repository: Arc<dyn JobRepository>,
        staging_store: Arc<dyn StagingStore>,
        sender: mpsc::Sender<TranscriptionMessage>,
        running: RunningJobs,
        defaults: JobDefaults,
    ) -> Self {
        Self {
            job_repository,
            staging_store,
            sender,
            running,
            defaults,
        }
    }

    /// Stages the upload, records a `Queued` job and hands it to the worker.
    pub async fn submit(
        &self,
        request: NewTranscription,
        upload: BoxStream<'_, Result<Bytes, io::Error>>,
        content_length: Option<u64>,
    ) -> Result<Job, JobServiceError> {
        let staged = self
            .stage(&request.filename, upload, content_length)
            .await?;
        self.enqueue(staged, request.options()).await
    }

    /// Streams an upload into the staging store. Unsupported and empty files are
    /// rejected and leave nothing behind.
    pub async fn stage(
        &self,
        filename: &str,
        upload: BoxStream<'_, Result<Bytes, io::Error>>,
        content_length: Option<u64>,
    ) -> Result<StagedSubmission, JobServiceError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        if MediaKind::from_extension(extension).is_none() {
            return Err(JobServiceError::UnsupportedMedia(UnsupportedMedia(
                filename.to_string(),
            )));
        }

        let job_id = JobId::new();
        let storage_path = StoragePath::new(&job_id, filename);
        let bytes = self
            .staging_store
            .store(&storage_path, upload, content_length)
            .await?;
        if bytes == 0 {
            self.discard_upload(&storage_path).await;
            return Err(JobServiceError::EmptyUpload);
        }

        Ok(StagedSubmission {
            job_id,
            filename: filename.to_string(),
            storage_path,
            bytes,
        })
    }

    /// Records the staged upload as a `Queued` job and hands it to the worker.
    pub async fn enqueue(
        &self,
        staged: StagedSubmission,
        options: JobOptions,
    ) -> Result<Job, JobServiceError> {
        let StagedSubmission {
            job_id,
            filename,
            storage_path,
            bytes,
        } = staged;

        let job = Job::with_id(
            job_id,
            filename,
            non_blank(options.language).unwrap_or_else(|| self.defaults.language.clone()),
            non_blank(options.model_hint).unwrap_or_else(|| self.defaults.model_hint.clone()),
            non_blank(options.custom_prompt),
        );

        if let Err(e) = self.job_repository.create(&job).await {
            self.discard_upload(&storage_path).await;
            return Err(e.into());
        }

        let msg = TranscriptionMessage {
            job: job.clone(),
            storage_path: storage_path.clone(),
        };
        if self.sender.send(msg).await.is_err() {
            tracing::error!(job_id = %job.id, "Transcription worker unavailable");
            let mut failed = job;
            if failed.fail("transcription worker unavailable").is_ok() {
                if let Err(e) = self.job_repository.update(&failed).await {
                    tracing::warn!(error = %e, "Failed to record job failure");
                }
            }
            self.discard_upload(&storage_path).await;
            return Err(JobServiceError::QueueUnavailable);
        }

        tracing::info!(
            job_id = %job.id,
            filename = %job.source_filename,
            bytes,
            "Transcription job enqueued"
        );
        Ok(job)
    }

    /// Drops a staged upload that will not become a job.
    pub async fn discard(&self, staged: StagedSubmission) {
        tracing::debug!(job_id = %staged.job_id, "Discarding staged upload");
        self.discard_upload(&staged.storage_path).await;
    }

    pub async fn get(&self, job_id: JobId) -> Result<Option<Job>, JobServiceError> {
        Ok(self.job_repository.get_by_id(job_id).await?)
    }

    pub async fn list(&self) -> Result<Vec<Job>, JobServiceError> {
        Ok(self.job_repository.list().await?)
    }

    /// Aborts the job if it is running (which tears down its working files) and
    /// removes the record. Returns `false` when no such job exists.
    pub async fn cancel_and_delete(&self, job_id: JobId) -> Result<bool, JobServiceError> {
        if self.running.abort(job_id) {
            tracing::info!(job_id = %job_id, "Running job aborted");
        }
        Ok(self.job_repository.delete(job_id).await?)
    }

    pub async fn delete_all(&self) -> Result<usize, JobServiceError> {
        let aborted = self.running.abort_all();
        let deleted = self.job_repository.delete_all().await?;
        tracing::info!(aborted, deleted, "All jobs deleted");
        Ok(deleted)
    }

    async fn discard_upload(&self, path: &StoragePath) {
        if let Err(e) = self.staging_store.delete(path).await {
            tracing::warn!(error = %e, path = %path, "Failed to discard staged upload");
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum JobServiceError {
    #[error("{0}")]
    UnsupportedMedia(UnsupportedMedia),
    #[error("uploaded file is empty")]
    EmptyUpload,
    #[error("staging: {0}")]
    Staging(#[from] StagingStoreError),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("transcription queue unavailable")]
    QueueUnavailable,
}
