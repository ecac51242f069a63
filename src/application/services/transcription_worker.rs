use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::{self, JoinError, JoinSet};
use tracing::Instrument;

use crate::application::ports::{
    JobRepository, RepositoryError, StagingStore, TranscriptAnalyzer,
};
use crate::domain::{Job, JobId, JobTransitionError, StoragePath, TranscriptAnalysis};

use super::running_jobs::RunningJobs;
use super::transcription_pipeline::TranscriptionPipeline;

pub const SHUTDOWN_REASON: &str = "cancelled by shutdown";
const CANCEL_REASON: &str = "cancelled";

pub struct TranscriptionMessage {
    pub job: Job,
    pub storage_path: StoragePath,
}

struct InFlight {
    job_id: JobId,
    storage_path: StoragePath,
}

/// Consumes queued jobs and drives each through the pipeline in its own task.
///
/// Jobs run concurrently up to `max_concurrent_jobs`. Each job's terminal state is
/// published through the [`JobRepository`]. Its staged upload is removed whether it
/// completes, fails, panics or is aborted.
pub struct TranscriptionWorker {
    receiver: mpsc::Receiver<TranscriptionMessage>,
    processor: Arc<JobProcessor>,
    running: RunningJobs,
    max_concurrent_jobs: usize,
}

impl TranscriptionWorker {
    pub fn new(
        receiver: mpsc::Receiver<TranscriptionMessage>,
        pipeline: Arc<TranscriptionPipeline>,
        analyzer: Option<Arc<dyn TranscriptAnalyzer>>,
        job_repository: Arc<dyn JobRepository>,
        staging_store: Arc<dyn StagingStore>,
        running: RunningJobs,
        max_concurrent_jobs: usize,
    ) -> Self {
        Self {
            receiver,
            processor: Arc::new(JobProcessor {
                pipeline,
                analyzer,
                job_repository,
                staging_store,
            }),
            running,
            max_concurrent_jobs: max_concurrent_jobs.max(1),
        }
    }

    /// Runs until `shutdown` resolves or every sender is gone.
    ///
    /// A closed queue lets in-flight jobs finish. Shutdown aborts them instead and
    /// fails every job still waiting in the queue; it returns once their working
    /// files are gone.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        tracing::info!(
            max_concurrent_jobs = self.max_concurrent_jobs,
            "Transcription worker started"
        );

        let mut shutdown = std::pin::pin!(shutdown);
        let slots = Arc::new(Semaphore::new(self.max_concurrent_jobs));
        let mut tasks: JoinSet<()> = JoinSet::new();
        let mut in_flight: HashMap<task::Id, InFlight> = HashMap::new();
        let mut stopping = false;

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    stopping = true;
                    break;
                }
                Some(result) = tasks.join_next_with_id(), if !tasks.is_empty() => {
                    self.reap(&mut in_flight, result, CANCEL_REASON).await;
                }
                msg = self.receiver.recv() => {
                    let Some(msg) = msg else {
                        break;
                    };
                    let permit = tokio::select! {
                        biased;
                        _ = &mut shutdown => None,
                        permit = Arc::clone(&slots).acquire_owned() => permit.ok(),
                    };
                    let Some(permit) = permit else {
                        stopping = true;
                        self.processor.abandon(msg, SHUTDOWN_REASON).await;
                        break;
                    };

                    let job_id = msg.job.id;
                    let storage_path = msg.storage_path.clone();
                    let span = tracing::info_span!(
                        "transcription_job",
                        job_id = %job_id,
                        filename = %msg.job.source_filename,
                        language = %msg.job.language,
                    );
                    let processor = Arc::clone(&self.processor);

                    let handle = tasks.spawn(
                        async move {
                            let _permit = permit;
                            if let Err(e) = processor.process_job(msg).await {
                                tracing::error!(error = %e, "Transcription job failed");
                            }
                        }
                        .instrument(span),
                    );
                    in_flight.insert(handle.id(), InFlight { job_id, storage_path });
                    self.running.register(job_id, handle);
                }
            }
        }

        let reason = if stopping {
            self.receiver.close();
            let mut abandoned = 0;
            while let Ok(msg) = self.receiver.try_recv() {
                self.processor.abandon(msg, SHUTDOWN_REASON).await;
                abandoned += 1;
            }
            tracing::warn!(
                in_flight = tasks.len(),
                abandoned,
                "Shutdown requested, aborting transcription jobs"
            );
            tasks.abort_all();
            SHUTDOWN_REASON
        } else {
            tracing::info!(
                in_flight = tasks.len(),
                "Transcription queue closed, waiting for running jobs"
            );
            CANCEL_REASON
        };

        while let Some(result) = tasks.join_next_with_id().await {
            self.reap(&mut in_flight, result, reason).await;
        }
        tracing::info!("Transcription worker stopped");
    }

    async fn reap(
        &self,
        in_flight: &mut HashMap<task::Id, InFlight>,
        result: Result<(task::Id, ()), JoinError>,
        cancel_reason: &str,
    ) {
        let task_id = match &result {
            Ok((id, _)) => *id,
            Err(e) => e.id(),
        };
        let Some(InFlight {
            job_id,
            storage_path,
        }) = in_flight.remove(&task_id)
        else {
            return;
        };
        self.running.remove(job_id);

        match result {
            Ok(_) => {}
            Err(e) if e.is_cancelled() => {
                tracing::info!(job_id = %job_id, "Transcription job cancelled");
                self.processor
                    .settle(job_id, &storage_path, cancel_reason)
                    .await;
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Transcription task panicked");
                self.processor
                    .settle(job_id, &storage_path, &format!("internal error: {e}"))
                    .await;
            }
        }
    }
}

struct JobProcessor {
    pipeline: Arc<TranscriptionPipeline>,
    analyzer: Option<Arc<dyn TranscriptAnalyzer>>,
    job_repository: Arc<dyn JobRepository>,
    staging_store: Arc<dyn StagingStore>,
}

impl JobProcessor {
    async fn process_job(&self, msg: TranscriptionMessage) -> Result<(), TranscriptionWorkerError> {
        let TranscriptionMessage {
            mut job,
            storage_path,
        } = msg;
        let staged = StagedUpload::new(Arc::clone(&self.staging_store), storage_path);

        if self.job_repository.get_by_id(job.id).await?.is_none() {
            tracing::info!("Job was deleted before processing started, skipping");
            staged.release().await;
            return Ok(());
        }

        job.start_processing()?;
        self.persist(&job).await?;

        let source_path = self.staging_store.local_path(staged.path());
        let result = self
            .pipeline
            .run_transcription_pipeline(&source_path, &job.language)
            .await;
        staged.release().await;

        match result {
            Ok(output) => {
                let analysis = self.analyze(&job, &output.text).await;
                job.complete(output.text, analysis)?;
                self.persist(&job).await?;
                tracing::info!(
                    segments = output.segment_count,
                    elapsed_secs = output.elapsed_seconds,
                    "Transcription job completed"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, kind = %e.kind(), "Transcription pipeline failed");
                job.fail(e.to_string())?;
                self.persist(&job).await?;
            }
        }

        Ok(())
    }

    /// Analysis enriches a sound transcript; its failure never fails the job.
    async fn analyze(&self, job: &Job, transcript: &str) -> Option<TranscriptAnalysis> {
        let analyzer = self.analyzer.as_ref()?;
        match analyzer
            .analyze(transcript, &job.model_hint, job.custom_prompt.as_deref())
            .await
        {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                tracing::warn!(error = %e, "Transcript analysis failed, completing without it");
                None
            }
        }
    }

    /// Fails a job that never reached the pipeline and discards its upload.
    async fn abandon(&self, msg: TranscriptionMessage, reason: &str) {
        tracing::info!(job_id = %msg.job.id, reason, "Queued transcription job abandoned");
        self.settle(msg.job.id, &msg.storage_path, reason).await;
    }

    /// Terminal bookkeeping for a job whose task did not finish on its own: the
    /// upload is removed and a still-live record is marked failed.
    async fn settle(&self, job_id: JobId, storage_path: &StoragePath, reason: &str) {
        if let Err(e) = self.staging_store.delete(storage_path).await {
            tracing::warn!(error = %e, path = %storage_path, "Failed to delete staged upload");
        }

        let mut job = match self.job_repository.get_by_id(job_id).await {
            Ok(Some(job)) if !job.status.is_terminal() => job,
            Ok(_) => return,
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "Failed to load job for settling");
                return;
            }
        };
        if job.fail(reason).is_ok() {
            if let Err(e) = self.job_repository.update(&job).await {
                tracing::warn!(job_id = %job_id, error = %e, "Failed to record job failure");
            }
        }
    }

    async fn persist(&self, job: &Job) -> Result<(), TranscriptionWorkerError> {
        tracing::debug!(status = %job.status, "Job status transition");
        self.job_repository
            .update(job)
            .await
            .map_err(TranscriptionWorkerError::Repository)
    }
}

/// Staged upload owned by one job run; deleted on release or, failing that, on drop.
/// Deletion is idempotent, so the worker may also remove it after an abort.
struct StagedUpload {
    store: Arc<dyn StagingStore>,
    path: StoragePath,
    released: bool,
}

impl StagedUpload {
    fn new(store: Arc<dyn StagingStore>, path: StoragePath) -> Self {
        Self {
            store,
            path,
            released: false,
        }
    }

    fn path(&self) -> &StoragePath {
        &self.path
    }

    async fn release(mut self) {
        self.released = true;
        if let Err(e) = self.store.delete(&self.path).await {
            tracing::warn!(error = %e, path = %self.path, "Failed to delete staged upload");
        }
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let store = Arc::clone(&self.store);
        let path = self.path.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = store.delete(&path).await {
                        tracing::warn!(error = %e, path = %path, "Failed to delete staged upload");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(path = %self.path, "No runtime available, staged upload left behind");
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionWorkerError {
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("lifecycle: {0}")]
    Transition(#[from] JobTransitionError),
}
