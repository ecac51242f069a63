mod chunk_planner;
mod job_service;
mod result_assembler;
mod retrying_transcriber;
mod running_jobs;
mod transcription_pipeline;
mod transcription_worker;

pub use chunk_planner::{
    ChunkPlanner, DEFAULT_MIN_SEGMENT_SECONDS, DEFAULT_SEGMENT_BUDGET_MB, PlanError,
};
pub use job_service::{
    DEFAULT_ANALYSIS_MODEL, DEFAULT_LANGUAGE, JobDefaults, JobOptions, JobService,
    JobServiceError, NewTranscription, StagedSubmission,
};
pub use result_assembler::{AssemblyError, assemble_transcript};
pub use retrying_transcriber::{DEFAULT_MAX_ATTEMPTS, RetryPolicy, RetryingTranscriber};
pub use running_jobs::RunningJobs;
pub use transcription_pipeline::{
    PipelineConfig, PipelineError, PipelineOutput, ProgressCallback, SegmentProgress,
    TranscriptionPipeline,
};
pub use transcription_worker::{
    SHUTDOWN_REASON, TranscriptionMessage, TranscriptionWorker, TranscriptionWorkerError,
};
