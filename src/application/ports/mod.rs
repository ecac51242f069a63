mod error_kind;
mod job_repository;
mod media_probe;
mod repository_error;
mod staging_store;
mod transcript_analyzer;
mod transcription_engine;
mod workspace;

pub use error_kind::ErrorKind;
pub use job_repository::JobRepository;
pub use media_probe::{AudioSegmenter, MediaProbe, MediaToolError};
pub use repository_error::RepositoryError;
pub use staging_store::{StagingStore, StagingStoreError};
pub use transcript_analyzer::{AnalyzerError, TranscriptAnalyzer};
pub use transcription_engine::{TranscriptionEngine, TranscriptionError};
pub use workspace::{WorkingDirectory, WorkspaceError, WorkspaceProvider};
