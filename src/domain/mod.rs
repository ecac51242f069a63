mod chunk_plan;
mod job;
mod job_id;
mod job_status;
mod media_reference;
mod segment;
mod storage_path;
mod transcript_analysis;
mod transcript_fragment;

pub use chunk_plan::ChunkPlan;
pub use job::{Job, JobTransitionError};
pub use job_id::JobId;
pub use job_status::JobStatus;
pub use media_reference::{MediaKind, MediaReference, UnsupportedMedia};
pub use segment::{InvalidSegment, Segment};
pub use storage_path::StoragePath;
pub use transcript_analysis::{TodoItem, TranscriptAnalysis};
pub use transcript_fragment::TranscriptFragment;
