use std::path::{Path, PathBuf};
use std::pin::pin;
use std::sync::Arc;
use std::time::Instant;

use futures::{StreamExt, TryStreamExt, stream};

use crate::application::ports::{
    AudioSegmenter, ErrorKind, MediaProbe, MediaToolError, TranscriptionEngine,
    TranscriptionError, WorkspaceError, WorkspaceProvider,
};
use crate::domain::{
    ChunkPlan, InvalidSegment, MediaKind, MediaReference, Segment, TranscriptFragment,
};

use super::chunk_planner::{
    ChunkPlanner, DEFAULT_MIN_SEGMENT_SECONDS, DEFAULT_SEGMENT_BUDGET_MB, PlanError,
};
use super::result_assembler::{AssemblyError, assemble_transcript};
use super::retrying_transcriber::{RetryPolicy, RetryingTranscriber};

const EXTRACTED_AUDIO_FILENAME: &str = "extracted_audio.mp3";

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub segment_budget_mb: f64,
    pub min_segment_seconds: f64,
    /// 1 transcribes segments sequentially.
    pub max_concurrent_segments: usize,
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segment_budget_mb: DEFAULT_SEGMENT_BUDGET_MB,
            min_segment_seconds: DEFAULT_MIN_SEGMENT_SECONDS,
            max_concurrent_segments: 1,
            retry: RetryPolicy::default(),
        }
    }
}

/// Reported once per transcribed segment, in completion order.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentProgress {
    pub segment_index: usize,
    pub completed: usize,
    pub total: usize,
    pub elapsed_seconds: f64,
}

impl SegmentProgress {
    pub fn percent(&self) -> f64 {
        (self.completed as f64 / self.total as f64) * 100.0
    }
}

pub type ProgressCallback = Arc<dyn Fn(&SegmentProgress) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub text: String,
    pub segment_count: usize,
    pub elapsed_seconds: f64,
}

/// probe -> extract -> plan -> segment -> transcribe each -> assemble.
///
/// Every run gets its own working directory, released on every exit path.
pub struct TranscriptionPipeline {
    probe: Arc<dyn MediaProbe>,
    segmenter: Arc<dyn AudioSegmenter>,
    transcriber: RetryingTranscriber,
    workspaces: Arc<dyn WorkspaceProvider>,
    planner: ChunkPlanner,
    max_concurrent_segments: usize,
    progress: Option<ProgressCallback>,
}

impl TranscriptionPipeline {
    pub fn new(
        probe: Arc<dyn MediaProbe>,
        segmenter: Arc<dyn AudioSegmenter>,
        engine: Arc<dyn TranscriptionEngine>,
        workspaces: Arc<dyn WorkspaceProvider>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let planner = ChunkPlanner::new(config.segment_budget_mb, config.min_segment_seconds)
            .map_err(PipelineError::Planning)?;

        Ok(Self {
            probe,
            segmenter,
            transcriber: RetryingTranscriber::new(engine, config.retry),
            workspaces,
            planner,
            max_concurrent_segments: config.max_concurrent_segments.max(1),
            progress: None,
        })
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Entry point shared by the CLI and the background worker.
    pub async fn run_transcription_pipeline(
        &self,
        source_path: &Path,
        language: &str,
    ) -> Result<PipelineOutput, PipelineError> {
        let source = validate_source(source_path).await?;
        self.run(&source, language).await
    }

    pub async fn run(
        &self,
        source: &MediaReference,
        language: &str,
    ) -> Result<PipelineOutput, PipelineError> {
        let started = Instant::now();
        let workspace = self.workspaces.create().map_err(PipelineError::Workspace)?;
        tracing::debug!(
            workspace = %workspace.path().display(),
            source = %source.path().display(),
            source_bytes = source.size_bytes(),
            "Working directory created"
        );

        let result = self.run_in(workspace.path(), source, language).await;
        workspace.release();

        let (text, segment_count) = result?;
        let elapsed_seconds = started.elapsed().as_secs_f64();
        tracing::info!(
            segments = segment_count,
            chars = text.len(),
            elapsed_secs = elapsed_seconds,
            "Transcription pipeline completed"
        );

        Ok(PipelineOutput {
            text,
            segment_count,
            elapsed_seconds,
        })
    }

    async fn run_in(
        &self,
        workdir: &Path,
        source: &MediaReference,
        language: &str,
    ) -> Result<(String, usize), PipelineError> {
        let audio_path = match source.kind() {
            MediaKind::Video => {
                let out = workdir.join(EXTRACTED_AUDIO_FILENAME);
                tracing::debug!("Extracting audio track");
                self.probe
                    .extract_audio(source.path(), &out)
                    .await
                    .map_err(PipelineError::Extraction)?;
                out
            }
            MediaKind::Audio => source.path().to_path_buf(),
        };

        let size_mb = self
            .probe
            .file_size_mb(&audio_path)
            .await
            .map_err(PipelineError::Probing)?;
        let duration = self
            .probe
            .probe_duration(&audio_path)
            .await
            .map_err(PipelineError::Probing)?;

        let plan = self
            .planner
            .plan(size_mb, duration)
            .map_err(PipelineError::Planning)?;
        tracing::info!(
            size_mb,
            duration_secs = duration,
            needs_splitting = plan.needs_splitting,
            segment_secs = plan.segment_duration_seconds,
            "Chunk plan computed"
        );

        let segments = self
            .materialize(&plan, audio_path, size_mb, workdir)
            .await?;
        let expected = segments.len();

        let fragments = self.transcribe_segments(&segments, language).await?;
        let text = assemble_transcript(fragments, expected)?;

        Ok((text, expected))
    }

    async fn materialize(
        &self,
        plan: &ChunkPlan,
        audio_path: PathBuf,
        size_mb: f64,
        workdir: &Path,
    ) -> Result<Vec<Segment>, PipelineError> {
        if !plan.needs_splitting {
            let segment = Segment::whole_file(audio_path, size_mb)
                .map_err(PipelineError::InvalidSegments)?;
            return Ok(vec![segment]);
        }

        let paths = self
            .segmenter
            .segment_audio(&audio_path, plan.segment_duration_seconds, workdir)
            .await
            .map_err(PipelineError::Segmentation)?;

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let segment_mb = self
                .probe
                .file_size_mb(&path)
                .await
                .map_err(PipelineError::Segmentation)?;
            files.push((path, segment_mb));
        }

        let segments = Segment::sequence(files, plan.segment_duration_seconds)
            .map_err(PipelineError::InvalidSegments)?;
        tracing::info!(segments = segments.len(), "Audio segmented");
        Ok(segments)
    }

    async fn transcribe_segments(
        &self,
        segments: &[Segment],
        language: &str,
    ) -> Result<Vec<TranscriptFragment>, PipelineError> {
        let total = segments.len();
        let pending: Vec<_> = segments
            .iter()
            .map(|segment| self.transcribe_segment(segment, language))
            .collect();
        let mut in_flight =
            pin!(stream::iter(pending).buffer_unordered(self.max_concurrent_segments));

        let mut fragments = Vec::with_capacity(total);
        while let Some(fragment) = in_flight.try_next().await? {
            let progress = SegmentProgress {
                segment_index: fragment.segment_index,
                completed: fragments.len() + 1,
                total,
                elapsed_seconds: fragment.elapsed_seconds,
            };
            tracing::info!(
                segment_index = progress.segment_index,
                completed = progress.completed,
                total,
                percent = progress.percent(),
                elapsed_secs = progress.elapsed_seconds,
                "Segment transcribed"
            );
            if let Some(report) = &self.progress {
                report(&progress);
            }
            fragments.push(fragment);
        }

        Ok(fragments)
    }

    async fn transcribe_segment(
        &self,
        segment: &Segment,
        language: &str,
    ) -> Result<TranscriptFragment, PipelineError> {
        tracing::debug!(
            segment_index = segment.index(),
            duration_secs = segment.duration_seconds(),
            size_mb = segment.size_mb(),
            "Transcribing segment"
        );
        let started = Instant::now();
        let text = self
            .transcriber
            .transcribe_with_retry(segment.path(), language)
            .await
            .map_err(|source| PipelineError::Transcription {
                segment_index: segment.index(),
                source,
            })?;

        Ok(TranscriptFragment::new(
            segment.index(),
            text,
            started.elapsed().as_secs_f64(),
        ))
    }
}

async fn validate_source(path: &Path) -> Result<MediaReference, PipelineError> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        PipelineError::InvalidInput(format!("cannot access {}: {}", path.display(), e))
    })?;

    if !metadata.is_file() {
        return Err(PipelineError::InvalidInput(format!(
            "{} is not a regular file",
            path.display()
        )));
    }
    if metadata.len() == 0 {
        return Err(PipelineError::InvalidInput(format!(
            "{} is empty",
            path.display()
        )));
    }

    tokio::fs::File::open(path).await.map_err(|e| {
        PipelineError::InvalidInput(format!("{} is not readable: {}", path.display(), e))
    })?;

    MediaReference::new(path.to_path_buf(), metadata.len())
        .map_err(|e| PipelineError::InvalidInput(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("working directory: {0}")]
    Workspace(WorkspaceError),
    #[error("audio extraction: {0}")]
    Extraction(MediaToolError),
    #[error("probing: {0}")]
    Probing(MediaToolError),
    #[error("planning: {0}")]
    Planning(PlanError),
    #[error("segmentation: {0}")]
    Segmentation(MediaToolError),
    #[error("segmentation: {0}")]
    InvalidSegments(InvalidSegment),
    #[error("transcribing segment {segment_index}: {source}")]
    Transcription {
        segment_index: usize,
        #[source]
        source: TranscriptionError,
    },
    #[error("assembly: {0}")]
    Assembly(#[from] AssemblyError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidInput(_) => ErrorKind::Configuration,
            PipelineError::Workspace(e) => e.kind(),
            PipelineError::Extraction(e)
            | PipelineError::Probing(e)
            | PipelineError::Segmentation(e) => e.kind(),
            PipelineError::Planning(e) => e.kind(),
            PipelineError::InvalidSegments(_) => ErrorKind::ToolFailure,
            PipelineError::Transcription { source, .. } => source.kind(),
            PipelineError::Assembly(e) => e.kind(),
        }
    }
}
