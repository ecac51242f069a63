#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use verbatim::application::ports::{
    AnalyzerError, AudioSegmenter, MediaProbe, MediaToolError, TranscriptAnalyzer,
    TranscriptionEngine, TranscriptionError,
};
use verbatim::application::services::{PipelineConfig, RetryPolicy, TranscriptionPipeline};
use verbatim::domain::{TodoItem, TranscriptAnalysis};
use verbatim::infrastructure::workspace::TempWorkspaceProvider;

pub const CHUNK_MARKER: &str = "_chunk_";

/// Probe with scripted size and duration. A `None` duration behaves like ffprobe
/// choking on a corrupt file.
pub struct FakeMediaProbe {
    pub source_size_mb: f64,
    pub segment_size_mb: f64,
    pub duration: Option<f64>,
    pub probe_calls: AtomicUsize,
    pub extract_calls: AtomicUsize,
}

impl FakeMediaProbe {
    pub fn new(source_size_mb: f64, duration: Option<f64>) -> Self {
        Self {
            source_size_mb,
            segment_size_mb: 20.0,
            duration,
            probe_calls: AtomicUsize::new(0),
            extract_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MediaProbe for FakeMediaProbe {
    async fn probe_duration(&self, _path: &Path) -> Result<f64, MediaToolError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.duration.ok_or_else(|| MediaToolError::ToolFailed {
            tool: "ffprobe".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "Invalid data found when processing input".to_string(),
        })
    }

    async fn extract_audio(&self, _video: &Path, out_path: &Path) -> Result<(), MediaToolError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        std::fs::write(out_path, b"extracted audio").map_err(|source| MediaToolError::Io {
            path: out_path.to_path_buf(),
            source,
        })
    }

    async fn file_size_mb(&self, path: &Path) -> Result<f64, MediaToolError> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name.contains(CHUNK_MARKER) {
            Ok(self.segment_size_mb)
        } else {
            Ok(self.source_size_mb)
        }
    }
}

/// Writes `segment_count` placeholder files the way the ffmpeg segment muxer names them.
pub struct FakeSegmenter {
    pub segment_count: usize,
    pub requested_seconds: Mutex<Vec<f64>>,
    pub produced_dirs: Mutex<Vec<PathBuf>>,
}

impl FakeSegmenter {
    pub fn new(segment_count: usize) -> Self {
        Self {
            segment_count,
            requested_seconds: Mutex::new(Vec::new()),
            produced_dirs: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requested_seconds.lock().unwrap().len()
    }
}

#[async_trait]
impl AudioSegmenter for FakeSegmenter {
    async fn segment_audio(
        &self,
        audio_path: &Path,
        segment_seconds: f64,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, MediaToolError> {
        self.requested_seconds.lock().unwrap().push(segment_seconds);
        self.produced_dirs.lock().unwrap().push(out_dir.to_path_buf());

        let stem = audio_path.file_stem().unwrap().to_str().unwrap();
        let mut paths = Vec::new();
        for i in 0..self.segment_count {
            let path = out_dir.join(format!("{stem}{CHUNK_MARKER}{i:03}.mp3"));
            std::fs::write(&path, b"segment").unwrap();
            paths.push(path);
        }
        Ok(paths)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Failure {
    Transient,
    Authentication,
}

/// Answers `text<N>` for `<stem>_chunk_NNN.*` and `whole <stem>` otherwise.
pub struct FakeEngine {
    pub calls: AtomicUsize,
    failures_remaining: AtomicUsize,
    failure: Failure,
    reverse_completion: bool,
    languages: Mutex<Vec<String>>,
}

impl FakeEngine {
    pub fn ok() -> Self {
        Self::failing(0, Failure::Transient)
    }

    pub fn failing(times: usize, failure: Failure) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failures_remaining: AtomicUsize::new(times),
            failure,
            reverse_completion: false,
            languages: Mutex::new(Vec::new()),
        }
    }

    pub fn always_failing(failure: Failure) -> Self {
        Self::failing(usize::MAX, failure)
    }

    /// Later segments finish first.
    pub fn finishing_in_reverse(mut self) -> Self {
        self.reverse_completion = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn languages(&self) -> Vec<String> {
        self.languages.lock().unwrap().clone()
    }
}

pub fn segment_number(path: &Path) -> Option<usize> {
    let stem = path.file_stem()?.to_str()?;
    let (_, n) = stem.rsplit_once(CHUNK_MARKER)?;
    n.parse().ok()
}

#[async_trait]
impl TranscriptionEngine for FakeEngine {
    async fn transcribe(
        &self,
        audio_path: &Path,
        language: &str,
    ) -> Result<String, TranscriptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.languages.lock().unwrap().push(language.to_string());

        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(match self.failure {
                Failure::Transient => TranscriptionError::ApiRequestFailed(
                    "status 503 Service Unavailable: overloaded".to_string(),
                ),
                Failure::Authentication => TranscriptionError::Authentication(
                    "status 401 Unauthorized: invalid api key".to_string(),
                ),
            });
        }

        match segment_number(audio_path) {
            Some(n) => {
                if self.reverse_completion {
                    tokio::time::sleep(Duration::from_millis(((5 - n.min(5)) * 20) as u64)).await;
                }
                Ok(format!("text{n}"))
            }
            None => {
                let stem = audio_path.file_stem().unwrap().to_str().unwrap();
                Ok(format!("whole {stem}"))
            }
        }
    }
}

/// Signals once a transcription is in flight, then never returns.
#[derive(Default)]
pub struct HangingEngine {
    pub started: Notify,
}

#[async_trait]
impl TranscriptionEngine for HangingEngine {
    async fn transcribe(
        &self,
        _audio_path: &Path,
        _language: &str,
    ) -> Result<String, TranscriptionError> {
        self.started.notify_one();
        futures::future::pending::<()>().await;
        unreachable!()
    }
}

pub struct PanickingEngine;

#[async_trait]
impl TranscriptionEngine for PanickingEngine {
    async fn transcribe(
        &self,
        audio_path: &Path,
        _language: &str,
    ) -> Result<String, TranscriptionError> {
        panic!("engine crashed on {}", audio_path.display());
    }
}

pub struct FakeAnalyzer {
    pub fail: bool,
    pub seen_prompts: Mutex<Vec<Option<String>>>,
}

impl FakeAnalyzer {
    pub fn new(fail: bool) -> Self {
        Self {
            fail,
            seen_prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TranscriptAnalyzer for FakeAnalyzer {
    async fn analyze(
        &self,
        _transcript: &str,
        _model: &str,
        custom_prompt: Option<&str>,
    ) -> Result<TranscriptAnalysis, AnalyzerError> {
        self.seen_prompts
            .lock()
            .unwrap()
            .push(custom_prompt.map(String::from));
        if self.fail {
            return Err(AnalyzerError::ApiRequestFailed("HTTP 500".to_string()));
        }
        Ok(TranscriptAnalysis {
            title: "Weekly Sync".to_string(),
            report: "Discussed the release.".to_string(),
            todo_items: vec![TodoItem::open("Ship it")],
        })
    }
}

pub fn fast_config(max_concurrent_segments: usize) -> PipelineConfig {
    PipelineConfig {
        max_concurrent_segments,
        retry: RetryPolicy::new(3, Duration::from_millis(1)),
        ..PipelineConfig::default()
    }
}

pub fn build_pipeline(
    probe: Arc<FakeMediaProbe>,
    segmenter: Arc<FakeSegmenter>,
    engine: Arc<dyn TranscriptionEngine>,
    workspace_root: &Path,
    config: PipelineConfig,
) -> TranscriptionPipeline {
    TranscriptionPipeline::new(
        probe,
        segmenter,
        engine,
        Arc::new(TempWorkspaceProvider::new(Some(workspace_root.to_path_buf()))),
        config,
    )
    .unwrap()
}

pub fn write_source(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![0u8; 2048]).unwrap();
    path
}

pub fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

pub async fn eventually<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within 2s");
}
