use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command;

use crate::application::ports::{AudioSegmenter, MediaProbe, MediaToolError};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const SEGMENT_MARKER: &str = "_chunk_";

/// `ffprobe`/`ffmpeg` backed probing and audio extraction.
pub struct FfmpegMediaProbe {
    ffmpeg_bin: String,
    ffprobe_bin: String,
}

impl FfmpegMediaProbe {
    pub fn new(ffmpeg_bin: impl Into<String>, ffprobe_bin: impl Into<String>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
        }
    }
}

impl Default for FfmpegMediaProbe {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

#[async_trait]
impl MediaProbe for FfmpegMediaProbe {
    async fn probe_duration(&self, path: &Path) -> Result<f64, MediaToolError> {
        let output = run_tool(
            &self.ffprobe_bin,
            [
                OsStr::new("-v"),
                OsStr::new("error"),
                OsStr::new("-show_entries"),
                OsStr::new("format=duration"),
                OsStr::new("-of"),
                OsStr::new("default=noprint_wrappers=1:nokey=1"),
                path.as_os_str(),
            ],
        )
        .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let duration = parse_duration(&stdout).ok_or_else(|| MediaToolError::MalformedOutput {
            tool: self.ffprobe_bin.clone(),
            output: stdout.trim().to_string(),
        })?;

        tracing::debug!(path = %path.display(), duration_secs = duration, "Probed duration");
        Ok(duration)
    }

    async fn extract_audio(&self, video_path: &Path, out_path: &Path) -> Result<(), MediaToolError> {
        run_tool(
            &self.ffmpeg_bin,
            [
                OsStr::new("-i"),
                video_path.as_os_str(),
                OsStr::new("-vn"),
                OsStr::new("-acodec"),
                OsStr::new("libmp3lame"),
                OsStr::new("-q:a"),
                OsStr::new("2"),
                OsStr::new("-y"),
                out_path.as_os_str(),
            ],
        )
        .await?;

        tracing::debug!(
            source = %video_path.display(),
            audio = %out_path.display(),
            "Audio track extracted"
        );
        Ok(())
    }

    async fn file_size_mb(&self, path: &Path) -> Result<f64, MediaToolError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|source| MediaToolError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(metadata.len() as f64 / BYTES_PER_MB)
    }
}

/// Stream-copy segmentation with the `ffmpeg` segment muxer.
pub struct FfmpegSegmenter {
    ffmpeg_bin: String,
}

impl FfmpegSegmenter {
    pub fn new(ffmpeg_bin: impl Into<String>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
        }
    }
}

impl Default for FfmpegSegmenter {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl AudioSegmenter for FfmpegSegmenter {
    async fn segment_audio(
        &self,
        audio_path: &Path,
        segment_seconds: f64,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, MediaToolError> {
        let stem = audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        let extension = audio_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp3");
        let pattern = out_dir.join(format!("{stem}{SEGMENT_MARKER}%03d.{extension}"));
        let segment_time = format!("{segment_seconds:.3}");

        run_tool(
            &self.ffmpeg_bin,
            [
                OsStr::new("-i"),
                audio_path.as_os_str(),
                OsStr::new("-f"),
                OsStr::new("segment"),
                OsStr::new("-segment_time"),
                OsStr::new(&segment_time),
                OsStr::new("-c"),
                OsStr::new("copy"),
                OsStr::new("-y"),
                pattern.as_os_str(),
            ],
        )
        .await?;

        discover_segments(out_dir, stem, extension).await
    }
}

/// Lists `<stem>_chunk_NNN.<ext>` files in playback order.
///
/// Sorted by name length first so numbering past the zero-padded width still
/// orders correctly.
pub async fn discover_segments(
    dir: &Path,
    stem: &str,
    extension: &str,
) -> Result<Vec<PathBuf>, MediaToolError> {
    let io_err = |source: io::Error| MediaToolError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let prefix = format!("{stem}{SEGMENT_MARKER}");
    let suffix = format!(".{extension}");
    let mut names = Vec::new();

    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.starts_with(&prefix) && name.ends_with(&suffix) {
            names.push(name.to_string());
        }
    }

    names.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    Ok(names.into_iter().map(|name| dir.join(name)).collect())
}

pub fn parse_duration(output: &str) -> Option<f64> {
    let value: f64 = output.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

async fn run_tool<I, S>(tool: &str, args: I) -> Result<Output, MediaToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => MediaToolError::ToolNotFound {
                tool: tool.to_string(),
            },
            _ => MediaToolError::ToolFailed {
                tool: tool.to_string(),
                status: "spawn error".to_string(),
                stderr: e.to_string(),
            },
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::warn!(tool, status = %output.status, "Media tool failed");
        return Err(MediaToolError::ToolFailed {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr,
        });
    }

    Ok(output)
}
