use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "mp4" | "m4v" | "mpeg" | "mpg" | "mov" | "mkv" | "avi" | "webm" => Some(Self::Video),
            "mp3" | "mpga" | "wav" | "m4a" | "aac" | "ogg" | "oga" | "opus" | "flac" => {
                Some(Self::Audio)
            }
            _ => None,
        }
    }
}

/// Source media handed to the pipeline. Immutable once a job starts.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaReference {
    path: PathBuf,
    kind: MediaKind,
    size_bytes: u64,
}

impl MediaReference {
    pub fn new(path: PathBuf, size_bytes: u64) -> Result<Self, UnsupportedMedia> {
        let kind = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(MediaKind::from_extension)
            .ok_or_else(|| UnsupportedMedia(path.display().to_string()))?;

        Ok(Self {
            path,
            kind,
            size_bytes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported media file (expected a known audio or video extension): {0}")]
pub struct UnsupportedMedia(pub String);
