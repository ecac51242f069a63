use std::path::{Path, PathBuf};

/// One size-bounded slice of the source audio.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    index: usize,
    path: PathBuf,
    duration_seconds: f64,
    size_mb: f64,
}

impl Segment {
    pub fn new(
        index: usize,
        path: PathBuf,
        duration_seconds: f64,
        size_mb: f64,
    ) -> Result<Self, InvalidSegment> {
        if !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(InvalidSegment::Duration(duration_seconds));
        }
        if !size_mb.is_finite() || size_mb < 0.0 {
            return Err(InvalidSegment::Size(size_mb));
        }
        Ok(Self {
            index,
            path,
            duration_seconds,
            size_mb,
        })
    }

    /// The whole file as segment 0; a zero duration means "use the full file".
    pub fn whole_file(path: PathBuf, size_mb: f64) -> Result<Self, InvalidSegment> {
        Self::new(0, path, 0.0, size_mb)
    }

    /// Assigns dense indices `0..N` by position in the already ordered input.
    pub fn sequence(
        files: Vec<(PathBuf, f64)>,
        duration_seconds: f64,
    ) -> Result<Vec<Self>, InvalidSegment> {
        if files.is_empty() {
            return Err(InvalidSegment::Empty);
        }
        files
            .into_iter()
            .enumerate()
            .map(|(index, (path, size_mb))| Self::new(index, path, duration_seconds, size_mb))
            .collect()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn size_mb(&self) -> f64 {
        self.size_mb
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidSegment {
    #[error("segment duration must be a non-negative number, got {0}")]
    Duration(f64),
    #[error("segment size must be a non-negative number, got {0}")]
    Size(f64),
    #[error("no segments were produced")]
    Empty,
}
