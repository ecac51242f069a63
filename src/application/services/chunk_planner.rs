use crate::application::ports::ErrorKind;
use crate::domain::ChunkPlan;

pub const DEFAULT_SEGMENT_BUDGET_MB: f64 = 24.0;
pub const DEFAULT_MIN_SEGMENT_SECONDS: f64 = 10.0;

/// Derives a segmentation plan from the probed size and duration of an audio file.
///
/// Segment length assumes a constant bitrate, so the budget is an average target
/// rather than a hard per-segment ceiling. Segment length is never planned below
/// `min_segment_seconds`, which keeps a pathological size/budget ratio from
/// producing sub-second segments.
#[derive(Debug, Clone, Copy)]
pub struct ChunkPlanner {
    budget_mb: f64,
    min_segment_seconds: f64,
}

impl ChunkPlanner {
    pub fn new(budget_mb: f64, min_segment_seconds: f64) -> Result<Self, PlanError> {
        if !budget_mb.is_finite() || budget_mb <= 0.0 {
            return Err(PlanError::InvalidBudget(budget_mb));
        }
        if !min_segment_seconds.is_finite() || min_segment_seconds < 0.0 {
            return Err(PlanError::InvalidMinimumSegment(min_segment_seconds));
        }
        Ok(Self {
            budget_mb,
            min_segment_seconds,
        })
    }

    pub fn plan(&self, file_size_mb: f64, duration_seconds: f64) -> Result<ChunkPlan, PlanError> {
        if !file_size_mb.is_finite() || file_size_mb <= 0.0 {
            return Err(PlanError::InvalidFileSize(file_size_mb));
        }
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return Err(PlanError::InvalidDuration(duration_seconds));
        }

        if file_size_mb <= self.budget_mb {
            return Ok(ChunkPlan::single(duration_seconds, self.budget_mb));
        }

        let raw_count = file_size_mb / self.budget_mb;
        let raw_duration = duration_seconds / raw_count;
        let segment_duration = raw_duration.max(self.min_segment_seconds);

        if segment_duration > raw_duration {
            tracing::debug!(
                planned_secs = raw_duration,
                floor_secs = self.min_segment_seconds,
                "Segment duration raised to minimum"
            );
        }

        Ok(ChunkPlan {
            needs_splitting: true,
            segment_duration_seconds: segment_duration,
            segment_size_budget_mb: self.budget_mb,
            segment_count: duration_seconds / segment_duration,
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    #[error("segment budget must be a positive number of MB, got {0}")]
    InvalidBudget(f64),
    #[error("minimum segment duration must be non-negative, got {0}")]
    InvalidMinimumSegment(f64),
    #[error("file size must be a positive number of MB, got {0}")]
    InvalidFileSize(f64),
    #[error("media duration must be positive, got {0} seconds")]
    InvalidDuration(f64),
}

impl PlanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlanError::InvalidDuration(_) => ErrorKind::ToolFailure,
            PlanError::InvalidBudget(_)
            | PlanError::InvalidMinimumSegment(_)
            | PlanError::InvalidFileSize(_) => ErrorKind::Configuration,
        }
    }
}
