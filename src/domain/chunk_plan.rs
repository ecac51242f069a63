/// Derived segmentation decision for one source file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkPlan {
    pub needs_splitting: bool,
    /// Full source duration when no splitting is needed.
    pub segment_duration_seconds: f64,
    pub segment_size_budget_mb: f64,
    /// Real-valued; the physical segmenter rounds up.
    pub segment_count: f64,
}

impl ChunkPlan {
    pub fn single(duration_seconds: f64, budget_mb: f64) -> Self {
        Self {
            needs_splitting: false,
            segment_duration_seconds: duration_seconds,
            segment_size_budget_mb: budget_mb,
            segment_count: 1.0,
        }
    }
}
