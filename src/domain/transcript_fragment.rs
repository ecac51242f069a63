/// Transcribed text for exactly one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptFragment {
    pub segment_index: usize,
    pub text: String,
    pub elapsed_seconds: f64,
}

impl TranscriptFragment {
    pub fn new(segment_index: usize, text: String, elapsed_seconds: f64) -> Self {
        Self {
            segment_index,
            text,
            elapsed_seconds,
        }
    }
}
