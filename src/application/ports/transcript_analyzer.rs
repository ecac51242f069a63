use async_trait::async_trait;

use crate::domain::TranscriptAnalysis;

/// Downstream enrichment of a finished transcript (report, to-do list, title).
#[async_trait]
pub trait TranscriptAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        transcript: &str,
        model: &str,
        custom_prompt: Option<&str>,
    ) -> Result<TranscriptAnalysis, AnalyzerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("missing credential: {0}")]
    MissingCredential(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
