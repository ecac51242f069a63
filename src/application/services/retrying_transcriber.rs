use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Wait after the zero-based `attempt` fails: `base * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Duration::from_secs(1))
    }
}

/// Drives a [`TranscriptionEngine`] with exponential backoff.
///
/// Only errors whose kind is retryable are retried. Authentication and
/// configuration failures surface on first occurrence.
pub struct RetryingTranscriber {
    engine: Arc<dyn TranscriptionEngine>,
    policy: RetryPolicy,
}

impl RetryingTranscriber {
    pub fn new(engine: Arc<dyn TranscriptionEngine>, policy: RetryPolicy) -> Self {
        Self { engine, policy }
    }

    pub async fn transcribe_with_retry(
        &self,
        audio_path: &Path,
        language: &str,
    ) -> Result<String, TranscriptionError> {
        self.transcribe_with_attempts(audio_path, language, self.policy.max_attempts)
            .await
    }

    pub async fn transcribe_with_attempts(
        &self,
        audio_path: &Path,
        language: &str,
        max_attempts: u32,
    ) -> Result<String, TranscriptionError> {
        let attempts = max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match self.engine.transcribe(audio_path, language).await {
                Ok(text) => return Ok(text),
                Err(e) if !e.kind().is_retryable() => {
                    tracing::error!(
                        error = %e,
                        kind = %e.kind(),
                        path = %audio_path.display(),
                        "Transcription failed with non-retryable error"
                    );
                    return Err(e);
                }
                Err(e) if attempt + 1 >= attempts => {
                    tracing::error!(
                        error = %e,
                        attempts,
                        path = %audio_path.display(),
                        "Transcription retries exhausted"
                    );
                    return Err(TranscriptionError::RetriesExhausted {
                        attempts,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    let wait = self.policy.delay_for(attempt);
                    tracing::warn!(
                        error = %e,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        wait_ms = wait.as_millis() as u64,
                        "Transcription request failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}
