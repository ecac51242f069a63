use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};

use super::audio_upload::{audio_part, status_error};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_WHISPER_MODEL: &str = "whisper-1";

pub struct OpenAiWhisperEngine {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiWhisperEngine {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_WHISPER_MODEL.to_string()),
        }
    }
}

#[async_trait]
impl TranscriptionEngine for OpenAiWhisperEngine {
    async fn transcribe(
        &self,
        audio_path: &Path,
        language: &str,
    ) -> Result<String, TranscriptionError> {
        if self.api_key.trim().is_empty() {
            return Err(TranscriptionError::MissingCredential(
                "OpenAI API key is not set".to_string(),
            ));
        }

        let url = format!("{}/audio/transcriptions", self.base_url);
        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("language", language.to_string())
            .text("response_format", "text")
            .part("file", audio_part(audio_path).await?);

        tracing::debug!(
            model = %self.model,
            language,
            file = %audio_path.display(),
            "Sending audio to OpenAI Whisper API"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::Network(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(status_error(status, body));
        }

        let transcript = response
            .text()
            .await
            .map_err(|e| TranscriptionError::Network(format!("body: {}", e)))?;

        tracing::debug!(
            chars = transcript.len(),
            "OpenAI Whisper transcription completed"
        );

        Ok(transcript)
    }
}
