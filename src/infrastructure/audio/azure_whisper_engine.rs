use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};

use super::audio_upload::{audio_part, status_error};

pub const DEFAULT_AZURE_API_VERSION: &str = "2024-06-01";

pub struct AzureWhisperEngine {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl AzureWhisperEngine {
    pub fn new(base_url: &str, deployment: &str, api_key: &str, api_version: &str) -> Self {
        let endpoint = format!(
            "{}/openai/deployments/{}/audio/transcriptions?api-version={}",
            base_url.trim_end_matches('/'),
            deployment,
            api_version,
        );
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct AzureTranscriptionResponse {
    text: String,
}

#[async_trait]
impl TranscriptionEngine for AzureWhisperEngine {
    async fn transcribe(
        &self,
        audio_path: &Path,
        language: &str,
    ) -> Result<String, TranscriptionError> {
        if self.api_key.trim().is_empty() {
            return Err(TranscriptionError::MissingCredential(
                "Azure OpenAI API key is not set".to_string(),
            ));
        }

        let form = multipart::Form::new()
            .text("language", language.to_string())
            .part("file", audio_part(audio_path).await?);

        tracing::debug!(endpoint = %self.endpoint, language, "Sending audio to Azure OpenAI Whisper");

        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
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

        let result: AzureTranscriptionResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("parse response: {}", e)))?;

        tracing::debug!(
            chars = result.text.len(),
            "Azure OpenAI Whisper transcription completed"
        );

        Ok(result.text)
    }
}
