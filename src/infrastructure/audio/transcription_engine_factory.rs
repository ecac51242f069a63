use std::str::FromStr;
use std::sync::Arc;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};

use super::azure_whisper_engine::{AzureWhisperEngine, DEFAULT_AZURE_API_VERSION};
use super::openai_whisper_engine::OpenAiWhisperEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptionProvider {
    OpenAi,
    Azure,
}

impl FromStr for TranscriptionProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "azure" => Ok(Self::Azure),
            other => Err(format!("unknown transcription provider: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub azure_deployment: Option<String>,
    pub azure_api_version: Option<String>,
}

pub struct TranscriptionEngineFactory;

impl TranscriptionEngineFactory {
    pub fn create(
        provider: TranscriptionProvider,
        options: EngineOptions,
    ) -> Result<Arc<dyn TranscriptionEngine>, TranscriptionError> {
        let api_key = options
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                TranscriptionError::MissingCredential(
                    "an API key is required for remote transcription".to_string(),
                )
            })?;

        match provider {
            TranscriptionProvider::OpenAi => {
                let engine = OpenAiWhisperEngine::new(api_key, options.base_url, options.model);
                Ok(Arc::new(engine))
            }
            TranscriptionProvider::Azure => {
                let base_url = options.base_url.ok_or_else(|| {
                    TranscriptionError::MissingCredential(
                        "Azure transcription requires base_url".to_string(),
                    )
                })?;
                let deployment = options
                    .azure_deployment
                    .or(options.model)
                    .ok_or_else(|| {
                        TranscriptionError::MissingCredential(
                            "Azure transcription requires a deployment name".to_string(),
                        )
                    })?;
                let api_version = options
                    .azure_api_version
                    .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string());
                let engine = AzureWhisperEngine::new(&base_url, &deployment, &api_key, &api_version);
                Ok(Arc::new(engine))
            }
        }
    }
}
