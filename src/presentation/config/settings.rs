use std::path::{Path, PathBuf};
use std::time::Duration;

use config::Config;
use serde::Deserialize;

use crate::application::services::{
    DEFAULT_ANALYSIS_MODEL, DEFAULT_LANGUAGE, DEFAULT_MAX_ATTEMPTS, DEFAULT_MIN_SEGMENT_SECONDS,
    DEFAULT_SEGMENT_BUDGET_MB, PipelineConfig, RetryPolicy,
};
use crate::infrastructure::audio::{EngineOptions, TranscriptionProvider};

use super::Environment;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub transcription: TranscriptionSettings,
    pub pipeline: PipelineSettings,
    pub analysis: AnalysisSettings,
    pub storage: StorageSettings,
    pub worker: WorkerSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// `.env`, then `appsettings.{environment}` in the working directory, then `APP_*`
    /// variables (`APP_PIPELINE__SEGMENT_BUDGET_MB=20`).
    pub fn load() -> Result<(Self, Environment), SettingsError> {
        dotenvy::dotenv().ok();
        let environment = Environment::from_env().map_err(SettingsError::Environment)?;
        let settings = Self::load_for(environment, Path::new("."))?;
        Ok((settings, environment))
    }

    pub fn load_for(environment: Environment, config_dir: &Path) -> Result<Self, SettingsError> {
        let file = config_dir.join(format!("appsettings.{}", environment.as_str()));
        let configuration = Config::builder()
            .add_source(config::File::with_name(&file.to_string_lossy()).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(configuration.try_deserialize()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_mb: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_upload_mb: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProviderSetting {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    Azure,
}

impl From<TranscriptionProviderSetting> for TranscriptionProvider {
    fn from(value: TranscriptionProviderSetting) -> Self {
        match value {
            TranscriptionProviderSetting::OpenAi => TranscriptionProvider::OpenAi,
            TranscriptionProviderSetting::Azure => TranscriptionProvider::Azure,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    pub provider: TranscriptionProviderSetting,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub azure_deployment: Option<String>,
    pub azure_api_version: Option<String>,
}

impl TranscriptionSettings {
    /// Configured key, or `OPENAI_API_KEY` when none is set.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            api_key: self.resolved_api_key(),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            azure_deployment: self.azure_deployment.clone(),
            azure_api_version: self.azure_api_version.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub segment_budget_mb: f64,
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub default_language: String,
    pub max_concurrent_segments: usize,
    pub min_segment_seconds: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            segment_budget_mb: DEFAULT_SEGMENT_BUDGET_MB,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_base_delay_ms: 1000,
            default_language: DEFAULT_LANGUAGE.to_string(),
            max_concurrent_segments: 1,
            min_segment_seconds: DEFAULT_MIN_SEGMENT_SECONDS,
        }
    }
}

impl PipelineSettings {
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            segment_budget_mb: self.segment_budget_mb,
            min_segment_seconds: self.min_segment_seconds,
            max_concurrent_segments: self.max_concurrent_segments,
            retry: RetryPolicy::new(
                self.max_attempts,
                Duration::from_millis(self.retry_base_delay_ms),
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub enabled: bool,
    pub model: String,
    pub title_model: Option<String>,
    pub base_url: Option<String>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: DEFAULT_ANALYSIS_MODEL.to_string(),
            title_model: None,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub upload_dir: PathBuf,
    pub workspace_root: Option<PathBuf>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            workspace_root: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    pub queue_capacity: usize,
    pub max_concurrent_jobs: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 32,
            max_concurrent_jobs: 2,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub json_format: bool,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub directives: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("{0}")]
    Environment(String),
    #[error("configuration: {0}")]
    Config(#[from] config::ConfigError),
}
