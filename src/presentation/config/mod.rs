mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    AnalysisSettings, LoggingSettings, PipelineSettings, ServerSettings, Settings,
    SettingsError, StorageSettings, TranscriptionProviderSetting, TranscriptionSettings,
    WorkerSettings,
};
