use std::time::Duration;

use verbatim::infrastructure::audio::TranscriptionProvider;
use verbatim::presentation::Environment;
use verbatim::presentation::config::TranscriptionProviderSetting;
use verbatim::presentation::Settings;

#[test]
fn given_no_settings_file_when_loading_then_defaults_apply() {
    let dir = tempfile::TempDir::new().unwrap();

    let settings = Settings::load_for(Environment::Test, dir.path()).unwrap();

    assert_eq!(settings.server.port, 3000);
    assert_eq!(settings.pipeline.segment_budget_mb, 24.0);
    assert_eq!(settings.pipeline.max_attempts, 3);
    assert_eq!(settings.pipeline.default_language, "it");
    assert_eq!(settings.transcription.provider, TranscriptionProviderSetting::OpenAi);
    assert!(settings.analysis.enabled);
}

#[test]
fn given_environment_file_when_loading_then_values_override_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("appsettings.Test.json"),
        r#"{
            "server": { "port": 8080 },
            "transcription": { "provider": "azure", "base_url": "https://speech.example", "azure_deployment": "whisper" },
            "pipeline": { "segment_budget_mb": 10.0, "max_attempts": 5, "retry_base_delay_ms": 250, "max_concurrent_segments": 4 },
            "analysis": { "enabled": false }
        }"#,
    )
    .unwrap();

    let settings = Settings::load_for(Environment::Test, dir.path()).unwrap();

    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(
        TranscriptionProvider::from(settings.transcription.provider),
        TranscriptionProvider::Azure
    );
    assert!(!settings.analysis.enabled);

    let config = settings.pipeline.to_pipeline_config();
    assert_eq!(config.segment_budget_mb, 10.0);
    assert_eq!(config.max_concurrent_segments, 4);
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.retry.base_delay, Duration::from_millis(250));
}

#[test]
fn given_other_environment_file_when_loading_then_it_is_ignored() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("appsettings.Prod.json"),
        r#"{ "server": { "port": 9999 } }"#,
    )
    .unwrap();

    let settings = Settings::load_for(Environment::Test, dir.path()).unwrap();

    assert_eq!(settings.server.port, 3000);
}
