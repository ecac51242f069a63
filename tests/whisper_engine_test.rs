use std::path::PathBuf;

use axum::Router;
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use verbatim::application::ports::{ErrorKind, TranscriptionEngine, TranscriptionError};
use verbatim::infrastructure::audio::{AzureWhisperEngine, OpenAiWhisperEngine};

async fn serve(app: Router) -> (String, oneshot::Sender<()>) {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .ok();
    });

    (format!("http://{}", addr), shutdown_tx)
}

async fn start_mock_openai_server(
    response_status: u16,
    response_body: &'static str,
) -> (String, oneshot::Sender<()>) {
    let app = Router::new().route(
        "/audio/transcriptions",
        post(move || async move {
            let status = StatusCode::from_u16(response_status).unwrap();
            (status, response_body).into_response()
        }),
    );
    serve(app).await
}

async fn start_echo_server() -> (String, oneshot::Sender<()>) {
    let app = Router::new().route(
        "/audio/transcriptions",
        post(|mut multipart: Multipart| async move {
            let mut parts = Vec::new();
            while let Some(field) = multipart.next_field().await.unwrap() {
                let name = field.name().unwrap_or_default().to_string();
                if name == "file" {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let mime = field.content_type().unwrap_or_default().to_string();
                    parts.push(format!("file={file_name}({mime})"));
                } else {
                    let value = field.text().await.unwrap();
                    parts.push(format!("{name}={value}"));
                }
            }
            parts.join(" ")
        }),
    );
    serve(app).await
}

fn audio_fixture() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("talk_chunk_001.mp3");
    std::fs::write(&path, b"fake audio bytes").unwrap();
    (dir, path)
}

#[tokio::test]
async fn given_audio_file_when_openai_transcribes_then_returns_raw_text() {
    let (base_url, shutdown_tx) = start_mock_openai_server(200, "  Ciao a tutti.\n").await;
    let (_dir, path) = audio_fixture();
    let engine = OpenAiWhisperEngine::new("test-key".to_string(), Some(base_url), None);

    let text = engine.transcribe(&path, "it").await.unwrap();

    assert_eq!(text, "  Ciao a tutti.\n");
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_audio_file_when_openai_transcribes_then_form_carries_model_language_and_file() {
    let (base_url, shutdown_tx) = start_echo_server().await;
    let (_dir, path) = audio_fixture();
    let engine = OpenAiWhisperEngine::new("test-key".to_string(), Some(base_url), None);

    let echoed = engine.transcribe(&path, "it").await.unwrap();

    assert!(echoed.contains("model=whisper-1"), "{echoed}");
    assert!(echoed.contains("language=it"), "{echoed}");
    assert!(echoed.contains("response_format=text"), "{echoed}");
    assert!(echoed.contains("file=talk_chunk_001.mp3(audio/mpeg)"), "{echoed}");
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_rejected_key_when_openai_transcribes_then_authentication_error() {
    let (base_url, shutdown_tx) =
        start_mock_openai_server(401, r#"{"error":{"message":"Incorrect API key"}}"#).await;
    let (_dir, path) = audio_fixture();
    let engine = OpenAiWhisperEngine::new("bad-key".to_string(), Some(base_url), None);

    let err = engine.transcribe(&path, "it").await.unwrap_err();

    assert!(matches!(err, TranscriptionError::Authentication(_)));
    assert_eq!(err.kind(), ErrorKind::Authentication);
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_throttling_when_openai_transcribes_then_rate_limited_is_retryable() {
    let (base_url, shutdown_tx) = start_mock_openai_server(429, "slow down").await;
    let (_dir, path) = audio_fixture();
    let engine = OpenAiWhisperEngine::new("test-key".to_string(), Some(base_url), None);

    let err = engine.transcribe(&path, "it").await.unwrap_err();

    assert!(matches!(err, TranscriptionError::RateLimited(_)));
    assert!(err.kind().is_retryable());
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_server_error_when_openai_transcribes_then_transient_api_error() {
    let (base_url, shutdown_tx) = start_mock_openai_server(503, "overloaded").await;
    let (_dir, path) = audio_fixture();
    let engine = OpenAiWhisperEngine::new("test-key".to_string(), Some(base_url), None);

    let err = engine.transcribe(&path, "it").await.unwrap_err();

    assert!(matches!(err, TranscriptionError::ApiRequestFailed(_)));
    assert_eq!(err.kind(), ErrorKind::TransientService);
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_unreachable_server_when_openai_transcribes_then_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let (_dir, path) = audio_fixture();
    let engine = OpenAiWhisperEngine::new("test-key".to_string(), Some(base_url), None);

    let err = engine.transcribe(&path, "it").await.unwrap_err();

    assert!(matches!(err, TranscriptionError::Network(_)));
    assert!(err.kind().is_retryable());
}

#[tokio::test]
async fn given_empty_api_key_when_transcribing_then_missing_credential_without_request() {
    let (_dir, path) = audio_fixture();
    let engine = OpenAiWhisperEngine::new(
        String::new(),
        Some("http://127.0.0.1:9".to_string()),
        None,
    );

    let err = engine.transcribe(&path, "it").await.unwrap_err();

    assert!(matches!(err, TranscriptionError::MissingCredential(_)));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn given_missing_audio_file_when_transcribing_then_audio_unreadable() {
    let engine = OpenAiWhisperEngine::new(
        "test-key".to_string(),
        Some("http://127.0.0.1:9".to_string()),
        None,
    );

    let err = engine
        .transcribe(std::path::Path::new("/nonexistent/chunk.mp3"), "it")
        .await
        .unwrap_err();

    assert!(matches!(err, TranscriptionError::AudioUnreadable { .. }));
}

async fn start_mock_azure_server(
    response_status: u16,
    response_body: &'static str,
) -> (String, oneshot::Sender<()>) {
    let app = Router::new().route(
        "/openai/deployments/my-deployment/audio/transcriptions",
        post(move || async move {
            let status = StatusCode::from_u16(response_status).unwrap();
            (status, response_body).into_response()
        }),
    );
    serve(app).await
}

#[tokio::test]
async fn given_audio_file_when_azure_transcribes_then_returns_json_text() {
    let (base_url, shutdown_tx) =
        start_mock_azure_server(200, r#"{"text": " Hello from Azure Whisper"}"#).await;
    let (_dir, path) = audio_fixture();
    let engine = AzureWhisperEngine::new(&base_url, "my-deployment", "test-key", "2024-06-01");

    let text = engine.transcribe(&path, "en").await.unwrap();

    assert_eq!(text, " Hello from Azure Whisper");
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_azure_forbidden_when_transcribing_then_authentication_error() {
    let (base_url, shutdown_tx) = start_mock_azure_server(403, "forbidden").await;
    let (_dir, path) = audio_fixture();
    let engine = AzureWhisperEngine::new(&base_url, "my-deployment", "test-key", "2024-06-01");

    let err = engine.transcribe(&path, "en").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authentication);
    shutdown_tx.send(()).ok();
}
