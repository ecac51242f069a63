use std::path::Path;

use reqwest::StatusCode;
use reqwest::multipart;

use crate::application::ports::TranscriptionError;

pub(super) async fn audio_part(path: &Path) -> Result<multipart::Part, TranscriptionError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|source| TranscriptionError::AudioUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("audio.mp3")
        .to_string();

    multipart::Part::bytes(data)
        .file_name(file_name)
        .mime_str(mime_for(path))
        .map_err(|e| TranscriptionError::ApiRequestFailed(format!("mime: {}", e)))
}

pub(super) fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "flac" => "audio/flac",
        "webm" => "audio/webm",
        "mp4" => "video/mp4",
        _ => "audio/mpeg",
    }
}

pub(super) fn status_error(status: StatusCode, body: String) -> TranscriptionError {
    let detail = format!("status {}: {}", status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            TranscriptionError::Authentication(detail)
        }
        StatusCode::TOO_MANY_REQUESTS => TranscriptionError::RateLimited(detail),
        _ => TranscriptionError::ApiRequestFailed(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_mime_from_extension() {
        assert_eq!(mime_for(Path::new("a_chunk_000.mp3")), "audio/mpeg");
        assert_eq!(mime_for(Path::new("voice.WAV")), "audio/wav");
        assert_eq!(mime_for(Path::new("memo.m4a")), "audio/mp4");
        assert_eq!(mime_for(Path::new("noext")), "audio/mpeg");
    }

    #[test]
    fn maps_credential_rejections_to_authentication() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, String::new()),
            TranscriptionError::Authentication(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, String::new()),
            TranscriptionError::Authentication(_)
        ));
    }

    #[test]
    fn maps_throttling_and_server_errors_to_transient() {
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, String::new()),
            TranscriptionError::RateLimited(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "upstream".into()),
            TranscriptionError::ApiRequestFailed(_)
        ));
    }
}
