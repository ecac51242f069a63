use std::io;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;

use crate::application::services::{JobOptions, StagedSubmission};
use crate::presentation::state::AppState;

use super::error::ApiError;

#[derive(Serialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: String,
}

/// Multipart fields: `file` (required), `language`, `model`, `custom_prompt`.
/// The file streams straight into staging; the other fields may come before or after it.
#[tracing::instrument(skip(state, multipart))]
pub async fn transcribe_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut staged = None;
    let options = match read_form(&state, &mut multipart, &mut staged).await {
        Ok(options) => options,
        Err(e) => {
            if let Some(staged) = staged {
                state.job_service.discard(staged).await;
            }
            return Err(e);
        }
    };

    let Some(staged) = staged else {
        tracing::warn!("Transcription request with no file");
        return Err(ApiError::bad_request("No file uploaded"));
    };

    let job = state.job_service.enqueue(staged, options).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            job_id: job.id.to_string(),
            status: job.status.as_str().to_string(),
        }),
    ))
}

async fn read_form(
    state: &AppState,
    multipart: &mut Multipart,
    staged: &mut Option<StagedSubmission>,
) -> Result<JobOptions, ApiError> {
    let mut options = JobOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                if staged.is_some() {
                    return Err(ApiError::bad_request("Only one file may be uploaded"));
                }
                let filename = field.file_name().unwrap_or("upload").to_string();
                let upload = field.map_err(io::Error::other).boxed();
                let submission = state.job_service.stage(&filename, upload, None).await?;
                tracing::debug!(
                    job_id = %submission.job_id(),
                    filename = %filename,
                    bytes = submission.bytes(),
                    "File data staged"
                );
                *staged = Some(submission);
            }
            "language" | "model" | "custom_prompt" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid field {}: {}", name, e)))?;
                match name.as_str() {
                    "language" => options.language = Some(value),
                    "model" => options.model_hint = Some(value),
                    _ => options.custom_prompt = Some(value),
                }
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    Ok(options)
}
