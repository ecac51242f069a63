use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::ports::StagingStoreError;
use crate::application::services::JobServiceError;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<JobServiceError> for ApiError {
    fn from(e: JobServiceError) -> Self {
        let status = match &e {
            JobServiceError::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            JobServiceError::EmptyUpload => StatusCode::BAD_REQUEST,
            JobServiceError::QueueUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            JobServiceError::Staging(StagingStoreError::SourceStream(_)) => {
                tracing::warn!(error = %e, "Upload stream failed");
                StatusCode::BAD_REQUEST
            }
            JobServiceError::Staging(_) | JobServiceError::Repository(_) => {
                tracing::error!(error = %e, "Job service failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
