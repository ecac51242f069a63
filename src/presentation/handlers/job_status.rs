use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::JobId;
use crate::presentation::state::AppState;

use super::error::ApiError;
use super::job_response::JobResponse;

#[derive(Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobResponse>,
}

#[derive(Serialize)]
pub struct DeleteAllResponse {
    pub deleted: usize,
}

fn parse_job_id(raw: &str) -> Result<JobId, ApiError> {
    Uuid::parse_str(raw)
        .map(JobId::from_uuid)
        .map_err(|_| ApiError::bad_request(format!("Invalid job ID: {}", raw)))
}

#[tracing::instrument(skip(state))]
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_job_id(&job_id)?;
    match state.job_service.get(id).await? {
        Some(job) => Ok(Json(JobResponse::detailed(job))),
        None => Err(ApiError::not_found(format!("Job not found: {}", job_id))),
    }
}

#[tracing::instrument(skip(state))]
pub async fn list_jobs_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let jobs = state
        .job_service
        .list()
        .await?
        .into_iter()
        .map(JobResponse::summary)
        .collect();
    Ok(Json(JobListResponse { jobs }))
}

#[tracing::instrument(skip(state))]
pub async fn delete_job_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_job_id(&job_id)?;
    if state.job_service.cancel_and_delete(id).await? {
        tracing::info!(job_id = %id, "Job deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("Job not found: {}", job_id)))
    }
}

#[tracing::instrument(skip(state))]
pub async fn delete_all_jobs_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.job_service.delete_all().await?;
    Ok(Json(DeleteAllResponse { deleted }))
}
