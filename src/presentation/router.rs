use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    delete_all_jobs_handler, delete_job_handler, health_handler, job_status_handler,
    list_jobs_handler, transcribe_handler,
};
use crate::presentation::state::AppState;

const BYTES_PER_MB: usize = 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let upload_limit = state
        .settings
        .server
        .max_upload_mb
        .saturating_mul(BYTES_PER_MB);

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/v1/transcriptions",
            post(transcribe_handler).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/v1/jobs",
            get(list_jobs_handler).delete(delete_all_jobs_handler),
        )
        .route(
            "/api/v1/jobs/{job_id}",
            get(job_status_handler).delete(delete_job_handler),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
