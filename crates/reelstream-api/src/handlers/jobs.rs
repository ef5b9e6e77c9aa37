use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use reelstream_core::{AppError, JobSnapshot};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/jobs/{id}",
    tag = "jobs",
    params(
        ("id" = String, Path, description = "Job ID returned by the upload")
    ),
    responses(
        (status = 200, description = "Current job status", body = JobSnapshot),
        (status = 400, description = "Malformed job ID", body = ErrorResponse),
        (status = 404, description = "Unknown or expired job", body = ErrorResponse)
    )
)]
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobSnapshot>, HttpAppError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| AppError::InvalidInput(format!("Invalid job ID '{}'", id)))?;

    state
        .transcode_pool
        .job(id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", id)).into())
}
