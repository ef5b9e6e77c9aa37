use crate::error::{ErrorResponse, HttpAppError};
use crate::services::upload::receive_upload;
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reelstream_core::{AppError, AssetStatus, JobStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadAcceptedResponse {
    pub job_id: Uuid,
    pub asset_id: Uuid,
    pub name: String,
    pub status: JobStatus,
    pub asset_status: AssetStatus,
}

#[utoipa::path(
    post,
    path = "/asset/upload",
    tag = "assets",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 202, description = "Upload accepted and queued for transcoding", body = UploadAcceptedResponse),
        (status = 400, description = "Invalid upload", body = ErrorResponse),
        (status = 409, description = "Asset name already exists or is being processed", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 503, description = "Transcode queue is full", body = ErrorResponse)
    )
)]
pub async fn upload_asset(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, HttpAppError> {
    let upload = receive_upload(multipart, &state.upload.limits, &state.upload.scratch_root).await?;

    let claim = state.transcode_pool.try_claim(&upload.name).ok_or_else(|| {
        AppError::Conflict(format!("Asset '{}' is already being processed", upload.name))
    })?;
    if state.catalog.contains(&upload.name).await? {
        return Err(AppError::Conflict(format!("Asset '{}' already exists", upload.name)).into());
    }

    let original_filename = upload.original_filename.clone();
    let size_bytes = upload.size_bytes;
    let job = upload.into_job(state.upload.thumbnail_offset);
    let snapshot = state.transcode_pool.submit(job, claim)?;

    tracing::info!(
        job_id = %snapshot.job_id,
        asset_id = %snapshot.asset_id,
        asset_name = %snapshot.asset_name,
        filename = %original_filename,
        size_bytes,
        "Upload accepted for transcoding"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadAcceptedResponse {
            job_id: snapshot.job_id,
            asset_id: snapshot.asset_id,
            name: snapshot.asset_name,
            status: snapshot.status,
            asset_status: snapshot.asset_status,
        }),
    )
        .into_response())
}
