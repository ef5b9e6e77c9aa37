use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use reelstream_core::models::AssetResponse;
use reelstream_core::AppError;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/asset/{name}",
    tag = "assets",
    params(
        ("name" = String, Path, description = "Asset name")
    ),
    responses(
        (status = 200, description = "Asset metadata", body = AssetResponse),
        (status = 404, description = "Asset not found", body = ErrorResponse)
    )
)]
pub async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<AssetResponse>, HttpAppError> {
    let asset = state
        .catalog
        .get(&name)
        .await?
        .filter(|asset| asset.is_ready())
        .ok_or_else(|| AppError::NotFound(format!("Asset '{}' not found", name)))?;

    Ok(Json(AssetResponse::from(&asset)))
}
