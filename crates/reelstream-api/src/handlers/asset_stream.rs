use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::streaming::{range_header, range_response};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
};
use reelstream_core::{AppError, Resolution};
use reelstream_storage::keys::{RENDITION_CONTENT_TYPE, THUMBNAIL_CONTENT_TYPE};
use reelstream_storage::open_locator;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/asset/{name}/{resolution}",
    tag = "assets",
    params(
        ("name" = String, Path, description = "Asset name"),
        ("resolution" = String, Path, description = "Rendition: 360, 1080, 360p or 1080p"),
        ("Range" = Option<String>, Header, description = "Single byte range, e.g. bytes=0-1023")
    ),
    responses(
        (status = 200, description = "Full rendition", content_type = "video/mp4"),
        (status = 206, description = "Requested byte range", content_type = "video/mp4"),
        (status = 404, description = "Asset or rendition not found", body = ErrorResponse),
        (status = 416, description = "Range not satisfiable", body = ErrorResponse),
        (status = 500, description = "Failed to read asset content", body = ErrorResponse)
    )
)]
pub async fn stream_rendition(
    State(state): State<Arc<AppState>>,
    Path((name, resolution)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let resolution = Resolution::parse_tag(&resolution)
        .ok_or_else(|| AppError::NotFound(format!("Unknown resolution '{}'", resolution)))?;

    let locator = state.catalog.resolve(&name, resolution).await?;
    let source = open_locator(state.storage.as_ref(), &locator).await?;

    tracing::debug!(
        asset_name = %name,
        locator = %locator,
        size_bytes = source.size(),
        range = ?range_header(&headers),
        "Streaming rendition"
    );

    range_response(
        source,
        range_header(&headers),
        RENDITION_CONTENT_TYPE,
        state.streaming.chunk_size,
    )
    .await
}

#[utoipa::path(
    get,
    path = "/asset/thumbnail/{name}",
    tag = "assets",
    params(
        ("name" = String, Path, description = "Asset name"),
        ("Range" = Option<String>, Header, description = "Single byte range")
    ),
    responses(
        (status = 200, description = "Thumbnail image", content_type = "image/png"),
        (status = 206, description = "Requested byte range", content_type = "image/png"),
        (status = 404, description = "Asset not found", body = ErrorResponse),
        (status = 416, description = "Range not satisfiable", body = ErrorResponse)
    )
)]
pub async fn stream_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let locator = state.catalog.resolve_thumbnail(&name).await?;
    let source = open_locator(state.storage.as_ref(), &locator).await?;

    range_response(
        source,
        range_header(&headers),
        THUMBNAIL_CONTENT_TYPE,
        state.streaming.chunk_size,
    )
    .await
}
