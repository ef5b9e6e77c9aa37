//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use reelstream_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Reelstream API",
        version = "0.1.0",
        description = "Video upload, transcoding and range-aware playback. Uploads are transcoded in the background into 360p and 1080p renditions plus a thumbnail; poll /jobs/{id} for progress."
    ),
    paths(
        handlers::asset_stream::stream_rendition,
        handlers::asset_stream::stream_thumbnail,
        handlers::asset_get::get_asset,
        handlers::asset_upload::upload_asset,
        handlers::jobs::get_job,
    ),
    components(
        schemas(
            error::ErrorResponse,
            models::AssetResponse,
            models::AssetStatus,
            models::JobSnapshot,
            models::JobStatus,
            handlers::asset_upload::UploadAcceptedResponse,
        )
    ),
    tags(
        (name = "assets", description = "Playback, metadata and uploads"),
        (name = "jobs", description = "Background transcode job status")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
