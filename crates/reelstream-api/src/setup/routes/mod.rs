//! Route configuration and setup.

mod health;

use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use reelstream_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa_rapidoc::RapiDoc;

/// Room for multipart boundaries and text fields on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Setup all application routes
pub async fn setup_routes(
    config: &Config,
    state: Arc<AppState>,
) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let http_concurrency_limit = config.http_concurrency_limit().max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let body_limit = config
        .max_video_size_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let app = health_routes(state.clone())
        .merge(asset_routes())
        .merge(job_routes())
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .merge(RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
            .expose_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
            .expose_headers(Any)
    };
    Ok(cors)
}

/// Probes (no state extractor; the closures capture it)
fn health_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/health",
            get({
                let state = state.clone();
                move || {
                    let state = state.clone();
                    async { health::health_check(state).await }
                }
            }),
        )
        .route("/live", get(|| async { health::liveness_check().await }))
        .route(
            "/ready",
            get({
                let state = state.clone();
                move || {
                    let state = state.clone();
                    async { health::readiness_check(state).await }
                }
            }),
        )
}

/// Playback, metadata and upload. `/asset/thumbnail/{name}` and `/asset/upload`
/// are static segments and take precedence over `/asset/{name}`.
fn asset_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/asset/upload", post(handlers::asset_upload::upload_asset))
        .route(
            "/asset/thumbnail/{name}",
            get(handlers::asset_stream::stream_thumbnail),
        )
        .route("/asset/{name}", get(handlers::asset_get::get_asset))
        .route(
            "/asset/{name}/{resolution}",
            get(handlers::asset_stream::stream_rendition),
        )
}

fn job_routes() -> Router<Arc<AppState>> {
    Router::new().route("/jobs/{id}", get(handlers::jobs::get_job))
}
