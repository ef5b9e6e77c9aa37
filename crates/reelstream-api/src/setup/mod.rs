//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use reelstream_core::Config;
use reelstream_processing::FfmpegTranscoder;
use std::sync::Arc;
use std::time::Duration;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let catalog = database::setup_catalog(&config).await?;
    let storage = storage::setup_storage(&config).await?;

    let transcoder = Arc::new(FfmpegTranscoder::new(
        config.ffmpeg_path(),
        Duration::from_secs(config.transcode_timeout_secs()),
    ));
    let state = services::initialize_services(&config, catalog, storage, transcoder)?;

    let router = routes::setup_routes(&config, state.clone()).await?;

    Ok((state, router))
}
