//! Storage setup and initialization

use anyhow::{Context, Result};
use reelstream_core::Config;
use reelstream_storage::{create_storage, Storage};
use std::sync::Arc;

/// Setup the object store artifacts are published to
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    tracing::info!(
        backend = %storage.backend_type(),
        local_path = %config.local_storage_path().display(),
        bucket = ?config.s3_bucket(),
        "Storage backend initialized"
    );

    Ok(storage)
}
