//! Wire the transcode pipeline, worker pool and application state together.

use crate::services::upload::UploadLimits;
use crate::state::{AppState, StreamingConfig, UploadConfig};
use anyhow::Result;
use reelstream_core::Config;
use reelstream_db::Catalog;
use reelstream_processing::{PublishStep, TranscodePipeline, Transcoder};
use reelstream_storage::Storage;
use reelstream_worker::{TranscodePool, TranscodePoolConfig};
use std::sync::Arc;
use std::time::Duration;

/// Build application state. Spawns the worker pool, so it must run inside a Tokio runtime.
pub fn initialize_services(
    config: &Config,
    catalog: Arc<dyn Catalog>,
    storage: Arc<dyn Storage>,
    transcoder: Arc<dyn Transcoder>,
) -> Result<Arc<AppState>> {
    let pipeline = Arc::new(TranscodePipeline::new(
        transcoder,
        PublishStep::new(storage.clone(), catalog.clone()),
    ));

    let transcode_pool = TranscodePool::new(
        pipeline,
        TranscodePoolConfig {
            max_concurrent: config.max_concurrent_transcodes(),
            queue_size: config.transcode_queue_size(),
            job_retention: Duration::from_secs(config.job_retention_secs()),
        },
    );

    tracing::info!(
        catalog = catalog.backend_name(),
        ffmpeg_path = %config.ffmpeg_path(),
        scratch_dir = %config.scratch_dir().display(),
        "Services initialized"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        catalog,
        storage,
        transcode_pool,
        streaming: StreamingConfig {
            chunk_size: config.stream_chunk_size_bytes(),
        },
        upload: UploadConfig {
            limits: UploadLimits::from_config(config),
            scratch_root: config.scratch_dir().to_path_buf(),
            thumbnail_offset: Duration::from_secs(config.thumbnail_offset_secs()),
        },
    }))
}
