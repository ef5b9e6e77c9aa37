//! Shared application state handed to every handler.

use crate::services::upload::UploadLimits;
use reelstream_core::Config;
use reelstream_db::Catalog;
use reelstream_storage::Storage;
use reelstream_worker::TranscodePool;
use std::sync::Arc;
use std::time::Duration;

/// Settings read on the playback path.
#[derive(Clone, Debug)]
pub struct StreamingConfig {
    pub chunk_size: usize,
}

/// Settings read on the upload path.
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub limits: UploadLimits,
    pub scratch_root: std::path::PathBuf,
    pub thumbnail_offset: Duration,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<dyn Catalog>,
    pub storage: Arc<dyn Storage>,
    pub transcode_pool: TranscodePool,
    pub streaming: StreamingConfig,
    pub upload: UploadConfig,
}
