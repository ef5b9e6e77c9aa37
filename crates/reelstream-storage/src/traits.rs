use crate::source::ByteSource;
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use reelstream_core::Locator;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Object store used by the publish step (writes) and playback (reads).
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store an in-memory payload under `key`.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<Locator>;

    /// Stream a local file into storage under `key` without loading it into memory.
    async fn put_file(&self, key: &str, path: &Path, content_type: &str)
        -> StorageResult<Locator>;

    /// Open the object at `key` as a sized, seekable byte source.
    async fn open(&self, key: &str) -> StorageResult<Box<dyn ByteSource>>;

    /// Delete the object at `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    fn backend_type(&self) -> StorageBackend;
}
