//! Sized, seekable byte sources.
//!
//! Playback never cares whether bytes live on local disk or in an object store:
//! it opens a [`ByteSource`] for a [`Locator`] and reads from it. A source is
//! released when it is dropped.

use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use reelstream_core::Locator;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot seek to offset {offset} in a {size}-byte source")]
    SeekOutOfBounds { offset: u64, size: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("remote read failed: {0}")]
    Remote(String),
}

#[async_trait]
pub trait ByteSource: Send {
    /// Total size in bytes, known once the source is open.
    fn size(&self) -> u64;

    /// Position the next read at `offset`.
    async fn seek(&mut self, offset: u64) -> Result<(), SourceError>;

    /// Read up to `buf.len()` bytes. `Ok(0)` means end of stream.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, SourceError>;

    /// Human-readable origin for logs.
    fn describe(&self) -> String;
}

/// Byte source backed by a file on the local filesystem.
pub struct LocalFileSource {
    file: File,
    path: PathBuf,
    size: u64,
}

impl LocalFileSource {
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StorageError::NotFound(path.display().to_string())
            } else {
                StorageError::IoError(e)
            }
        })?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(StorageError::NotFound(path.display().to_string()));
        }

        Ok(Self {
            file,
            path: path.to_path_buf(),
            size: metadata.len(),
        })
    }
}

#[async_trait]
impl ByteSource for LocalFileSource {
    fn size(&self) -> u64 {
        self.size
    }

    async fn seek(&mut self, offset: u64) -> Result<(), SourceError> {
        if offset > self.size {
            return Err(SourceError::SeekOutOfBounds {
                offset,
                size: self.size,
            });
        }
        self.file.seek(SeekFrom::Start(offset)).await?;
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        Ok(self.file.read(buf).await?)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Open a fresh byte source for `locator`.
///
/// File locators are read straight from disk; object locators go through `storage`.
pub async fn open_locator(
    storage: &dyn Storage,
    locator: &Locator,
) -> StorageResult<Box<dyn ByteSource>> {
    match locator {
        Locator::File(path) => Ok(Box::new(LocalFileSource::open(path).await?)),
        Locator::Object(key) => storage.open(key).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_source_seek_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        tokio::fs::write(&path, b"0123456789").await.unwrap();

        let mut source = LocalFileSource::open(&path).await.unwrap();
        assert_eq!(source.size(), 10);

        source.seek(4).await.unwrap();
        let mut buf = [0u8; 3];
        let n = source.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"456");
    }

    #[tokio::test]
    async fn test_local_source_seek_past_end_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        tokio::fs::write(&path, b"abc").await.unwrap();

        let mut source = LocalFileSource::open(&path).await.unwrap();
        let result = source.seek(4).await;
        assert!(matches!(
            result,
            Err(SourceError::SeekOutOfBounds { offset: 4, size: 3 })
        ));

        source.seek(3).await.unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(source.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_local_source_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let result = LocalFileSource::open(dir.path().join("missing.mp4")).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_local_source_directory_is_not_found() {
        let dir = tempdir().unwrap();
        let result = LocalFileSource::open(dir.path()).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
