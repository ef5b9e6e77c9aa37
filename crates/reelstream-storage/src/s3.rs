use crate::keys::validate_key;
use crate::source::{ByteSource, SourceError};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::buffered::BufWriter;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, GetRange, ObjectStore, ObjectStoreExt,
    PutOptions, PutPayload, Result as ObjectResult,
};
use reelstream_core::Locator;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// S3 (or S3-compatible) storage implementation backed by `object_store`.
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder.with_endpoint(endpoint).with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::with_store(Arc::new(store), bucket))
    }

    /// Wrap an already-built object store (any `object_store` backend).
    pub fn with_store(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        S3Storage {
            store,
            bucket: bucket.into(),
        }
    }

    fn location(key: &str) -> StorageResult<Path> {
        validate_key(key).map_err(|msg| StorageError::InvalidKey(msg.to_string()))?;
        Ok(Path::from(key))
    }

    fn attributes(content_type: &str) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
        attributes
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<Locator> {
        let location = Self::location(key)?;
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        let options = PutOptions {
            attributes: Self::attributes(content_type),
            ..Default::default()
        };
        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(data), options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 put failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 put successful"
        );

        Ok(Locator::Object(key.to_string()))
    }

    async fn put_file(
        &self,
        key: &str,
        source_path: &std::path::Path,
        content_type: &str,
    ) -> StorageResult<Locator> {
        let location = Self::location(key)?;
        let start = std::time::Instant::now();

        let mut file = tokio::fs::File::open(source_path).await?;
        let mut writer = BufWriter::new(self.store.clone(), location)
            .with_attributes(Self::attributes(content_type));

        let copied = tokio::io::copy(&mut file, &mut writer).await;
        let size = match copied {
            Ok(size) => size,
            Err(e) => {
                if let Err(abort_err) = writer.abort().await {
                    tracing::warn!(error = %abort_err, key = %key, "Failed to abort S3 upload");
                }
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    path = %source_path.display(),
                    "S3 streaming upload failed"
                );
                return Err(StorageError::UploadFailed(e.to_string()));
            }
        };

        writer.shutdown().await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 streaming upload failed to complete"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 streaming upload successful"
        );

        Ok(Locator::Object(key.to_string()))
    }

    async fn open(&self, key: &str) -> StorageResult<Box<dyn ByteSource>> {
        let location = Self::location(key)?;
        let meta = self.store.head(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        Ok(Box::new(RemoteObjectSource::new(
            self.store.clone(),
            location,
            meta.size,
        )))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let location = Self::location(key)?;
        let start = std::time::Instant::now();

        match self.store.delete(&location).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let location = Self::location(key)?;
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

/// Byte source over a remote object.
///
/// Seeking is free: it only moves the cursor. The next read issues a ranged GET
/// from the cursor to the end of the object and drains it as a stream.
pub struct RemoteObjectSource {
    store: Arc<dyn ObjectStore>,
    location: Path,
    size: u64,
    position: u64,
    stream: Option<BoxStream<'static, ObjectResult<Bytes>>>,
    pending: Bytes,
}

impl RemoteObjectSource {
    pub fn new(store: Arc<dyn ObjectStore>, location: Path, size: u64) -> Self {
        Self {
            store,
            location,
            size,
            position: 0,
            stream: None,
            pending: Bytes::new(),
        }
    }

    async fn fill(&mut self) -> Result<bool, SourceError> {
        while self.pending.is_empty() {
            if self.stream.is_none() {
                if self.position >= self.size {
                    return Ok(false);
                }
                let options = GetOptions {
                    range: Some(GetRange::Bounded(self.position..self.size)),
                    ..Default::default()
                };
                let result = self
                    .store
                    .get_opts(&self.location, options)
                    .await
                    .map_err(|e| SourceError::Remote(e.to_string()))?;
                self.stream = Some(result.into_stream());
            }

            let Some(stream) = self.stream.as_mut() else {
                return Ok(false);
            };
            match stream.next().await {
                Some(Ok(chunk)) => self.pending = chunk,
                Some(Err(e)) => return Err(SourceError::Remote(e.to_string())),
                None => return Ok(false),
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl ByteSource for RemoteObjectSource {
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
        self.position = offset;
        self.stream = None;
        self.pending = Bytes::new();
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        if buf.is_empty() || !self.fill().await? {
            return Ok(0);
        }
        let n = buf.len().min(self.pending.len());
        let chunk = self.pending.split_to(n);
        buf[..n].copy_from_slice(&chunk);
        self.position += n as u64;
        Ok(n)
    }

    fn describe(&self) -> String {
        format!("object:{}", self.location)
    }
}

#[cfg(all(test, feature = "storage-s3"))]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use tempfile::tempdir;

    fn memory_storage() -> S3Storage {
        S3Storage::with_store(Arc::new(InMemory::new()), "test-bucket")
    }

    #[tokio::test]
    async fn test_put_then_open_reads_from_offset() {
        let storage = memory_storage();
        let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();

        let locator = storage
            .put("videos/a/360.mp4", Bytes::from(payload.clone()), "video/mp4")
            .await
            .unwrap();
        assert_eq!(locator, Locator::Object("videos/a/360.mp4".to_string()));

        let mut source = storage.open("videos/a/360.mp4").await.unwrap();
        assert_eq!(source.size(), 10_000);

        source.seek(9_000).await.unwrap();
        let mut out = Vec::new();
        let mut buf = vec![0u8; 333];
        loop {
            let n = source.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, payload[9_000..]);
    }

    #[tokio::test]
    async fn test_reseek_discards_buffered_bytes() {
        let storage = memory_storage();
        storage
            .put("videos/b/1080.mp4", Bytes::from_static(b"abcdefghij"), "video/mp4")
            .await
            .unwrap();

        let mut source = storage.open("videos/b/1080.mp4").await.unwrap();
        let mut buf = [0u8; 2];
        source.read(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ab");

        source.seek(7).await.unwrap();
        let n = source.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hi");

        assert!(matches!(
            source.seek(11).await,
            Err(SourceError::SeekOutOfBounds { offset: 11, size: 10 })
        ));
    }

    #[tokio::test]
    async fn test_put_file_exists_and_delete() {
        let storage = memory_storage();
        let dir = tempdir().unwrap();
        let path = dir.path().join("thumb.png");
        tokio::fs::write(&path, b"\x89PNG").await.unwrap();

        storage
            .put_file("thumbnails/c.png", &path, "image/png")
            .await
            .unwrap();
        assert!(storage.exists("thumbnails/c.png").await.unwrap());

        storage.delete("thumbnails/c.png").await.unwrap();
        assert!(!storage.exists("thumbnails/c.png").await.unwrap());
        assert!(storage.delete("thumbnails/c.png").await.is_ok());
    }

    #[tokio::test]
    async fn test_open_missing_object_is_not_found() {
        let storage = memory_storage();
        let result = storage.open("videos/none/360.mp4").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let storage = memory_storage();
        let result = storage
            .put("../escape", Bytes::from_static(b"x"), "video/mp4")
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
