use async_trait::async_trait;
use bytes::Bytes;
use reelstream_storage::{ByteSource, SourceError};
use thiserror::Error;

/// Default read size per iteration (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Error)]
#[error("sink closed")]
pub struct SinkClosed;

/// Destination for streamed chunks, typically an HTTP response body.
#[async_trait]
pub trait ChunkSink: Send {
    async fn send(&mut self, chunk: Bytes) -> Result<(), SinkClosed>;
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to seek {source_name} to offset {offset}: {source}")]
    Seek {
        source_name: String,
        offset: u64,
        #[source]
        source: SourceError,
    },

    #[error("{source_name} ended after {delivered} of {expected} bytes")]
    TruncatedSource {
        source_name: String,
        expected: u64,
        delivered: u64,
    },

    #[error("failed to read {source_name}: {source}")]
    Read {
        source_name: String,
        #[source]
        source: SourceError,
    },

    #[error("client went away after {delivered} bytes")]
    SinkClosed { delivered: u64 },
}

/// Copies exactly `len` bytes from a source, starting at an offset, into a sink.
///
/// The source is owned by the streamer and dropped when `pump` returns,
/// whether it completes or aborts.
pub struct RangeStreamer {
    source: Box<dyn ByteSource>,
    source_name: String,
    expected: u64,
    chunk_size: usize,
}

impl std::fmt::Debug for RangeStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeStreamer")
            .field("source", &self.source_name)
            .field("expected", &self.expected)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

impl RangeStreamer {
    /// Seek `source` to `start`; nothing is read yet.
    pub async fn open(
        mut source: Box<dyn ByteSource>,
        start: u64,
        len: u64,
        chunk_size: usize,
    ) -> Result<Self, StreamError> {
        let source_name = source.describe();
        source
            .seek(start)
            .await
            .map_err(|source| StreamError::Seek {
                source_name: source_name.clone(),
                offset: start,
                source,
            })?;

        Ok(Self {
            source,
            source_name,
            expected: len,
            chunk_size: chunk_size.max(1),
        })
    }

    pub fn expected(&self) -> u64 {
        self.expected
    }

    /// Stream until `expected` bytes are delivered. Returns the byte count.
    ///
    /// Short reads are fine; reaching end of stream early is `TruncatedSource`
    /// and nothing is padded. A failed sink write stops immediately.
    pub async fn pump<S>(mut self, sink: &mut S) -> Result<u64, StreamError>
    where
        S: ChunkSink + ?Sized,
    {
        let mut delivered: u64 = 0;
        let mut remaining = self.expected;
        let mut buf = vec![0u8; (self.chunk_size as u64).min(remaining) as usize];

        while remaining > 0 {
            let want = (self.chunk_size as u64).min(remaining) as usize;
            let read = self
                .source
                .read(&mut buf[..want])
                .await
                .map_err(|source| StreamError::Read {
                    source_name: self.source_name.clone(),
                    source,
                })?;

            if read == 0 {
                return Err(StreamError::TruncatedSource {
                    source_name: std::mem::take(&mut self.source_name),
                    expected: self.expected,
                    delivered,
                });
            }

            sink.send(Bytes::copy_from_slice(&buf[..read]))
                .await
                .map_err(|_| StreamError::SinkClosed { delivered })?;

            delivered += read as u64;
            remaining -= read as u64;
        }

        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// In-memory source that can under-deliver and reports when it is dropped.
    struct MemorySource {
        data: Vec<u8>,
        claimed_size: u64,
        position: usize,
        max_read: usize,
        dropped: Arc<AtomicBool>,
    }

    impl MemorySource {
        fn new(data: Vec<u8>) -> (Self, Arc<AtomicBool>) {
            let dropped = Arc::new(AtomicBool::new(false));
            let size = data.len() as u64;
            (
                Self {
                    data,
                    claimed_size: size,
                    position: 0,
                    max_read: usize::MAX,
                    dropped: dropped.clone(),
                },
                dropped,
            )
        }
    }

    impl Drop for MemorySource {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ByteSource for MemorySource {
        fn size(&self) -> u64 {
            self.claimed_size
        }

        async fn seek(&mut self, offset: u64) -> Result<(), SourceError> {
            if offset > self.claimed_size {
                return Err(SourceError::SeekOutOfBounds {
                    offset,
                    size: self.claimed_size,
                });
            }
            self.position = offset as usize;
            Ok(())
        }

        async fn read(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
            let available = self.data.len().saturating_sub(self.position);
            let n = buf.len().min(available).min(self.max_read);
            buf[..n].copy_from_slice(&self.data[self.position..self.position + n]);
            self.position += n;
            Ok(n)
        }

        fn describe(&self) -> String {
            "memory".to_string()
        }
    }

    #[derive(Default)]
    struct VecSink {
        chunks: Vec<Bytes>,
        fail_after: Option<usize>,
    }

    impl VecSink {
        fn bytes(&self) -> Vec<u8> {
            self.chunks.iter().flat_map(|c| c.iter().copied()).collect()
        }
    }

    #[async_trait]
    impl ChunkSink for VecSink {
        async fn send(&mut self, chunk: Bytes) -> Result<(), SinkClosed> {
            if self.fail_after == Some(self.chunks.len()) {
                return Err(SinkClosed);
            }
            self.chunks.push(chunk);
            Ok(())
        }
    }

    fn data(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[tokio::test]
    async fn test_streams_exact_interval_in_chunks() {
        let content = data(1000);
        let (source, dropped) = MemorySource::new(content.clone());
        let streamer = RangeStreamer::open(Box::new(source), 100, 300, 64)
            .await
            .unwrap();
        let mut sink = VecSink::default();

        let delivered = streamer.pump(&mut sink).await.unwrap();

        assert_eq!(delivered, 300);
        assert_eq!(sink.bytes(), content[100..400]);
        assert!(sink.chunks.iter().all(|c| c.len() <= 64));
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_short_reads_continue() {
        let content = data(500);
        let (mut source, _) = MemorySource::new(content.clone());
        source.max_read = 7;
        let streamer = RangeStreamer::open(Box::new(source), 0, 500, DEFAULT_CHUNK_SIZE)
            .await
            .unwrap();
        let mut sink = VecSink::default();

        assert_eq!(streamer.pump(&mut sink).await.unwrap(), 500);
        assert_eq!(sink.bytes(), content);
    }

    #[tokio::test]
    async fn test_truncated_source_aborts_without_padding() {
        let (mut source, dropped) = MemorySource::new(data(600));
        source.claimed_size = 1000;
        let streamer = RangeStreamer::open(Box::new(source), 0, 1000, 256)
            .await
            .unwrap();
        let mut sink = VecSink::default();

        let err = streamer.pump(&mut sink).await.unwrap_err();

        assert!(matches!(
            err,
            StreamError::TruncatedSource {
                expected: 1000,
                delivered: 600,
                ..
            }
        ));
        assert_eq!(sink.bytes().len(), 600);
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_closed_sink_stops_and_releases_source() {
        let (source, dropped) = MemorySource::new(data(1000));
        let streamer = RangeStreamer::open(Box::new(source), 0, 1000, 100)
            .await
            .unwrap();
        let mut sink = VecSink {
            fail_after: Some(2),
            ..Default::default()
        };

        let err = streamer.pump(&mut sink).await.unwrap_err();

        assert!(matches!(err, StreamError::SinkClosed { delivered: 200 }));
        assert_eq!(sink.chunks.len(), 2);
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_seek_failure_releases_source() {
        let (source, dropped) = MemorySource::new(data(10));
        let err = RangeStreamer::open(Box::new(source), 50, 1, 16)
            .await
            .unwrap_err();

        assert!(matches!(err, StreamError::Seek { offset: 50, .. }));
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_zero_length_sends_nothing() {
        let (source, _) = MemorySource::new(Vec::new());
        let streamer = RangeStreamer::open(Box::new(source), 0, 0, 16).await.unwrap();
        let mut sink = VecSink::default();

        assert_eq!(streamer.pump(&mut sink).await.unwrap(), 0);
        assert!(sink.chunks.is_empty());
    }
}
