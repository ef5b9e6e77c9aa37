use crate::error::HttpAppError;
use crate::streaming::range::{self, RangeDecision};
use crate::streaming::streamer::{ChunkSink, RangeStreamer, SinkClosed, StreamError};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap},
    response::Response,
};
use bytes::Bytes;
use reelstream_core::AppError;
use reelstream_storage::ByteSource;
use std::io;
use tokio::sync::mpsc;

/// Chunks buffered between the streamer task and the response body.
const BODY_BUFFER_CHUNKS: usize = 4;

type BodyChunk = Result<Bytes, io::Error>;

/// Sink feeding an HTTP response body through a bounded channel.
///
/// The channel closes when hyper drops the body, so a disconnected client
/// surfaces as `SinkClosed` on the next send.
pub struct ChannelSink {
    tx: mpsc::Sender<BodyChunk>,
}

#[async_trait]
impl ChunkSink for ChannelSink {
    async fn send(&mut self, chunk: Bytes) -> Result<(), SinkClosed> {
        self.tx.send(Ok(chunk)).await.map_err(|_| SinkClosed)
    }
}

/// Value of the `Range` header. A header that is not valid UTF-8 is kept as an
/// empty string so it resolves as unparseable rather than absent.
pub fn range_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::RANGE)
        .map(|value| value.to_str().unwrap_or_default())
}

fn body_from_channel(rx: mpsc::Receiver<BodyChunk>) -> Body {
    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    });
    Body::from_stream(stream)
}

/// Build a 200/206 response streaming `source` according to the `Range` header.
///
/// Range errors (416) and seek failures (500) are returned before any header
/// is sent. Failures after that abort the body.
pub async fn range_response(
    source: Box<dyn ByteSource>,
    range_header: Option<&str>,
    content_type: &str,
    chunk_size: usize,
) -> Result<Response, HttpAppError> {
    let decision = range::resolve(range_header, source.size())?;
    let len = decision.len();

    let mut builder = Response::builder()
        .status(decision.status())
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, len);
    if let RangeDecision::Partial(interval) = decision {
        builder = builder.header(header::CONTENT_RANGE, interval.content_range());
    }

    let body = if len == 0 {
        Body::empty()
    } else {
        let streamer = RangeStreamer::open(source, decision.start(), len, chunk_size).await?;
        let (tx, rx) = mpsc::channel::<BodyChunk>(BODY_BUFFER_CHUNKS);
        tokio::spawn(pump_to_channel(streamer, tx));
        body_from_channel(rx)
    };

    builder.body(body).map_err(|e| {
        HttpAppError::from(AppError::Internal(format!(
            "Failed to build streaming response: {}",
            e
        )))
    })
}

async fn pump_to_channel(streamer: RangeStreamer, tx: mpsc::Sender<BodyChunk>) {
    let expected = streamer.expected();
    let mut sink = ChannelSink { tx: tx.clone() };

    match streamer.pump(&mut sink).await {
        Ok(delivered) => {
            tracing::debug!(bytes = delivered, "Range stream completed");
        }
        Err(StreamError::SinkClosed { delivered }) => {
            tracing::debug!(
                bytes = delivered,
                expected,
                "Client disconnected during range stream"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, expected, "Range stream aborted");
            // Headers are gone already; an error item makes hyper abort the body.
            let _ = tx.send(Err(io::Error::other(e.to_string()))).await;
        }
    }
}
