//! Range-aware playback.
//!
//! [`range::resolve`] turns a `Range` header into an interval, [`RangeStreamer`]
//! copies that interval out of a byte source in bounded chunks, and
//! [`range_response`] wires both into an axum response.

pub mod range;
pub mod response;
pub mod streamer;

pub use range::{resolve, ByteInterval, RangeDecision, RangeNotSatisfiable};
pub use response::{range_header, range_response, ChannelSink};
pub use streamer::{ChunkSink, RangeStreamer, SinkClosed, StreamError, DEFAULT_CHUNK_SIZE};
