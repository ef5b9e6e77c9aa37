//! Reelstream Processing Library
//!
//! Turns an uploaded source file into published renditions:
//! thumbnail, then each rendition in ascending resolution, then the
//! all-or-nothing publish step that uploads artifacts and commits the catalog row.
//!
//! Encoding is delegated to an external ffmpeg process through the
//! [`Transcoder`] trait so tests can script encoder outcomes.

pub mod commands;
pub mod job;
pub mod pipeline;
pub mod publish;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod transcoder;

pub use commands::{rendition_command, thumbnail_command};
pub use job::{RenditionJob, Stage};
pub use pipeline::{NoopObserver, PipelineError, StageObserver, TranscodePipeline};
pub use publish::{Artifacts, AssetDraft, PublishError, PublishStep};
pub use transcoder::{EncodeCommand, FfmpegTranscoder, ProcessExit, TranscodeError, Transcoder};
