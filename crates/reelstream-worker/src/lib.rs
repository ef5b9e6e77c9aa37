//! Background transcoding for accepted uploads.
//!
//! [`TranscodePool`] runs at most `max_concurrent` pipelines at once and holds
//! at most `queue_size` jobs waiting; beyond that submissions are rejected.
//! Every submitted job gets a [`JobHandle`] in the [`JobRegistry`] that callers
//! poll through [`TranscodePool::job`].

pub mod claims;
pub mod pool;
pub mod registry;

pub use claims::{NameClaim, NameClaims};
pub use pool::{QueueError, TranscodePool, TranscodePoolConfig};
pub use registry::{JobHandle, JobRegistry};
