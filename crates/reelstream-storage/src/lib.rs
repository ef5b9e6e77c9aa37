//! Reelstream Storage Library
//!
//! Object storage for published artifacts and the byte sources playback reads from.
//!
//! # Storage key format
//!
//! - thumbnails: `thumbnails/{asset_id}.png`
//! - renditions: `videos/{asset_id}/{tag}.mp4`
//!
//! Keys must not contain `..` or a leading `/`. Key generation lives in the
//! `keys` module so every backend and the publish step agree on layout.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod source;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use reelstream_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::{RemoteObjectSource, S3Storage};
pub use source::{open_locator, ByteSource, LocalFileSource, SourceError};
pub use traits::{Storage, StorageError, StorageResult};
