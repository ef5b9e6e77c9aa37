//! Reelstream Core Library
//!
//! Domain models, error types and configuration shared by every reelstream crate.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, ReelstreamConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    Asset, AssetMetadata, AssetStatus, JobSnapshot, JobStatus, Locator, LocatorParseError,
    Resolution,
};
pub use storage_types::StorageBackend;
