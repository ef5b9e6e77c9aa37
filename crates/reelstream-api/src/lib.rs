//! Reelstream API Library
//!
//! HTTP handlers for range-aware playback and uploads, plus application setup.

mod api_doc;
mod handlers;
mod services;
pub mod setup;
pub mod streaming;
mod telemetry;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use services::upload::UploadLimits;
