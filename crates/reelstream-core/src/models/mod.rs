pub mod asset;
pub mod job;
pub mod locator;
pub mod resolution;

pub use asset::{Asset, AssetMetadata, AssetResponse, AssetStatus};
pub use job::{JobSnapshot, JobStatus};
pub use locator::{Locator, LocatorParseError};
pub use resolution::Resolution;
