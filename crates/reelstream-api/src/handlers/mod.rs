pub mod asset_get;
pub mod asset_stream;
pub mod asset_upload;
pub mod jobs;
