use async_trait::async_trait;
use reelstream_core::{Asset, Locator, Resolution};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt catalog entry: {0}")]
    Corrupt(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Name → locator resolution and the single commit point of an upload.
///
/// Only `Ready` assets are visible through `resolve`.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Locator of the `resolution` rendition of asset `name`.
    async fn resolve(&self, name: &str, resolution: Resolution) -> CatalogResult<Locator>;

    /// Locator of the thumbnail of asset `name`.
    async fn resolve_thumbnail(&self, name: &str) -> CatalogResult<Locator>;

    /// Insert a new asset. Fails with `Conflict` when the name is taken.
    async fn insert(&self, asset: &Asset) -> CatalogResult<Uuid>;

    async fn get(&self, name: &str) -> CatalogResult<Option<Asset>>;

    async fn contains(&self, name: &str) -> CatalogResult<bool>;

    /// Cheap connectivity check for health probes.
    async fn ping(&self) -> CatalogResult<()>;

    fn backend_name(&self) -> &'static str;
}
