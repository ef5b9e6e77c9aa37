use crate::catalog::{Catalog, CatalogError, CatalogResult};
use async_trait::async_trait;
use reelstream_core::{Asset, Locator, Resolution};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Catalog kept in process memory, keyed by asset name.
#[derive(Default)]
pub struct InMemoryCatalog {
    assets: RwLock<HashMap<String, Asset>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.assets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.assets.read().await.is_empty()
    }

    async fn ready(&self, name: &str) -> CatalogResult<Asset> {
        self.assets
            .read()
            .await
            .get(name)
            .filter(|asset| asset.is_ready())
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("asset '{}'", name)))
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn resolve(&self, name: &str, resolution: Resolution) -> CatalogResult<Locator> {
        let asset = self.ready(name).await?;
        asset.rendition(resolution).cloned().ok_or_else(|| {
            CatalogError::NotFound(format!("asset '{}' has no {} rendition", name, resolution))
        })
    }

    async fn resolve_thumbnail(&self, name: &str) -> CatalogResult<Locator> {
        let asset = self.ready(name).await?;
        asset
            .thumbnail
            .ok_or_else(|| CatalogError::NotFound(format!("asset '{}' has no thumbnail", name)))
    }

    async fn insert(&self, asset: &Asset) -> CatalogResult<Uuid> {
        let mut assets = self.assets.write().await;
        if assets.contains_key(&asset.name) {
            return Err(CatalogError::Conflict(format!(
                "asset '{}' already exists",
                asset.name
            )));
        }
        assets.insert(asset.name.clone(), asset.clone());
        tracing::debug!(asset_id = %asset.id, asset_name = %asset.name, "Asset inserted into memory catalog");
        Ok(asset.id)
    }

    async fn get(&self, name: &str) -> CatalogResult<Option<Asset>> {
        Ok(self.assets.read().await.get(name).cloned())
    }

    async fn contains(&self, name: &str) -> CatalogResult<bool> {
        Ok(self.assets.read().await.contains_key(name))
    }

    async fn ping(&self) -> CatalogResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
