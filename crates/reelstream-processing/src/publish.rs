use chrono::Utc;
use reelstream_core::{Asset, AssetMetadata, AssetStatus, Resolution};
use reelstream_db::{Catalog, CatalogError};
use reelstream_storage::keys::{
    rendition_key, thumbnail_key, RENDITION_CONTENT_TYPE, THUMBNAIL_CONTENT_TYPE,
};
use reelstream_storage::{Storage, StorageError};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to upload {key}: {source}")]
    Upload {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to commit asset to catalog: {0}")]
    Catalog(#[source] CatalogError),
}

/// Identity and metadata of the asset being published.
#[derive(Debug, Clone)]
pub struct AssetDraft {
    pub id: Uuid,
    pub name: String,
    pub metadata: AssetMetadata,
}

/// Local files produced by the encoder stages.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub thumbnail: PathBuf,
    pub renditions: Vec<(Resolution, PathBuf)>,
}

/// Uploads every artifact, then commits a single catalog row.
///
/// Either all artifacts are stored and the asset is cataloged as `Ready`, or
/// every key written so far, including the one that failed, is deleted again
/// and nothing is cataloged.
pub struct PublishStep {
    storage: Arc<dyn Storage>,
    catalog: Arc<dyn Catalog>,
}

impl PublishStep {
    pub fn new(storage: Arc<dyn Storage>, catalog: Arc<dyn Catalog>) -> Self {
        Self { storage, catalog }
    }

    #[tracing::instrument(skip_all, fields(asset_id = %draft.id, asset_name = %draft.name))]
    pub async fn publish(
        &self,
        draft: AssetDraft,
        artifacts: &Artifacts,
    ) -> Result<Asset, PublishError> {
        let mut uploaded: Vec<String> = Vec::with_capacity(artifacts.renditions.len() + 1);

        let key = thumbnail_key(draft.id);
        let thumbnail = match self
            .storage
            .put_file(&key, &artifacts.thumbnail, THUMBNAIL_CONTENT_TYPE)
            .await
        {
            Ok(locator) => {
                uploaded.push(key);
                locator
            }
            Err(source) => {
                // A failed put can still leave a partial object behind.
                uploaded.push(key.clone());
                self.rollback(&uploaded).await;
                return Err(PublishError::Upload { key, source });
            }
        };

        let mut renditions = BTreeMap::new();
        for (resolution, path) in &artifacts.renditions {
            let key = rendition_key(draft.id, *resolution);
            match self
                .storage
                .put_file(&key, path, RENDITION_CONTENT_TYPE)
                .await
            {
                Ok(locator) => {
                    uploaded.push(key);
                    renditions.insert(*resolution, locator);
                }
                Err(source) => {
                    uploaded.push(key.clone());
                    self.rollback(&uploaded).await;
                    return Err(PublishError::Upload { key, source });
                }
            }
        }

        let asset = Asset {
            id: draft.id,
            name: draft.name,
            metadata: draft.metadata,
            status: AssetStatus::Ready,
            renditions,
            thumbnail: Some(thumbnail),
            created_at: Utc::now(),
        };

        if let Err(e) = self.catalog.insert(&asset).await {
            self.rollback(&uploaded).await;
            return Err(PublishError::Catalog(e));
        }

        tracing::info!(
            objects = uploaded.len(),
            storage_backend = %self.storage.backend_type(),
            "Asset published"
        );

        Ok(asset)
    }

    async fn rollback(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }

        tracing::warn!(objects = keys.len(), "Rolling back partially published asset");

        for key in keys {
            if let Err(e) = self.storage.delete(key).await {
                // Orphaned object; no catalog row points at it.
                tracing::warn!(key = %key, error = %e, "Failed to delete object during rollback");
            }
        }
    }
}
