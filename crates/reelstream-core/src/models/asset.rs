use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

use super::locator::Locator;
use super::resolution::Resolution;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "asset_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Pending,
    Ready,
    Failed,
}

impl Display for AssetStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AssetStatus::Pending => write!(f, "pending"),
            AssetStatus::Ready => write!(f, "ready"),
            AssetStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Free-form descriptive fields supplied with an upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct AssetMetadata {
    pub description: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
}

/// A logical video and the locators of everything published for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub id: Uuid,
    pub name: String,
    pub metadata: AssetMetadata,
    pub status: AssetStatus,
    pub renditions: BTreeMap<Resolution, Locator>,
    pub thumbnail: Option<Locator>,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    pub fn rendition(&self, resolution: Resolution) -> Option<&Locator> {
        self.renditions.get(&resolution)
    }

    pub fn is_ready(&self) -> bool {
        self.status == AssetStatus::Ready
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssetResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub status: AssetStatus,
    /// Rendition tags available for streaming, e.g. `["360", "1080"]`
    pub resolutions: Vec<String>,
    pub has_thumbnail: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Asset> for AssetResponse {
    fn from(asset: &Asset) -> Self {
        Self {
            id: asset.id,
            name: asset.name.clone(),
            description: asset.metadata.description.clone(),
            genre: asset.metadata.genre.clone(),
            year: asset.metadata.year,
            status: asset.status,
            resolutions: asset
                .renditions
                .keys()
                .map(|r| r.tag().to_string())
                .collect(),
            has_thumbnail: asset.thumbnail.is_some(),
            created_at: asset.created_at,
        }
    }
}
