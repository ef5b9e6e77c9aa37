use crate::catalog::{Catalog, CatalogError, CatalogResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reelstream_core::{Asset, AssetMetadata, AssetStatus, Locator, Resolution};
use sqlx::{PgPool, Postgres};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct AssetRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    genre: Option<String>,
    year: Option<i32>,
    status: AssetStatus,
    thumbnail_locator: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct RenditionRow {
    resolution: i32,
    locator: String,
}

fn parse_locator(raw: &str) -> CatalogResult<Locator> {
    raw.parse::<Locator>()
        .map_err(|e| CatalogError::Corrupt(e.to_string()))
}

fn map_insert_error(err: sqlx::Error, name: &str) -> CatalogError {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            CatalogError::Conflict(format!("asset '{}' already exists", name))
        }
        other => CatalogError::Database(other),
    }
}

/// Postgres-backed catalog.
///
/// `assets` holds one row per asset (unique `name`); `asset_renditions` holds one
/// row per published resolution.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_asset(row: AssetRow, renditions: Vec<RenditionRow>) -> CatalogResult<Asset> {
        let mut map = BTreeMap::new();
        for rendition in renditions {
            let resolution = Resolution::from_height(rendition.resolution).ok_or_else(|| {
                CatalogError::Corrupt(format!(
                    "asset '{}' has unknown resolution {}",
                    row.name, rendition.resolution
                ))
            })?;
            map.insert(resolution, parse_locator(&rendition.locator)?);
        }

        Ok(Asset {
            id: row.id,
            name: row.name,
            metadata: AssetMetadata {
                description: row.description,
                genre: row.genre,
                year: row.year,
            },
            status: row.status,
            renditions: map,
            thumbnail: row
                .thumbnail_locator
                .as_deref()
                .map(parse_locator)
                .transpose()?,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    #[tracing::instrument(skip(self), fields(db.table = "asset_renditions", db.operation = "select"))]
    async fn resolve(&self, name: &str, resolution: Resolution) -> CatalogResult<Locator> {
        let row: Option<(String,)> = sqlx::query_as::<Postgres, (String,)>(
            r#"
            SELECT r.locator
            FROM asset_renditions r
            JOIN assets a ON a.id = r.asset_id
            WHERE a.name = $1 AND r.resolution = $2 AND a.status = 'ready'
            "#,
        )
        .bind(name)
        .bind(resolution.height() as i32)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((locator,)) => parse_locator(&locator),
            None => Err(CatalogError::NotFound(format!(
                "asset '{}' has no {} rendition",
                name, resolution
            ))),
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "assets", db.operation = "select"))]
    async fn resolve_thumbnail(&self, name: &str) -> CatalogResult<Locator> {
        let row: Option<(Option<String>,)> = sqlx::query_as::<Postgres, (Option<String>,)>(
            "SELECT thumbnail_locator FROM assets WHERE name = $1 AND status = 'ready'",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((Some(locator),)) => parse_locator(&locator),
            _ => Err(CatalogError::NotFound(format!(
                "asset '{}' has no thumbnail",
                name
            ))),
        }
    }

    #[tracing::instrument(
        skip(self, asset),
        fields(db.table = "assets", db.operation = "insert", asset_name = %asset.name)
    )]
    async fn insert(&self, asset: &Asset) -> CatalogResult<Uuid> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO assets (
                id, name, description, genre, year, status, thumbnail_locator, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(asset.id)
        .bind(&asset.name)
        .bind(&asset.metadata.description)
        .bind(&asset.metadata.genre)
        .bind(asset.metadata.year)
        .bind(asset.status)
        .bind(asset.thumbnail.as_ref().map(|l| l.to_string()))
        .bind(asset.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, &asset.name))?;

        for (resolution, locator) in &asset.renditions {
            sqlx::query(
                "INSERT INTO asset_renditions (asset_id, resolution, locator) VALUES ($1, $2, $3)",
            )
            .bind(asset.id)
            .bind(resolution.height() as i32)
            .bind(locator.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            asset_id = %asset.id,
            asset_name = %asset.name,
            renditions = asset.renditions.len(),
            "Asset committed to catalog"
        );

        Ok(asset.id)
    }

    async fn get(&self, name: &str) -> CatalogResult<Option<Asset>> {
        let row: Option<AssetRow> = sqlx::query_as::<Postgres, AssetRow>(
            r#"
            SELECT id, name, description, genre, year, status, thumbnail_locator, created_at
            FROM assets
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let renditions: Vec<RenditionRow> = sqlx::query_as::<Postgres, RenditionRow>(
            "SELECT resolution, locator FROM asset_renditions WHERE asset_id = $1 ORDER BY resolution",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        Self::row_to_asset(row, renditions).map(Some)
    }

    async fn contains(&self, name: &str) -> CatalogResult<bool> {
        let exists: (bool,) =
            sqlx::query_as::<Postgres, (bool,)>("SELECT EXISTS(SELECT 1 FROM assets WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists.0)
    }

    async fn ping(&self) -> CatalogResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
