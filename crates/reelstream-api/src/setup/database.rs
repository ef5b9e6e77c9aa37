//! Catalog setup: Postgres when `DATABASE_URL` is set, in-memory otherwise.

use anyhow::{Context, Result};
use reelstream_core::Config;
use reelstream_db::{Catalog, InMemoryCatalog, PgCatalog};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Setup database connection pool and run migrations
pub async fn setup_database(config: &Config, database_url: &str) -> Result<PgPool> {
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database connected successfully"
    );

    // Run pending migrations on startup (path: workspace migrations/ from crate root)
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

pub async fn setup_catalog(config: &Config) -> Result<Arc<dyn Catalog>> {
    match config.database_url() {
        Some(url) => {
            let pool = setup_database(config, url).await?;
            Ok(Arc::new(PgCatalog::new(pool)))
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set; using in-memory catalog (assets are lost on restart)"
            );
            Ok(Arc::new(InMemoryCatalog::new()))
        }
    }
}
