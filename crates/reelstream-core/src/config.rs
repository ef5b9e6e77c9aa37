//! Configuration module
//!
//! Settings are read from the environment (optionally seeded from a `.env` file).
//! Every value has a default so a bare `cargo run` serves from local storage with
//! an in-memory catalog.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub http_concurrency_limit: usize,
    /// `json` switches the console formatter to JSON lines
    pub log_format: String,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
            log_format: "compact".to_string(),
        }
    }
}

/// Streaming and ingest settings
#[derive(Clone, Debug)]
pub struct ReelstreamConfig {
    pub base: BaseConfig,
    /// Postgres catalog; `None` selects the in-memory catalog
    pub database_url: Option<String>,
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub aws_region: Option<String>,
    pub local_storage_path: PathBuf,
    pub ffmpeg_path: String,
    pub scratch_dir: PathBuf,
    pub max_video_size_bytes: u64,
    pub video_allowed_extensions: Vec<String>,
    pub max_concurrent_transcodes: usize,
    pub transcode_queue_size: usize,
    pub transcode_timeout_secs: u64,
    pub thumbnail_offset_secs: u64,
    pub stream_chunk_size_bytes: usize,
    pub job_retention_secs: u64,
}

impl Default for ReelstreamConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig::default(),
            database_url: None,
            storage_backend: StorageBackend::Local,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: PathBuf::from("./storage"),
            ffmpeg_path: "ffmpeg".to_string(),
            scratch_dir: PathBuf::from("./temp"),
            max_video_size_bytes: 500 * 1024 * 1024,
            video_allowed_extensions: ["mp4", "mov", "mkv", "webm", "avi"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_concurrent_transcodes: 2,
            transcode_queue_size: 100,
            transcode_timeout_secs: 3600,
            thumbnail_offset_secs: 10,
            stream_chunk_size_bytes: 1024 * 1024,
            job_retention_secs: 86_400,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl ReelstreamConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const MAX_VIDEO_SIZE_MB: u64 = 500;
        const STREAM_CHUNK_SIZE_KB: usize = 1024;

        let defaults = ReelstreamConfig::default();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| defaults.base.environment.clone());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let storage_backend = match env_opt("STORAGE_BACKEND") {
            Some(raw) => raw.parse::<StorageBackend>()?,
            None => defaults.storage_backend,
        };

        let video_allowed_extensions = env_opt("VIDEO_ALLOWED_EXTENSIONS")
            .map(|raw| split_list(&raw))
            .unwrap_or(defaults.video_allowed_extensions);

        let base = BaseConfig {
            server_port: env_or("PORT", SERVER_PORT),
            cors_origins,
            environment,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            http_concurrency_limit: env_or("HTTP_CONCURRENCY_LIMIT", HTTP_CONCURRENCY_LIMIT)
                .max(1),
            log_format: env_opt("LOG_FORMAT").unwrap_or(defaults.base.log_format),
        };

        Ok(ReelstreamConfig {
            base,
            database_url: env_opt("DATABASE_URL"),
            storage_backend,
            s3_bucket: env_opt("S3_BUCKET"),
            s3_region: env_opt("S3_REGION"),
            s3_endpoint: env_opt("S3_ENDPOINT"),
            aws_region: env_opt("AWS_REGION"),
            local_storage_path: env_opt("LOCAL_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.local_storage_path),
            ffmpeg_path: env_opt("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            scratch_dir: env_opt("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            max_video_size_bytes: env_or("MAX_VIDEO_SIZE_MB", MAX_VIDEO_SIZE_MB) * 1024 * 1024,
            video_allowed_extensions,
            max_concurrent_transcodes: env_or(
                "MAX_CONCURRENT_TRANSCODES",
                defaults.max_concurrent_transcodes,
            ),
            transcode_queue_size: env_or("TRANSCODE_QUEUE_SIZE", defaults.transcode_queue_size),
            transcode_timeout_secs: env_or(
                "TRANSCODE_TIMEOUT_SECS",
                defaults.transcode_timeout_secs,
            ),
            thumbnail_offset_secs: env_or("THUMBNAIL_OFFSET_SECS", defaults.thumbnail_offset_secs),
            stream_chunk_size_bytes: env_or("STREAM_CHUNK_SIZE_KB", STREAM_CHUNK_SIZE_KB) * 1024,
            job_retention_secs: env_or("JOB_RETENTION_SECS", defaults.job_retention_secs),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if let Some(url) = &self.database_url {
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.storage_backend == StorageBackend::S3 {
            if self.s3_bucket.is_none() {
                return Err(anyhow::anyhow!(
                    "S3_BUCKET must be set when using S3 storage backend"
                ));
            }
            if self.s3_region.is_none() && self.aws_region.is_none() {
                return Err(anyhow::anyhow!(
                    "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                ));
            }
        }

        if self.max_concurrent_transcodes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_CONCURRENT_TRANSCODES must be at least 1"
            ));
        }

        if self.transcode_queue_size == 0 {
            return Err(anyhow::anyhow!("TRANSCODE_QUEUE_SIZE must be at least 1"));
        }

        if self.transcode_timeout_secs == 0 {
            return Err(anyhow::anyhow!("TRANSCODE_TIMEOUT_SECS must be at least 1"));
        }

        if self.stream_chunk_size_bytes == 0 {
            return Err(anyhow::anyhow!("STREAM_CHUNK_SIZE_KB must be at least 1"));
        }

        if self.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_VIDEO_SIZE_MB must be at least 1"));
        }

        if self.video_allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!(
                "VIDEO_ALLOWED_EXTENSIONS must list at least one extension"
            ));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

/// Application configuration.
#[derive(Clone, Debug, Default)]
pub struct Config(pub Box<ReelstreamConfig>);

impl Config {
    fn inner(&self) -> &ReelstreamConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ReelstreamConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn is_production(&self) -> bool {
        self.inner().is_production()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.inner().base.http_concurrency_limit
    }

    pub fn log_format(&self) -> &str {
        &self.inner().base.log_format
    }

    pub fn database_url(&self) -> Option<&str> {
        self.inner().database_url.as_deref()
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> &std::path::Path {
        &self.inner().local_storage_path
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.inner().ffmpeg_path
    }

    pub fn scratch_dir(&self) -> &std::path::Path {
        &self.inner().scratch_dir
    }

    pub fn max_video_size_bytes(&self) -> u64 {
        self.inner().max_video_size_bytes
    }

    pub fn video_allowed_extensions(&self) -> &[String] {
        &self.inner().video_allowed_extensions
    }

    pub fn max_concurrent_transcodes(&self) -> usize {
        self.inner().max_concurrent_transcodes
    }

    pub fn transcode_queue_size(&self) -> usize {
        self.inner().transcode_queue_size
    }

    pub fn transcode_timeout_secs(&self) -> u64 {
        self.inner().transcode_timeout_secs
    }

    pub fn thumbnail_offset_secs(&self) -> u64 {
        self.inner().thumbnail_offset_secs
    }

    pub fn stream_chunk_size_bytes(&self) -> usize {
        self.inner().stream_chunk_size_bytes
    }

    pub fn job_retention_secs(&self) -> u64 {
        self.inner().job_retention_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server_port(), 4000);
        assert_eq!(config.stream_chunk_size_bytes(), 1024 * 1024);
        assert_eq!(config.max_concurrent_transcodes(), 2);
        assert_eq!(config.storage_backend(), StorageBackend::Local);
        assert!(config.database_url().is_none());
    }

    #[test]
    fn test_s3_requires_bucket_and_region() {
        let mut inner = ReelstreamConfig {
            storage_backend: StorageBackend::S3,
            ..Default::default()
        };
        assert!(inner.validate().is_err());

        inner.s3_bucket = Some("reels".to_string());
        assert!(inner.validate().is_err());

        inner.aws_region = Some("eu-west-1".to_string());
        assert!(inner.validate().is_ok());
    }

    #[test]
    fn test_production_rejects_wildcard_cors() {
        let mut inner = ReelstreamConfig::default();
        inner.base.environment = "production".to_string();
        assert!(inner.validate().is_err());

        inner.base.cors_origins = vec!["https://watch.example.com".to_string()];
        assert!(inner.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_postgres_database_url() {
        let inner = ReelstreamConfig {
            database_url: Some("mysql://localhost/reels".to_string()),
            ..Default::default()
        };
        assert!(inner.validate().is_err());
    }

    #[test]
    fn test_zero_worker_pool_is_invalid() {
        let inner = ReelstreamConfig {
            max_concurrent_transcodes: 0,
            ..Default::default()
        };
        assert!(inner.validate().is_err());
    }

    #[test]
    fn test_split_list_normalizes() {
        assert_eq!(split_list(" MP4, mov ,,"), vec!["mp4", "mov"]);
    }
}
