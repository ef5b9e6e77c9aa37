//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p reelstream-api`. The catalog is
//! in-memory and storage is a temp directory, so no external services are needed.

#![allow(dead_code)]

use axum_test::TestServer;
use bytes::Bytes;
use chrono::Utc;
use reelstream_api::setup::{routes, services};
use reelstream_core::{Asset, AssetMetadata, AssetStatus, Config, ReelstreamConfig, Resolution};
use reelstream_db::{Catalog, InMemoryCatalog};
use reelstream_processing::testing::ScriptedTranscoder;
use reelstream_processing::Stage;
use reelstream_storage::keys::{
    rendition_key, thumbnail_key, RENDITION_CONTENT_TYPE, THUMBNAIL_CONTENT_TYPE,
};
use reelstream_storage::{LocalStorage, Storage};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

/// Test application: server plus the backends behind it.
pub struct TestApp {
    pub server: TestServer,
    pub catalog: Arc<InMemoryCatalog>,
    pub storage: Arc<LocalStorage>,
    pub transcoder: Arc<ScriptedTranscoder>,
    pub scratch_root: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Publish `content` as every rendition of a ready asset.
    pub async fn seed_asset(&self, name: &str, content: &[u8]) -> Asset {
        let id = Uuid::new_v4();
        let mut renditions = BTreeMap::new();
        for resolution in Resolution::ALL {
            let locator = self
                .storage
                .put(
                    &rendition_key(id, resolution),
                    Bytes::copy_from_slice(content),
                    RENDITION_CONTENT_TYPE,
                )
                .await
                .expect("Failed to store rendition");
            renditions.insert(resolution, locator);
        }
        let thumbnail = self
            .storage
            .put(
                &thumbnail_key(id),
                Bytes::from_static(b"\x89PNG thumbnail"),
                THUMBNAIL_CONTENT_TYPE,
            )
            .await
            .expect("Failed to store thumbnail");

        let asset = Asset {
            id,
            name: name.to_string(),
            metadata: AssetMetadata::default(),
            status: AssetStatus::Ready,
            renditions,
            thumbnail: Some(thumbnail),
            created_at: Utc::now(),
        };
        self.catalog
            .insert(&asset)
            .await
            .expect("Failed to insert asset");
        asset
    }

    /// Poll `/jobs/{id}` until the job is done or failed.
    pub async fn wait_for_job(&self, job_id: &str) -> Value {
        for _ in 0..200 {
            let body: Value = self.server.get(&format!("/jobs/{}", job_id)).await.json();
            let state = body["status"]["state"].as_str().unwrap_or_default().to_string();
            if state == "done" || state == "failed" {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish", job_id);
    }
}

/// Entries left directly under `dir` (0 when it does not exist).
pub fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|it| it.count()).unwrap_or(0)
}

/// Deterministic content so ranges can be checked byte for byte.
pub fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Body a scripted transcode writes for `stage`.
pub fn scripted_output(stage: Stage) -> Vec<u8> {
    stage.to_string().into_bytes()
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(ScriptedTranscoder::new()).await
}

/// Setup test app with a scripted transcoder, local storage and an in-memory catalog.
pub async fn setup_test_app_with(transcoder: ScriptedTranscoder) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage_path = temp_dir.path().join("storage");
    let scratch_path = temp_dir.path().join("scratch");

    let storage = Arc::new(
        LocalStorage::new(storage_path.clone())
            .await
            .expect("Failed to create local storage"),
    );
    let catalog = Arc::new(InMemoryCatalog::new());
    let transcoder = Arc::new(transcoder);

    let config = Config(Box::new(ReelstreamConfig {
        local_storage_path: storage_path,
        scratch_dir: scratch_path.clone(),
        max_video_size_bytes: 1024 * 1024,
        stream_chunk_size_bytes: 64 * 1024,
        ..Default::default()
    }));

    let state = services::initialize_services(
        &config,
        catalog.clone(),
        storage.clone(),
        transcoder.clone(),
    )
    .expect("Failed to initialize services");
    let app = routes::setup_routes(&config, state)
        .await
        .expect("Failed to setup routes");

    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        catalog,
        storage,
        transcoder,
        scratch_root: scratch_path,
        _temp_dir: temp_dir,
    }
}
