//! Health check handlers and response types.

use crate::state::AppState;
use axum::{http::StatusCode, response::IntoResponse, Json};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Run an async check with timeout; returns "healthy", "timeout", or "{prefix}: {error}".
async fn run_check<F, E>(timeout: Duration, f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(serde::Serialize)]
pub(super) struct HealthCheckResponse {
    pub status: String,
    pub catalog: String,
    pub storage: String,
    pub transcode_queue: String,
    pub queued_jobs: usize,
}

/// Liveness probe - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe - the catalog answers.
pub async fn readiness_check(state: Arc<AppState>) -> impl IntoResponse {
    let catalog = run_check(TIMEOUT, state.catalog.ping(), "not_ready").await;
    let ready = catalog == "healthy";
    if !ready {
        tracing::error!(catalog = %catalog, "Catalog readiness check failed");
    }

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let status = if ready { "ready" } else { "not_ready" };

    (
        status_code,
        Json(serde_json::json!({ "status": status, "catalog": catalog })),
    )
}

/// Full health check (catalog, storage, transcode queue).
pub async fn health_check(state: Arc<AppState>) -> impl IntoResponse {
    let catalog = run_check(TIMEOUT, state.catalog.ping(), "unhealthy").await;

    let storage = state.storage.clone();
    let storage = run_check(
        TIMEOUT,
        async move {
            storage
                .exists("health-check-non-existent-key")
                .await
                .map(drop)
        },
        "unhealthy",
    )
    .await;

    let pool = &state.transcode_pool;
    let transcode_queue = if pool.is_closed() {
        "unhealthy: worker pool stopped".to_string()
    } else {
        "healthy".to_string()
    };

    let overall_healthy =
        catalog == "healthy" && storage == "healthy" && transcode_queue == "healthy";
    let response = HealthCheckResponse {
        status: if overall_healthy { "healthy" } else { "unhealthy" }.to_string(),
        catalog,
        storage,
        transcode_queue,
        queued_jobs: pool.queued(),
    };

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
