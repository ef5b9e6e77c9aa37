//! Playback integration tests: full responses, byte ranges and lookups.
//!
//! Run with: `cargo test -p reelstream-api --test streaming_test`

mod helpers;

use axum::http::{header, StatusCode};
use helpers::{sample_bytes, setup_test_app};

#[tokio::test]
async fn test_full_rendition_without_range() {
    let app = setup_test_app().await;
    let content = sample_bytes(300_000);
    app.seed_asset("movie", &content).await;

    let response = app.client().get("/asset/movie/360").await;

    response.assert_status(StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), "video/mp4");
    assert_eq!(response.header(header::ACCEPT_RANGES), "bytes");
    assert_eq!(response.header(header::CONTENT_LENGTH), "300000");
    assert!(response.headers().get(header::CONTENT_RANGE).is_none());
    assert_eq!(response.as_bytes().as_ref(), content.as_slice());
}

#[tokio::test]
async fn test_closed_range_returns_partial_content() {
    let app = setup_test_app().await;
    let content = sample_bytes(5000);
    app.seed_asset("movie", &content).await;

    let response = app
        .client()
        .get("/asset/movie/1080")
        .add_header(header::RANGE, "bytes=0-999")
        .await;

    response.assert_status(StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.header(header::CONTENT_RANGE), "bytes 0-999/5000");
    assert_eq!(response.header(header::CONTENT_LENGTH), "1000");
    assert_eq!(response.as_bytes().as_ref(), &content[..1000]);
}

#[tokio::test]
async fn test_open_ended_range_streams_to_end() {
    let app = setup_test_app().await;
    let content = sample_bytes(1000);
    app.seed_asset("movie", &content).await;

    let response = app
        .client()
        .get("/asset/movie/360p")
        .add_header(header::RANGE, "bytes=500-")
        .await;

    response.assert_status(StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.header(header::CONTENT_RANGE), "bytes 500-999/1000");
    assert_eq!(response.as_bytes().as_ref(), &content[500..]);
}

#[tokio::test]
async fn test_range_past_end_is_not_satisfiable() {
    let app = setup_test_app().await;
    app.seed_asset("movie", &sample_bytes(1000)).await;

    for range in ["bytes=2000-3000", "bytes=-500", "bytes=0-10,20-30", "pages=1-2"] {
        let response = app
            .client()
            .get("/asset/movie/360")
            .add_header(header::RANGE, range)
            .await;

        response.assert_status(StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.header(header::CONTENT_RANGE), "bytes */1000");
    }
}

#[tokio::test]
async fn test_empty_rendition_is_served_whole() {
    let app = setup_test_app().await;
    app.seed_asset("silent", &[]).await;

    let response = app
        .client()
        .get("/asset/silent/360")
        .add_header(header::RANGE, "bytes=0-99")
        .await;

    response.assert_status(StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_LENGTH), "0");
    assert!(response.as_bytes().is_empty());
}

#[tokio::test]
async fn test_unknown_asset_or_resolution_is_not_found() {
    let app = setup_test_app().await;
    app.seed_asset("movie", &sample_bytes(10)).await;

    app.client()
        .get("/asset/missing/360")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.client()
        .get("/asset/movie/720")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.client()
        .get("/asset/thumbnail/missing")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_thumbnail_supports_ranges() {
    let app = setup_test_app().await;
    app.seed_asset("movie", &sample_bytes(10)).await;

    let response = app.client().get("/asset/thumbnail/movie").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), "image/png");
    assert_eq!(response.as_bytes().as_ref(), b"\x89PNG thumbnail");

    let response = app
        .client()
        .get("/asset/thumbnail/movie")
        .add_header(header::RANGE, "bytes=0-3")
        .await;
    response.assert_status(StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.as_bytes().as_ref(), b"\x89PNG");
}

#[tokio::test]
async fn test_asset_metadata() {
    let app = setup_test_app().await;
    let asset = app.seed_asset("movie", &sample_bytes(10)).await;

    let response = app.client().get("/asset/movie").await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], asset.id.to_string());
    assert_eq!(body["status"], "ready");
    assert_eq!(body["resolutions"], serde_json::json!(["360", "1080"]));
    assert_eq!(body["has_thumbnail"], true);
}

#[tokio::test]
async fn test_concurrent_overlapping_ranges() {
    let app = setup_test_app().await;
    let content = sample_bytes(200_000);
    app.seed_asset("movie", &content).await;

    let requests = (0..8u64).map(|i| {
        let start = i * 10_000;
        let end = start + 49_999;
        let client = app.client();
        async move {
            let response = client
                .get("/asset/movie/1080")
                .add_header(header::RANGE, format!("bytes={}-{}", start, end))
                .await;
            (start as usize, end as usize, response)
        }
    });

    for (start, end, response) in futures::future::join_all(requests).await {
        response.assert_status(StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.as_bytes().as_ref(), &content[start..=end]);
    }
}

#[tokio::test]
async fn test_liveness_and_health() {
    let app = setup_test_app().await;

    let response = app.client().get("/live").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json::<serde_json::Value>()["status"], "alive");

    app.client().get("/ready").await.assert_status(StatusCode::OK);

    let response = app.client().get("/health").await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["catalog"], "healthy");
    assert_eq!(body["storage"], "healthy");
}
