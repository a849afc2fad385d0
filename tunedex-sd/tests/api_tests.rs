//! Integration tests for tunedex-sd API endpoints
//!
//! Tests cover:
//! - Health endpoint
//! - Fuzzy search (bucketing, thresholds, degraded catalog)
//! - Raw catalog index and range access
//! - Play tracking start/stop/history
//!
//! Each test runs against a real router with a tempdir-backed catalog
//! and an in-memory play-history database.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot` method
use uuid::Uuid;

use tunedex_common::events::EventBus;
use tunedex_sd::catalog::{Catalog, ChunkStore, FileDataSource};
use tunedex_sd::tracker::TrackerRegistry;
use tunedex_sd::{build_router, db, AppState};

/// Test helper: publish a chunked dataset under `root`
fn write_chunked(root: &Path, kind: &str, names: &[String], chunk_size: usize) {
    let dir = root.join(format!("{}-chunks", kind));
    std::fs::create_dir_all(&dir).unwrap();

    let total_chunks = names.len().div_ceil(chunk_size);
    std::fs::write(
        dir.join("index.json"),
        serde_json::to_vec(&json!({
            "totalChunks": total_chunks,
            "chunkSize": chunk_size,
        }))
        .unwrap(),
    )
    .unwrap();

    for (i, group) in names.chunks(chunk_size).enumerate() {
        let entries: Vec<_> = group
            .iter()
            .enumerate()
            .map(|(j, name)| {
                json!({
                    "id": format!("{}{}", kind.chars().next().unwrap(), i * chunk_size + j),
                    "name": name,
                })
            })
            .collect();
        std::fs::write(
            dir.join(format!("chunk_{}.json", i + 1)),
            serde_json::to_vec(&entries).unwrap(),
        )
        .unwrap();
    }
}

/// Test helper: seed the standard catalog fixtures
fn seed_catalog(root: &Path) {
    write_chunked(
        root,
        "artists",
        &[
            "The Beatles".to_string(),
            "Beatle".to_string(),
            "Kraftwerk".to_string(),
        ],
        2,
    );

    let songs: Vec<String> = (0..60).map(|i| format!("Song {}", i)).collect();
    write_chunked(root, "songs", &songs, 20);
}

/// Test helper: single-connection in-memory database with schema
async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("Should connect to in-memory database");
    db::create_schema(&pool).await.expect("Should create schema");
    pool
}

/// Test helper: build app state over a catalog folder
async fn setup_state(root: &Path) -> AppState {
    let pool = setup_test_db().await;
    let bus = EventBus::new(64);
    let store = ChunkStore::new(Arc::new(FileDataSource::new(root)));
    let catalog = Arc::new(Catalog::new(store, bus.clone()));
    let trackers = Arc::new(TrackerRegistry::new(
        pool.clone(),
        bus.clone(),
        Duration::from_secs(15),
    ));
    AppState::new(catalog, trackers, pool, bus)
}

/// Test helper: GET request
fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: POST request with JSON body
fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Health Endpoint
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(setup_state(dir.path()).await);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "tunedex-sd");
    assert!(body["version"].is_string());
}

// =============================================================================
// Search Endpoint
// =============================================================================

#[tokio::test]
async fn test_search_buckets_exact_and_partial() {
    let dir = tempfile::tempdir().unwrap();
    seed_catalog(dir.path());
    let app = build_router(setup_state(dir.path()).await);

    let response = app
        .oneshot(get("/api/search?kind=artists&q=the+beatles"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["kind"], "artists");
    assert_eq!(body["candidate_count"], 3);

    // "The Beatles" normalizes to exactly the query
    assert_eq!(body["exact"].as_array().unwrap().len(), 1);
    assert_eq!(body["exact"][0]["entry"]["displayName"], "The Beatles");
    assert_eq!(body["exact"][0]["score"], 0.0);

    // "Beatle" is one edit away; "Kraftwerk" is past the 0.4 default
    assert_eq!(body["partial"].as_array().unwrap().len(), 1);
    assert_eq!(body["partial"][0]["entry"]["displayName"], "Beatle");
    let score = body["partial"][0]["score"].as_f64().unwrap();
    assert!(score > 0.0 && score <= 0.4);
}

#[tokio::test]
async fn test_search_threshold_parameter_narrows_results() {
    let dir = tempfile::tempdir().unwrap();
    seed_catalog(dir.path());
    let app = build_router(setup_state(dir.path()).await);

    let response = app
        .oneshot(get("/api/search?kind=artists&q=the+beatles&threshold=0.05"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;

    assert_eq!(body["exact"].as_array().unwrap().len(), 1);
    assert_eq!(body["partial"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_search_unknown_kind_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(setup_state(dir.path()).await);

    let response = app
        .oneshot(get("/api/search?kind=albums&q=abbey"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("albums"));
}

#[tokio::test]
async fn test_search_blank_query_is_empty_ok() {
    let dir = tempfile::tempdir().unwrap();
    seed_catalog(dir.path());
    let app = build_router(setup_state(dir.path()).await);

    let response = app.oneshot(get("/api/search?kind=artists")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["exact"].as_array().unwrap().len(), 0);
    assert_eq!(body["partial"].as_array().unwrap().len(), 0);
    // Catalog still loaded; only the query was blank
    assert_eq!(body["candidate_count"], 3);
}

#[tokio::test]
async fn test_search_unavailable_catalog_degrades_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    // No fixtures at all
    let app = build_router(setup_state(dir.path()).await);

    let response = app
        .oneshot(get("/api/search?kind=styles&q=shoegaze"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["candidate_count"], 0);
    assert_eq!(body["exact"].as_array().unwrap().len(), 0);
    assert_eq!(body["partial"].as_array().unwrap().len(), 0);
}

// =============================================================================
// Catalog Endpoints
// =============================================================================

#[tokio::test]
async fn test_catalog_index_reports_geometry() {
    let dir = tempfile::tempdir().unwrap();
    seed_catalog(dir.path());
    let app = build_router(setup_state(dir.path()).await);

    let response = app.oneshot(get("/api/catalog/songs/index")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["totalChunks"], 3);
    assert_eq!(body["chunkSize"], 20);
}

#[tokio::test]
async fn test_catalog_index_missing_dataset_is_null() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(setup_state(dir.path()).await);

    let response = app.oneshot(get("/api/catalog/genres/index")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert!(body.is_null());
}

#[tokio::test]
async fn test_catalog_index_unknown_kind_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(setup_state(dir.path()).await);

    let response = app.oneshot(get("/api/catalog/albums/index")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_catalog_range_slices_across_chunks() {
    let dir = tempfile::tempdir().unwrap();
    seed_catalog(dir.path());
    let app = build_router(setup_state(dir.path()).await);

    let response = app
        .oneshot(get("/api/catalog/songs?start=25&end=45"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["count"], 20);
    let records = body["records"].as_array().unwrap();
    assert_eq!(records[0]["id"], "s25");
    assert_eq!(records[19]["id"], "s44");
}

#[tokio::test]
async fn test_catalog_range_missing_dataset_has_null_records() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(setup_state(dir.path()).await);

    let response = app
        .oneshot(get("/api/catalog/styles?start=0&end=10"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert!(body["records"].is_null());
    assert_eq!(body["count"], 0);
}

// =============================================================================
// Playback Endpoints
// =============================================================================

#[tokio::test]
async fn test_playback_start_stop_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(setup_state(dir.path()).await);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/playback/start",
            json!({"song_id": "s-1042"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["state"], "tracking");
    let session_id: Uuid = body["session_id"].as_str().unwrap().parse().unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/playback/stop",
            json!({"session_id": session_id, "completed": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["state"], "idle");
    assert_eq!(body["seconds_played"], 0);

    let response = app
        .oneshot(get("/api/playback/history"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["plays"][0]["song_id"], "s-1042");
    assert_eq!(body["plays"][0]["session_id"], session_id.to_string());
    assert_eq!(body["plays"][0]["completed"], true);
}

#[tokio::test]
async fn test_playback_stop_unknown_session_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(setup_state(dir.path()).await);

    let response = app
        .oneshot(post_json(
            "/api/playback/stop",
            json!({"session_id": Uuid::new_v4()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_playback_start_requires_song_id() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(setup_state(dir.path()).await);

    let response = app
        .oneshot(post_json("/api/playback/start", json!({"song_id": "  "})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_playback_history_respects_limit() {
    let dir = tempfile::tempdir().unwrap();
    let state = setup_state(dir.path()).await;
    let app = build_router(state.clone());

    for i in 0..4 {
        db::insert_play(
            &state.db,
            Uuid::new_v4(),
            &format!("s-{}", i),
            chrono::Utc::now(),
        )
        .await
        .unwrap();
    }

    let response = app
        .oneshot(get("/api/playback/history?limit=2"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["count"], 2);
    // Newest first
    assert_eq!(body["plays"][0]["song_id"], "s-3");
}
