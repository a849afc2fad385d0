//! tunedex-sd library - Search & Discovery service
//!
//! Serves fuzzy search over chunk-loaded music catalogs, raw catalog
//! paging, and play-session tracking with live events.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

use tunedex_common::events::EventBus;

pub mod api;
pub mod catalog;
pub mod db;
pub mod search;
pub mod tracker;

use catalog::Catalog;
use tracker::TrackerRegistry;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Session-scoped catalog cache
    pub catalog: Arc<Catalog>,
    /// Per-session play trackers
    pub trackers: Arc<TrackerRegistry>,
    /// Play-history database pool
    pub db: SqlitePool,
    /// Application event bus
    pub bus: EventBus,
}

impl AppState {
    /// Create new application state
    pub fn new(
        catalog: Arc<Catalog>,
        trackers: Arc<TrackerRegistry>,
        db: SqlitePool,
        bus: EventBus,
    ) -> Self {
        Self {
            catalog,
            trackers,
            db,
            bus,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/api/search", get(api::search_catalog))
        .route("/api/catalog/:kind/index", get(api::catalog_index))
        .route("/api/catalog/:kind", get(api::catalog_range))
        .route("/api/playback/start", post(api::start_playback))
        .route("/api/playback/stop", post(api::stop_playback))
        .route("/api/playback/history", get(api::playback_history))
        .route("/api/events", get(api::event_stream))
        .merge(api::health_routes())
        // The webapp runs on a different origin during development
        .layer(CorsLayer::permissive())
        .with_state(state)
}
