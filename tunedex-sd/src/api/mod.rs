//! HTTP API handlers for tunedex-sd

pub mod catalog;
pub mod health;
pub mod playback;
pub mod search;
pub mod sse;

pub use catalog::{catalog_index, catalog_range};
pub use health::health_routes;
pub use playback::{playback_history, start_playback, stop_playback};
pub use search::search_catalog;
pub use sse::event_stream;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use tunedex_common::models::CatalogKind;

/// API errors
#[derive(Debug)]
pub enum ApiError {
    InvalidKind(String),
    InvalidRequest(String),
    UnknownSession(Uuid),
    Database(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidKind(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::UnknownSession(id) => {
                (StatusCode::NOT_FOUND, format!("Unknown session: {}", id))
            }
            ApiError::Database(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Database error: {}", msg))
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Parse a catalog kind from a path or query segment
pub(crate) fn parse_kind(raw: &str) -> Result<CatalogKind, ApiError> {
    raw.parse::<CatalogKind>()
        .map_err(|e| ApiError::InvalidKind(e.to_string()))
}
