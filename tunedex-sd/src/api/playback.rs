//! Play-tracking endpoints

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, PlayRecord};
use crate::tracker::TrackerState;
use crate::AppState;

use super::ApiError;

/// Request body for POST /api/playback/start
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    /// Song being played
    pub song_id: String,

    /// Reuse an existing session instead of creating one
    pub session_id: Option<Uuid>,
}

/// Response for a started session
#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub session_id: Uuid,
    pub state: TrackerState,
}

/// POST /api/playback/start
///
/// Starts tracking. With a `session_id` that is already tracking, the
/// previous song is finalized as not completed and tracking restarts.
pub async fn start_playback(
    State(state): State<AppState>,
    Json(request): Json<StartRequest>,
) -> Result<Json<StartResponse>, ApiError> {
    if request.song_id.trim().is_empty() {
        return Err(ApiError::InvalidRequest(
            "song_id must not be empty".to_string(),
        ));
    }

    let session_id = state
        .trackers
        .start(request.session_id, request.song_id)
        .await
        .map_err(|e| ApiError::Database(e.to_string()))?;

    Ok(Json(StartResponse {
        session_id,
        state: TrackerState::Tracking,
    }))
}

/// Request body for POST /api/playback/stop
#[derive(Debug, Deserialize)]
pub struct StopRequest {
    pub session_id: Uuid,

    /// True when the song played to its natural end
    #[serde(default)]
    pub completed: bool,
}

/// Response for a stopped session
#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub state: TrackerState,
    pub seconds_played: u64,
}

/// POST /api/playback/stop
///
/// Stopping an idle session is a no-op reporting zero seconds; a session
/// id that was never started is 404.
pub async fn stop_playback(
    State(state): State<AppState>,
    Json(request): Json<StopRequest>,
) -> Result<Json<StopResponse>, ApiError> {
    let seconds_played = state
        .trackers
        .stop(request.session_id, request.completed)
        .await
        .map_err(|e| ApiError::Database(e.to_string()))?
        .ok_or(ApiError::UnknownSession(request.session_id))?;

    Ok(Json(StopResponse {
        state: TrackerState::Idle,
        seconds_played,
    }))
}

/// Query parameters for play history
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// Play history response, newest first
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub count: usize,
    pub plays: Vec<PlayRecord>,
}

/// GET /api/playback/history?limit=50
pub async fn playback_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = params.limit.clamp(1, 500);
    let plays = db::recent_history(&state.db, limit)
        .await
        .map_err(|e| ApiError::Database(e.to_string()))?;

    Ok(Json(HistoryResponse {
        count: plays.len(),
        plays,
    }))
}
