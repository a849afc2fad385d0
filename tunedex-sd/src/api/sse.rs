//! Server-Sent Events endpoint

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::stream::Stream;

use crate::AppState;

/// GET /api/events
///
/// Streams tracking transitions, heartbeats, and catalog load events as
/// they happen.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tunedex_common::sse::create_event_sse_stream(&state.bus)
}
