//! Server-Sent Events (SSE) utilities
//!
//! Bridges the [`EventBus`](crate::events::EventBus) onto an axum SSE
//! response so every service exposes the same `/api/events` behavior.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::events::EventBus;

/// Create an SSE stream of bus events for a new client connection
///
/// Each event is sent with its type tag as the SSE event name and the
/// full payload as JSON data, so browser clients can use
/// `addEventListener("Heartbeat", ...)` style filtering. Lagged
/// subscribers skip dropped events rather than disconnecting.
pub fn create_event_sse_stream(
    bus: &EventBus,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected ({} active)", bus.subscriber_count());

    let rx = bus.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => Event::default()
                .event(event.event_type())
                .json_data(&event)
                .ok()
                .map(Ok),
            Err(e) => {
                // BroadcastStream wraps RecvError, just log and continue
                warn!("SSE subscriber lagged: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TunedexEvent;
    use crate::models::CatalogKind;

    #[tokio::test]
    async fn test_bus_events_arrive_on_subscribed_stream() {
        let bus = EventBus::new(16);
        let rx = bus.subscribe();
        let mut stream = BroadcastStream::new(rx);

        bus.emit_lossy(TunedexEvent::CatalogLoaded {
            kind: CatalogKind::Genres,
            records: 7,
            timestamp: chrono::Utc::now(),
        });

        let event = stream.next().await.unwrap().unwrap();
        assert_eq!(event.event_type(), "CatalogLoaded");
    }
}
