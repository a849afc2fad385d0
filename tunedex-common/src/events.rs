//! Event types and distribution bus shared across tunedex services
//!
//! Events are serialized with a `"type"` tag so SSE clients can filter
//! without inspecting payload fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::CatalogKind;

/// Application-wide events emitted by tunedex services
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum TunedexEvent {
    /// A play session transitioned from idle to tracking
    TrackingStarted {
        session_id: Uuid,
        song_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Periodic progress report for an active play session
    ///
    /// Emitted once per tick interval while a session is tracking.
    Heartbeat {
        session_id: Uuid,
        song_id: String,
        seconds_played: u64,
        timestamp: DateTime<Utc>,
    },

    /// A play session transitioned from tracking back to idle
    TrackingStopped {
        session_id: Uuid,
        song_id: String,
        seconds_played: u64,
        completed: bool,
        timestamp: DateTime<Utc>,
    },

    /// A catalog dataset finished loading into the in-memory session cache
    CatalogLoaded {
        kind: CatalogKind,
        records: usize,
        timestamp: DateTime<Utc>,
    },
}

impl TunedexEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            TunedexEvent::TrackingStarted { .. } => "TrackingStarted",
            TunedexEvent::Heartbeat { .. } => "Heartbeat",
            TunedexEvent::TrackingStopped { .. } => "TrackingStopped",
            TunedexEvent::CatalogLoaded { .. } => "CatalogLoaded",
        }
    }
}

/// Central event distribution bus
///
/// Wraps tokio::broadcast, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use tunedex_common::events::{EventBus, TunedexEvent};
/// use uuid::Uuid;
///
/// let bus = EventBus::new(100);
/// let _rx = bus.subscribe();
///
/// bus.emit_lossy(TunedexEvent::TrackingStarted {
///     session_id: Uuid::new_v4(),
///     song_id: "s-1042".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TunedexEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered before old events are
    /// dropped for lagging subscribers.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<TunedexEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: TunedexEvent,
    ) -> Result<usize, broadcast::error::SendError<TunedexEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Used for periodic events (heartbeats, catalog loads) where it is
    /// acceptable for nobody to be watching.
    pub fn emit_lossy(&self, event: TunedexEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
