//! Play-session tracking
//!
//! Each session owns a [`PlayTracker`], a two-state machine (idle or
//! tracking) with start/stop transitions. While tracking, a spawned tick
//! task accumulates listened seconds once per interval, persists the
//! running total, and emits a heartbeat event. All timer state lives in
//! the tracker that owns it; nothing global.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tunedex_common::events::{EventBus, TunedexEvent};
use tunedex_common::Result;

use crate::db;

/// The two states a play session can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerState {
    Idle,
    Tracking,
}

/// Everything owned while a session is tracking
struct ActivePlay {
    song_id: String,
    play_id: i64,
    seconds_played: Arc<AtomicU64>,
    tick_task: JoinHandle<()>,
}

impl Drop for ActivePlay {
    fn drop(&mut self) {
        self.tick_task.abort();
    }
}

/// State machine for one play session
pub struct PlayTracker {
    session_id: Uuid,
    db: SqlitePool,
    bus: EventBus,
    tick_interval: Duration,
    active: Mutex<Option<ActivePlay>>,
}

impl PlayTracker {
    fn new(session_id: Uuid, db: SqlitePool, bus: EventBus, tick_interval: Duration) -> Self {
        Self {
            session_id,
            db,
            bus,
            tick_interval,
            active: Mutex::new(None),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub async fn state(&self) -> TrackerState {
        if self.active.lock().await.is_some() {
            TrackerState::Tracking
        } else {
            TrackerState::Idle
        }
    }

    /// Transition idle -> tracking
    ///
    /// Starting while already tracking finalizes the previous song as
    /// not completed, then begins the new one; the session never runs
    /// two tick tasks.
    pub async fn start(&self, song_id: String) -> Result<()> {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            warn!(
                session_id = %self.session_id,
                song_id = %previous.song_id,
                "start while tracking, finalizing previous song"
            );
            self.finalize(previous, false).await?;
        }

        let started_at = Utc::now();
        let play_id = db::insert_play(&self.db, self.session_id, &song_id, started_at).await?;
        let seconds_played = Arc::new(AtomicU64::new(0));

        let tick_task = tokio::spawn(tick_loop(
            self.db.clone(),
            self.bus.clone(),
            self.session_id,
            song_id.clone(),
            play_id,
            seconds_played.clone(),
            self.tick_interval,
        ));

        *active = Some(ActivePlay {
            song_id: song_id.clone(),
            play_id,
            seconds_played,
            tick_task,
        });

        info!(session_id = %self.session_id, song_id = %song_id, "tracking started");
        self.bus.emit_lossy(TunedexEvent::TrackingStarted {
            session_id: self.session_id,
            song_id,
            timestamp: started_at,
        });
        Ok(())
    }

    /// Transition tracking -> idle, returning accumulated seconds
    ///
    /// Stopping while idle is a no-op that reports zero seconds.
    pub async fn stop(&self, completed: bool) -> Result<u64> {
        let mut active = self.active.lock().await;
        match active.take() {
            Some(play) => self.finalize(play, completed).await,
            None => {
                debug!(session_id = %self.session_id, "stop while idle ignored");
                Ok(0)
            }
        }
    }

    async fn finalize(&self, play: ActivePlay, completed: bool) -> Result<u64> {
        // Stop the clock before reading it so no tick lands after the
        // final accounting
        play.tick_task.abort();
        let seconds_played = play.seconds_played.load(Ordering::Relaxed);

        db::finalize_play(&self.db, play.play_id, seconds_played, completed).await?;

        info!(
            session_id = %self.session_id,
            song_id = %play.song_id,
            seconds_played,
            completed,
            "tracking stopped"
        );
        self.bus.emit_lossy(TunedexEvent::TrackingStopped {
            session_id: self.session_id,
            song_id: play.song_id.clone(),
            seconds_played,
            completed,
            timestamp: Utc::now(),
        });
        Ok(seconds_played)
    }
}

/// Periodic tick for one tracked play
///
/// Whole intervals only: a partial interval at stop time contributes
/// nothing, matching the heartbeat accounting.
async fn tick_loop(
    db: SqlitePool,
    bus: EventBus,
    session_id: Uuid,
    song_id: String,
    play_id: i64,
    seconds_played: Arc<AtomicU64>,
    tick_interval: Duration,
) {
    let mut tick = interval(tick_interval);
    // The first tick completes immediately; consume it so the first
    // heartbeat lands one full interval after start
    tick.tick().await;

    loop {
        tick.tick().await;

        let step = tick_interval.as_secs();
        let total = seconds_played.fetch_add(step, Ordering::Relaxed) + step;

        if let Err(e) = db::update_play_progress(&db, play_id, total).await {
            warn!(session_id = %session_id, error = %e, "failed to persist play progress");
        }
        bus.emit_lossy(TunedexEvent::Heartbeat {
            session_id,
            song_id: song_id.clone(),
            seconds_played: total,
            timestamp: Utc::now(),
        });
    }
}

/// All play trackers for this process, one per session
///
/// Trackers are retained once created, so the map grows with the number
/// of distinct session ids seen. Evicting on stop would turn a repeated
/// stop into an unknown-session error and forget the id a restart
/// reuses; an idle tracker holds no task and no row, only the map entry.
pub struct TrackerRegistry {
    db: SqlitePool,
    bus: EventBus,
    tick_interval: Duration,
    trackers: RwLock<HashMap<Uuid, Arc<PlayTracker>>>,
}

impl TrackerRegistry {
    pub fn new(db: SqlitePool, bus: EventBus, tick_interval: Duration) -> Self {
        Self {
            db,
            bus,
            tick_interval,
            trackers: RwLock::new(HashMap::new()),
        }
    }

    /// Start tracking, creating the session tracker on first use
    ///
    /// Returns the session id, freshly generated unless the caller
    /// supplied one.
    pub async fn start(&self, session_id: Option<Uuid>, song_id: String) -> Result<Uuid> {
        let session_id = session_id.unwrap_or_else(Uuid::new_v4);
        let tracker = {
            let mut trackers = self.trackers.write().await;
            trackers
                .entry(session_id)
                .or_insert_with(|| {
                    Arc::new(PlayTracker::new(
                        session_id,
                        self.db.clone(),
                        self.bus.clone(),
                        self.tick_interval,
                    ))
                })
                .clone()
        };

        tracker.start(song_id).await?;
        Ok(session_id)
    }

    /// Stop tracking for a session
    ///
    /// `None` when the session id has never been seen; otherwise the
    /// accumulated seconds (zero when the session was already idle).
    pub async fn stop(&self, session_id: Uuid, completed: bool) -> Result<Option<u64>> {
        let tracker = self.trackers.read().await.get(&session_id).cloned();
        match tracker {
            Some(tracker) => Ok(Some(tracker.stop(completed).await?)),
            None => Ok(None),
        }
    }

    /// Current state for a session, `None` when never seen
    pub async fn state(&self, session_id: Uuid) -> Option<TrackerState> {
        let tracker = self.trackers.read().await.get(&session_id).cloned();
        match tracker {
            Some(tracker) => Some(tracker.state().await),
            None => None,
        }
    }

    pub async fn session_count(&self) -> usize {
        self.trackers.read().await.len()
    }
}
