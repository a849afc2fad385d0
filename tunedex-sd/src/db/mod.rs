//! Play-history persistence
//!
//! One table, append-mostly: a row per play session start, updated as
//! heartbeats accumulate and finalized on stop. Timestamps are stored
//! as RFC 3339 text.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use tunedex_common::Result;

/// Open the play-history database, creating file and schema if missing
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePool::connect(&db_url).await?;
    create_schema(&pool).await?;
    info!("Play history database ready at {}", db_path.display());
    Ok(pool)
}

/// Create tables when absent; runs on every startup
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS play_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL,
            song_id TEXT NOT NULL,
            started_at TEXT NOT NULL,
            seconds_played INTEGER NOT NULL DEFAULT 0,
            completed INTEGER NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_play_history_session ON play_history(session_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// One play, in progress or finished
#[derive(Debug, Clone, Serialize)]
pub struct PlayRecord {
    pub session_id: String,
    pub song_id: String,
    pub started_at: String,
    pub seconds_played: i64,
    pub completed: bool,
}

/// Insert a new play row, returning its row id
pub async fn insert_play(
    pool: &SqlitePool,
    session_id: Uuid,
    song_id: &str,
    started_at: DateTime<Utc>,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO play_history (session_id, song_id, started_at) VALUES (?, ?, ?)",
    )
    .bind(session_id.to_string())
    .bind(song_id)
    .bind(started_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Update accumulated seconds for an active play
pub async fn update_play_progress(
    pool: &SqlitePool,
    play_id: i64,
    seconds_played: u64,
) -> Result<()> {
    sqlx::query("UPDATE play_history SET seconds_played = ? WHERE id = ?")
        .bind(seconds_played as i64)
        .bind(play_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Record the final accounting for a play
pub async fn finalize_play(
    pool: &SqlitePool,
    play_id: i64,
    seconds_played: u64,
    completed: bool,
) -> Result<()> {
    sqlx::query("UPDATE play_history SET seconds_played = ?, completed = ? WHERE id = ?")
        .bind(seconds_played as i64)
        .bind(completed)
        .bind(play_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Most recent plays, newest first
pub async fn recent_history(pool: &SqlitePool, limit: i64) -> Result<Vec<PlayRecord>> {
    let rows = sqlx::query_as::<_, (String, String, String, i64, i64)>(
        "SELECT session_id, song_id, started_at, seconds_played, completed
         FROM play_history
         ORDER BY id DESC
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(session_id, song_id, started_at, seconds_played, completed)| PlayRecord {
                session_id,
                song_id,
                started_at,
                seconds_played,
                completed: completed != 0,
            },
        )
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    /// Single-connection pool so every query sees the same :memory: db
    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        create_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_insert_progress_finalize_round_trip() {
        let pool = setup_test_db().await;
        let session = Uuid::new_v4();

        let play_id = insert_play(&pool, session, "s-1042", Utc::now()).await.unwrap();
        update_play_progress(&pool, play_id, 15).await.unwrap();
        update_play_progress(&pool, play_id, 30).await.unwrap();
        finalize_play(&pool, play_id, 42, true).await.unwrap();

        let history = recent_history(&pool, 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].session_id, session.to_string());
        assert_eq!(history[0].song_id, "s-1042");
        assert_eq!(history[0].seconds_played, 42);
        assert!(history[0].completed);
    }

    #[tokio::test]
    async fn test_recent_history_is_newest_first_and_limited() {
        let pool = setup_test_db().await;
        let session = Uuid::new_v4();

        for i in 0..5 {
            insert_play(&pool, session, &format!("s-{}", i), Utc::now())
                .await
                .unwrap();
        }

        let history = recent_history(&pool, 3).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].song_id, "s-4");
        assert_eq!(history[2].song_id, "s-2");
    }

    #[tokio::test]
    async fn test_schema_creation_is_idempotent() {
        let pool = setup_test_db().await;
        create_schema(&pool).await.unwrap();

        let session = Uuid::new_v4();
        insert_play(&pool, session, "s-1", Utc::now()).await.unwrap();
        // Re-running the schema must not clobber existing rows
        create_schema(&pool).await.unwrap();
        assert_eq!(recent_history(&pool, 10).await.unwrap().len(), 1);
    }
}
