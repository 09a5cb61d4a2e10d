//! Tier P: the persistent, observability-purged fingerprint store used by
//! the event-EPG stream-matching path (an external collaborator; only the
//! storage contract lives here).
//!
//! Shares the Tier-S connection pool handle but writes through its own table
//! and its own transaction per purge sweep — it never shares a transaction
//! with the in-flight generation run.

use crate::error::{Result, TeamarrError};
use sqlx::SqlitePool;

pub struct TierPStore {
    pool: SqlitePool,
}

impl TierPStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stream_event_fingerprints (
                stream_name TEXT NOT NULL,
                event_fingerprint TEXT NOT NULL,
                last_seen_generation INTEGER NOT NULL,
                PRIMARY KEY (stream_name, event_fingerprint)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| TeamarrError::upstream_unavailable("tier_p_schema", e.to_string()))?;
        Ok(())
    }

    /// Records that `event_fingerprint` was matched to `stream_name` during
    /// `generation`. Idempotent: re-recording the same pair only bumps the
    /// last-seen generation.
    pub async fn record_seen(&self, stream_name: &str, event_fingerprint: &str, generation: u64) -> Result<()> {
        sqlx::query(
            "INSERT INTO stream_event_fingerprints (stream_name, event_fingerprint, last_seen_generation)
             VALUES (?, ?, ?)
             ON CONFLICT(stream_name, event_fingerprint) DO UPDATE SET last_seen_generation = excluded.last_seen_generation",
        )
        .bind(stream_name)
        .bind(event_fingerprint)
        .bind(generation as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| TeamarrError::upstream_unavailable("tier_p_record", e.to_string()))?;
        Ok(())
    }

    /// Purges fingerprints not seen within `keep_last_n_generations` of
    /// `current_generation`, in a single dedicated transaction.
    pub async fn purge_stale(&self, current_generation: u64, keep_last_n_generations: u64) -> Result<u64> {
        let floor = current_generation.saturating_sub(keep_last_n_generations);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| TeamarrError::upstream_unavailable("tier_p_purge", e.to_string()))?;

        let result = sqlx::query("DELETE FROM stream_event_fingerprints WHERE last_seen_generation < ?")
            .bind(floor as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| TeamarrError::upstream_unavailable("tier_p_purge", e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| TeamarrError::upstream_unavailable("tier_p_purge", e.to_string()))?;

        Ok(result.rows_affected())
    }
}
