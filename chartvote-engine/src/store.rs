//! Authoritative vote store
//!
//! The engine consumes the store through the [`VoteStore`] trait; the
//! store, not the engine, is responsible for the per-device uniqueness
//! invariant and for keeping per-song counters in step with vote
//! inserts. [`SqliteVoteStore`] is the production implementation.

use async_trait::async_trait;
use chartvote_common::db::models::{Song, SongId, VoteRecord};
use chartvote_common::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::identity::DeviceId;

/// Outcome of a vote insert attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Vote accepted; the song's counter was incremented in the same
    /// transaction
    Inserted,
    /// The store already holds a vote for this device (a concurrent
    /// cast from the same device won the race)
    DuplicateDevice,
}

/// Contract for the authoritative vote store
///
/// Guarantees required of implementations:
/// - at most one vote record per device (uniqueness constraint)
/// - `insert_vote` increments the song counter atomically with the
///   accepted insert
/// - `delete_votes_for_song` and `reset_all` leave counters consistent
///   with surviving vote records (single transaction each)
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Return this device's vote record, if any (at most one)
    async fn lookup_vote(&self, device_id: &DeviceId) -> Result<Option<VoteRecord>>;

    /// Insert a vote and bump the song counter in one transaction
    async fn insert_vote(&self, device_id: &DeviceId, song_id: SongId) -> Result<InsertOutcome>;

    /// Delete all votes for one song and zero its counter
    async fn delete_votes_for_song(&self, song_id: SongId) -> Result<()>;

    /// Delete all votes and zero every counter, stamping `reset_at`,
    /// as a single all-or-nothing mutation
    async fn reset_all(&self, reset_at: DateTime<Utc>) -> Result<()>;

    /// Fresh authorization check; called immediately before every
    /// privileged mutation, never cached
    async fn check_admin(&self, user_id: Uuid) -> Result<bool>;

    /// Chart read: all songs, most-voted first
    async fn list_songs(&self) -> Result<Vec<Song>>;
}

/// SQLite-backed vote store
///
/// The UNIQUE constraint on song_votes.device_id is the real defense
/// against double voting; everything the engine does client-side is an
/// optimization layered on top of it.
pub struct SqliteVoteStore {
    pool: SqlitePool,
}

impl SqliteVoteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteStore for SqliteVoteStore {
    async fn lookup_vote(&self, device_id: &DeviceId) -> Result<Option<VoteRecord>> {
        let row: Option<(String, i64, DateTime<Utc>)> = sqlx::query_as(
            "SELECT device_id, song_id, created_at FROM song_votes WHERE device_id = ?",
        )
        .bind(device_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(device_id, song_id, created_at)| VoteRecord {
            device_id,
            song_id,
            created_at,
        }))
    }

    async fn insert_vote(&self, device_id: &DeviceId, song_id: SongId) -> Result<InsertOutcome> {
        let mut tx = self.pool.begin().await?;
        let now = chartvote_common::time::now();

        let insert = sqlx::query(
            "INSERT INTO song_votes (device_id, song_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(device_id.as_str())
        .bind(song_id)
        .bind(now)
        .execute(&mut *tx)
        .await;

        match insert {
            Ok(_) => {}
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
                tx.rollback().await?;
                return Ok(InsertOutcome::DuplicateDevice);
            }
            Err(e) => return Err(e.into()),
        }

        let updated = sqlx::query("UPDATE songs SET votes = votes + 1, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(song_id)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(Error::NotFound(format!("song {}", song_id)));
        }

        tx.commit().await?;
        Ok(InsertOutcome::Inserted)
    }

    async fn delete_votes_for_song(&self, song_id: SongId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM song_votes WHERE song_id = ?")
            .bind(song_id)
            .execute(&mut *tx)
            .await?;

        // All votes for the song are gone, so its correct counter is zero
        sqlx::query("UPDATE songs SET votes = 0, updated_at = ? WHERE id = ?")
            .bind(chartvote_common::time::now())
            .bind(song_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn reset_all(&self, reset_at: DateTime<Utc>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM song_votes").execute(&mut *tx).await?;

        sqlx::query("UPDATE songs SET votes = 0, updated_at = ?")
            .bind(reset_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn check_admin(&self, user_id: Uuid) -> Result<bool> {
        let found: Option<(String,)> =
            sqlx::query_as("SELECT user_id FROM admins WHERE user_id = ?")
                .bind(user_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        Ok(found.is_some())
    }

    async fn list_songs(&self) -> Result<Vec<Song>> {
        let rows: Vec<(i64, String, String, Option<String>, Option<String>, i64)> =
            sqlx::query_as(
                "SELECT id, title, artist, cover_url, song_url, votes \
                 FROM songs ORDER BY votes DESC, id ASC",
            )
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, title, artist, cover_url, song_url, votes)| Song {
                id,
                title,
                artist,
                cover_url,
                song_url,
                votes,
            })
            .collect())
    }
}
