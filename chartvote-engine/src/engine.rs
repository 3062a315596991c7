//! Vote reconciliation engine
//!
//! Mediates between the local in-memory vote cache and the
//! authoritative store. The cache is an optimization: it suppresses
//! redundant remote traffic and gives instant duplicate feedback, but
//! the one-vote-per-device invariant is enforced by the store's
//! uniqueness constraint, never by the cache check. Two interleaved
//! operations may both pass the cache check; the store settles it.

use std::sync::Arc;
use std::time::Duration;

use chartvote_common::config::EngineConfig;
use chartvote_common::db::models::{Song, SongId};
use chartvote_common::Result;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::identity::DeviceId;
use crate::notice::{AdminAction, VoteNotice};
use crate::store::{InsertOutcome, VoteStore};

/// Local knowledge of this device's vote
///
/// Distinguishes "never checked" from "checked, no vote found": an
/// `Unknown` cache sends the next lookup to the store (subject to the
/// throttle), while `KnownNone` lets a cast skip the pre-insert lookup
/// entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteCache {
    /// Not yet reconciled with the store
    Unknown,
    /// Reconciled; the store holds no vote for this device
    KnownNone,
    /// Reconciled; this device voted for the given song
    KnownVote(SongId),
}

/// The reconciliation engine
///
/// One instance per client; owns the cache and throttle state outright
/// so concurrent callers can be tested in isolation. No lock is held
/// across a store call.
pub struct VoteEngine {
    store: Arc<dyn VoteStore>,
    device_id: DeviceId,
    fetch_throttle: Duration,
    cache: RwLock<VoteCache>,
    last_fetch: Mutex<Option<Instant>>,
    notice_tx: broadcast::Sender<VoteNotice>,
}

impl VoteEngine {
    pub fn new(store: Arc<dyn VoteStore>, device_id: DeviceId, config: EngineConfig) -> Self {
        let (notice_tx, _) = broadcast::channel(32);
        Self {
            store,
            device_id,
            fetch_throttle: config.fetch_throttle,
            cache: RwLock::new(VoteCache::Unknown),
            last_fetch: Mutex::new(None),
            notice_tx,
        }
    }

    /// Subscribe to user-facing notices
    pub fn subscribe(&self) -> broadcast::Receiver<VoteNotice> {
        self.notice_tx.subscribe()
    }

    /// The identity this engine votes under
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    fn notify(&self, notice: VoteNotice) {
        // Ignore send errors (no subscribers is OK)
        let _ = self.notice_tx.send(notice);
    }

    fn notify_duplicate(&self, voted: SongId, attempted: SongId) {
        if voted == attempted {
            self.notify(VoteNotice::AlreadyVotedThisSong { song_id: voted });
        } else {
            self.notify(VoteNotice::AlreadyVotedOtherSong { voted, attempted });
        }
    }

    /// What, if anything, has this device voted for
    ///
    /// A known vote is returned from cache without remote traffic;
    /// votes are immutable, so a populated cache cannot go stale in a
    /// way that matters here. While the cache is unpopulated, lookups
    /// are throttled so a render loop re-querying every frame issues at
    /// most one store call per interval. Store failures are logged and
    /// reported as `None` ("unknown", not "known absent").
    pub async fn get_user_voted_song(&self) -> Option<SongId> {
        if let VoteCache::KnownVote(song_id) = *self.cache.read().await {
            return Some(song_id);
        }

        {
            let mut last_fetch = self.last_fetch.lock().await;
            if let Some(at) = *last_fetch {
                if at.elapsed() < self.fetch_throttle {
                    debug!("Skipping vote lookup: within throttle interval");
                    return None;
                }
            }
            // Stamp the attempt, not the success: a failing store must
            // not be hammered by every re-render either
            *last_fetch = Some(Instant::now());
        }

        match self.store.lookup_vote(&self.device_id).await {
            Ok(Some(record)) => {
                *self.cache.write().await = VoteCache::KnownVote(record.song_id);
                Some(record.song_id)
            }
            Ok(None) => {
                *self.cache.write().await = VoteCache::KnownNone;
                None
            }
            Err(e) => {
                // Cache stays Unknown; the next post-throttle call retries
                warn!("Vote lookup failed: {}", e);
                None
            }
        }
    }

    /// Register a vote for `song_id`, enforcing one vote per device
    ///
    /// Returns `true` only when a new vote was accepted by the store.
    /// Duplicate attempts (whether detected in cache, discovered by
    /// lookup, or rejected by the store's uniqueness constraint) and
    /// store failures all return `false`, with the distinction carried
    /// on the notice channel.
    pub async fn upvote_song(&self, song_id: SongId) -> bool {
        // Copy the cache state out so no lock is held across the
        // store calls below
        let cached = *self.cache.read().await;

        // Fast path: a device that already knows its own vote never
        // issues a duplicate insert
        match cached {
            VoteCache::KnownVote(voted) => {
                self.notify_duplicate(voted, song_id);
                return false;
            }
            VoteCache::KnownNone => {
                // Reconciled and absent: the pre-insert lookup would
                // find nothing, go straight to the insert
            }
            VoteCache::Unknown => {
                // Slow path: discover any existing vote lazily
                match self.store.lookup_vote(&self.device_id).await {
                    Ok(Some(record)) => {
                        *self.cache.write().await = VoteCache::KnownVote(record.song_id);
                        self.notify_duplicate(record.song_id, song_id);
                        return false;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Pre-vote lookup failed: {}", e);
                        self.notify(VoteNotice::VoteFailed { song_id });
                        return false;
                    }
                }
            }
        }

        match self.store.insert_vote(&self.device_id, song_id).await {
            Ok(InsertOutcome::Inserted) => {
                *self.cache.write().await = VoteCache::KnownVote(song_id);
                info!("Vote counted for song {}", song_id);
                self.notify(VoteNotice::VoteCounted { song_id });
                true
            }
            Ok(InsertOutcome::DuplicateDevice) => {
                // A near-simultaneous cast from this device won the
                // race past our cache check. Learn the winner so the
                // cache reflects the authoritative record.
                match self.store.lookup_vote(&self.device_id).await {
                    Ok(Some(record)) => {
                        *self.cache.write().await = VoteCache::KnownVote(record.song_id);
                        self.notify_duplicate(record.song_id, song_id);
                    }
                    _ => {
                        warn!("Duplicate vote rejected but winner could not be read");
                        self.notify(VoteNotice::VoteFailed { song_id });
                    }
                }
                false
            }
            Err(e) => {
                warn!("Vote insert failed for song {}: {}", song_id, e);
                self.notify(VoteNotice::VoteFailed { song_id });
                false
            }
        }
    }

    /// Admin: remove all votes for one song
    ///
    /// The admin flag is re-checked against the store immediately
    /// before the mutation; a cached flag is never trusted. If this
    /// device's own vote was for the removed song, the cache drops to
    /// `KnownNone` and the device may vote again.
    pub async fn remove_vote_for_song(&self, admin_id: Uuid, song_id: SongId) {
        if !self.verify_admin(admin_id, AdminAction::RemoveVotes).await {
            return;
        }

        match self.store.delete_votes_for_song(song_id).await {
            Ok(()) => {
                let mut cache = self.cache.write().await;
                if *cache == VoteCache::KnownVote(song_id) {
                    *cache = VoteCache::KnownNone;
                }
                drop(cache);
                info!("Removed all votes for song {}", song_id);
                self.notify(VoteNotice::VotesRemoved { song_id });
            }
            Err(e) => {
                error!("Failed to remove votes for song {}: {}", song_id, e);
                self.notify(VoteNotice::VotesRemoveFailed { song_id });
            }
        }
    }

    /// Admin: wipe every vote and zero every counter
    ///
    /// Issued to the store as one all-or-nothing mutation, so a failure
    /// cannot leave votes deleted with counters still standing.
    pub async fn reset_votes(&self, admin_id: Uuid) {
        if !self.verify_admin(admin_id, AdminAction::ResetVotes).await {
            return;
        }

        match self.store.reset_all(chartvote_common::time::now()).await {
            Ok(()) => {
                *self.cache.write().await = VoteCache::KnownNone;
                info!("All votes reset");
                self.notify(VoteNotice::VotesReset);
            }
            Err(e) => {
                error!("Failed to reset votes: {}", e);
                self.notify(VoteNotice::VotesResetFailed);
            }
        }
    }

    /// Chart read for the presentation layer, most-voted first
    pub async fn ranked_songs(&self) -> Result<Vec<Song>> {
        self.store.list_songs().await
    }

    async fn verify_admin(&self, user_id: Uuid, action: AdminAction) -> bool {
        match self.store.check_admin(user_id).await {
            Ok(true) => true,
            Ok(false) => {
                warn!("Privileged operation {:?} denied for {}", action, user_id);
                self.notify(VoteNotice::AdminDenied { action });
                false
            }
            Err(e) => {
                // An unverifiable caller is treated as unauthorized
                error!("Admin check failed for {}: {}", user_id, e);
                self.notify(VoteNotice::AdminDenied { action });
                false
            }
        }
    }
}
