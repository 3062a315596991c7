//! User-facing notices broadcast by the engine
//!
//! Failures never propagate to callers as errors; each operation
//! resolves to a boolean/option result and, where the user should hear
//! about it, a notice on the broadcast channel. The presentation layer
//! subscribes and renders these however it likes (toasts, banners).

use chartvote_common::db::models::SongId;
use serde::{Deserialize, Serialize};

/// Privileged mutation being attempted, for denial notices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    RemoveVotes,
    ResetVotes,
}

/// Notices emitted by engine operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VoteNotice {
    /// Vote accepted and counted
    VoteCounted { song_id: SongId },

    /// Duplicate attempt against the song this device already voted for
    AlreadyVotedThisSong { song_id: SongId },

    /// Attempt to vote for a second song; votes are immutable
    AlreadyVotedOtherSong { voted: SongId, attempted: SongId },

    /// Vote attempt failed at the store
    VoteFailed { song_id: SongId },

    /// Admin removed all votes for a song
    VotesRemoved { song_id: SongId },

    /// Single-song vote removal failed at the store
    VotesRemoveFailed { song_id: SongId },

    /// Admin reset the whole chart
    VotesReset,

    /// Chart reset failed at the store
    VotesResetFailed,

    /// Privileged mutation refused: caller is not an admin, or the
    /// authorization check itself failed
    AdminDenied { action: AdminAction },
}
