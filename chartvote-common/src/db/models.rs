//! Database row models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Song identifier as stored in the songs table
pub type SongId = i64;

/// A song entry on the chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub cover_url: Option<String>,
    pub song_url: Option<String>,
    /// Per-song vote counter, maintained transactionally with vote inserts
    pub votes: i64,
}

/// An authoritative (device, song) vote pairing
///
/// At most one record exists per device, enforced by a uniqueness
/// constraint on device_id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRecord {
    pub device_id: String,
    pub song_id: SongId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}
