//! # Chartvote Engine
//!
//! The vote reconciliation core: enforces "at most one vote per device,
//! ever" between a local in-memory cache and the authoritative vote
//! store, and exposes the operations the presentation layer drives.
//!
//! - [`identity`] — stable per-installation device identifier
//! - [`store`] — authoritative vote store contract and SQLite implementation
//! - [`engine`] — the reconciliation state machine
//! - [`notice`] — user-facing notices broadcast by the engine

pub mod engine;
pub mod identity;
pub mod notice;
pub mod store;

pub use engine::{VoteCache, VoteEngine};
pub use identity::{get_or_create_device_id, DeviceId};
pub use notice::{AdminAction, VoteNotice};
pub use store::{InsertOutcome, SqliteVoteStore, VoteStore};
