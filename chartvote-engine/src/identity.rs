//! Device identity provider
//!
//! Produces a stable, persisted, pseudo-anonymous identifier for this
//! installation. The identifier is a UUIDv4 written to a `device_id`
//! file under the data folder on first use and returned unchanged on
//! every later call while that file survives.

use chartvote_common::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// Opaque per-installation identifier
///
/// Exposed by value; the engine holds a copy and never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for DeviceId {
    fn from(id: Uuid) -> Self {
        DeviceId(id.to_string())
    }
}

/// Get the persisted device identifier, generating it on first use
///
/// A corrupt identity file (not a UUID) is treated the same as a
/// missing one and replaced. On storage failure the error propagates;
/// callers must not construct an engine without an identity, which
/// leaves voting disabled for the session.
pub fn get_or_create_device_id(data_dir: &Path) -> Result<DeviceId> {
    let path = data_dir.join("device_id");

    if let Ok(contents) = std::fs::read_to_string(&path) {
        let trimmed = contents.trim();
        if let Ok(id) = Uuid::parse_str(trimmed) {
            return Ok(DeviceId(id.to_string()));
        }
        warn!("Ignoring malformed device_id file: {}", path.display());
    }

    let id = Uuid::new_v4();
    std::fs::create_dir_all(data_dir)?;
    std::fs::write(&path, id.to_string())?;
    info!("Generated new device identity: {}", id);

    Ok(DeviceId(id.to_string()))
}
