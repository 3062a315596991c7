//! Configuration loading and data folder resolution

use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Engine tuning knobs, loadable from the settings table
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum interval between remote vote lookups while the local
    /// cache has not been populated with a known vote
    pub fetch_throttle: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_throttle: Duration::from_secs(120),
        }
    }
}

/// Data folder resolution priority order:
/// 1. Explicit argument (highest priority)
/// 2. CHARTVOTE_DATA environment variable
/// 3. TOML config file (`data_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(explicit: Option<&str>) -> Result<PathBuf> {
    // Priority 1: Explicit argument
    if let Some(path) = explicit {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var("CHARTVOTE_DATA") {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(data_folder) = config.get("data_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(data_folder));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(get_default_data_folder())
}

/// Get configuration file path for the platform
fn find_config_file() -> Result<PathBuf> {
    let config_path = if cfg!(target_os = "linux") {
        // Try ~/.config/chartvote/config.toml first, then /etc/chartvote/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("chartvote").join("config.toml"));
        let system_config = PathBuf::from("/etc/chartvote/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    } else {
        dirs::config_dir()
            .map(|d| d.join("chartvote").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?
    };

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {:?}",
            config_path
        )))
    }
}

/// Get OS-dependent default data folder path
fn get_default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/chartvote (or /var/lib/chartvote for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("chartvote"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/chartvote"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/chartvote
        dirs::data_dir()
            .map(|d| d.join("chartvote"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/chartvote"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\chartvote
        dirs::data_local_dir()
            .map(|d| d.join("chartvote"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\chartvote"))
    } else {
        PathBuf::from("./chartvote_data")
    }
}

/// Load engine configuration from database settings
///
/// Missing keys fall back to defaults; a malformed value is an error.
pub async fn load_engine_config(db: &sqlx::SqlitePool) -> Result<EngineConfig> {
    let mut config = EngineConfig::default();

    let throttle: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'fetch_throttle_seconds'")
            .fetch_optional(db)
            .await?;

    if let Some(value) = throttle {
        let secs: u64 = value.parse().map_err(|_| {
            Error::InvalidInput(format!("fetch_throttle_seconds is not an integer: {}", value))
        })?;
        config.fetch_throttle = Duration::from_secs(secs);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_argument_wins() {
        let folder = resolve_data_folder(Some("/tmp/chartvote-explicit")).unwrap();
        assert_eq!(folder, PathBuf::from("/tmp/chartvote-explicit"));
    }

    #[test]
    fn test_default_engine_config() {
        let config = EngineConfig::default();
        assert_eq!(config.fetch_throttle, Duration::from_secs(120));
    }
}
