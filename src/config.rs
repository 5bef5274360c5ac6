use log::info;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, TrackerError};

pub const DEFAULT_CONFIG_FILE: &str = "taskboard.toml";

/// Process configuration, read once at startup from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub bootstrap: Option<BootstrapConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Snapshot file holding the workbook.
    pub path: PathBuf,
    pub workbook: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: PathBuf::from("database/DataCollection.bin.gz"),
            workbook: "DataCollection".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub session_hours: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1:3000".to_string(),
            session_hours: 24,
        }
    }
}

impl ServerConfig {
    pub fn session_lifetime(&self) -> Duration {
        Duration::from_secs(self.session_hours * 60 * 60)
    }
}

/// Upper bounds on cached read age, in seconds. Writes always invalidate.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub credentials_secs: Option<u64>,
    pub goals_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            credentials_secs: Some(3600),
            goals_secs: Some(60),
        }
    }
}

impl CacheConfig {
    pub fn credentials_max_age(&self) -> Option<Duration> {
        self.credentials_secs.map(Duration::from_secs)
    }

    pub fn goals_max_age(&self) -> Option<Duration> {
        self.goals_secs.map(Duration::from_secs)
    }
}

/// Master account created when the Credentials sheet has no usable rows.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    pub username: String,
    pub password: String,
    pub name: String,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| TrackerError::Config(e.to_string()))
    }

    /// Load `path`, or fall back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let text = fs::read_to_string(path)
            .map_err(|e| TrackerError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml(&text)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
