//! Client configuration

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(String),
    #[error("bad config: {0}")]
    Json(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e.to_string())
    }
}

/// Settings of a playing session
///
/// Every field may be omitted in the JSON form, in which case the default is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Polling interval while waiting for a game to start
    pub waiting_interval_ms: u64,
    /// Polling interval once the game started
    pub started_interval_ms: u64,
    /// Address of the match server
    pub peer_addr: String,
    /// Connect, read and write timeout for a single request
    pub io_timeout_ms: u64,
    /// Name to derive the user id from
    pub user_name: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            waiting_interval_ms: 1000,
            started_interval_ms: 200,
            peer_addr: "127.0.0.1:2000".to_string(),
            io_timeout_ms: 2000,
            user_name: None,
        }
    }
}

impl SyncConfig {
    pub fn from_json(s: &str) -> Result<SyncConfig, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<SyncConfig, ConfigError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    #[inline]
    pub fn waiting_interval(&self) -> Duration {
        Duration::from_millis(self.waiting_interval_ms)
    }

    #[inline]
    pub fn started_interval(&self) -> Duration {
        Duration::from_millis(self.started_interval_ms)
    }

    #[inline]
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}
