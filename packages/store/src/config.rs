//! # Application configuration — `recipe-keeper.toml`
//!
//! Defines the TOML configuration read at startup (filename:
//! [`RecipeKeeperConfig::filename`] = `"recipe-keeper.toml"`). It controls where
//! data lives and how the sync loop and live views are paced.
//!
//! ## Structure
//!
//! ```toml
//! [storage]
//! dir = "/var/lib/recipe-keeper"   # optional, defaults to the platform data dir
//! namespace = "user-uuid"          # optional per-user subdirectory
//!
//! [sync]
//! interval_secs = 30        # 0 disables the periodic trigger
//! remote_latency_ms = 1000  # simulated exchange delay
//!
//! [notify]
//! poll_interval_secs = 2    # 0 disables the live-view poll fallback
//! ```
//!
//! ## Types
//!
//! | Struct | Purpose |
//! |--------|---------|
//! | [`RecipeKeeperConfig`] | Top-level config. Builder helpers, TOML (de)serialisation, the canonical filename. |
//! | [`StorageConfig`] | Data directory and optional namespace. |
//! | [`SyncConfig`] | Periodic sync interval, **30 seconds** by default, and the simulated remote latency, **1 second**. |
//! | [`NotifyConfig`] | Poll fallback interval of live views, **2 seconds** by default. |
//!
//! All structs implement `Default` so that a missing or empty file is
//! equivalent to the default configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration stored in `recipe-keeper.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeKeeperConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Where collections are persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory. `None` means the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Subdirectory isolating one user's data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Sync configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Periodic sync interval in seconds. 0 disables the timer trigger.
    #[serde(default = "default_sync_interval")]
    pub interval_secs: u32,
    /// Latency of the simulated remote exchange, in milliseconds.
    #[serde(default = "default_remote_latency")]
    pub remote_latency_ms: u64,
}

/// Live-view configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Poll fallback interval in seconds. 0 disables polling.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u32,
}

fn default_sync_interval() -> u32 {
    30
}

fn default_remote_latency() -> u64 {
    1000
}

fn default_poll_interval() -> u32 {
    2
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sync_interval(),
            remote_latency_ms: default_remote_latency(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl RecipeKeeperConfig {
    /// Create a config storing data under `dir`.
    pub fn new(dir: PathBuf) -> Self {
        Self {
            storage: StorageConfig {
                dir: Some(dir),
                namespace: None,
            },
            ..Self::default()
        }
    }

    /// Builder method to set the periodic sync interval.
    pub fn with_sync_interval(mut self, secs: u32) -> Self {
        self.sync.interval_secs = secs;
        self
    }

    /// Builder method to set the live-view poll interval.
    pub fn with_poll_interval(mut self, secs: u32) -> Self {
        self.notify.poll_interval_secs = secs;
        self
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "recipe-keeper.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Periodic sync interval, `None` when disabled.
    pub fn sync_interval(&self) -> Option<Duration> {
        non_zero_secs(self.sync.interval_secs)
    }

    /// Live-view poll interval, `None` when disabled.
    pub fn poll_interval(&self) -> Option<Duration> {
        non_zero_secs(self.notify.poll_interval_secs)
    }

    pub fn remote_latency(&self) -> Duration {
        Duration::from_millis(self.sync.remote_latency_ms)
    }
}

fn non_zero_secs(secs: u32) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(u64::from(secs)))
}
