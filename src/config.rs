//! Configuration loading and persistence.
//!
//! Handles reading and writing the railops configuration file. Values fall
//! back to the bundled defaults and may be overridden per-process through
//! `RAILOPS_*` environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::constants;

/// Configuration for the railops client.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Config {
    /// Base URL of the dashboard REST API.
    pub api_url: String,
    /// WebSocket endpoint for the realtime push channel.
    pub ws_url: String,
    /// Seconds between heartbeat pings while connected.
    pub heartbeat_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.to_string(),
            ws_url: constants::DEFAULT_WS_URL.to_string(),
            heartbeat_interval: constants::DEFAULT_HEARTBEAT_INTERVAL.as_secs(),
        }
    }
}

impl Config {
    /// Returns the configuration directory path, creating it if necessary.
    ///
    /// `RAILOPS_CONFIG_DIR` overrides the platform config dir, which keeps
    /// tests and ad-hoc environments away from the real file.
    pub fn config_dir() -> Result<PathBuf> {
        let dir = if let Ok(override_dir) = std::env::var("RAILOPS_CONFIG_DIR") {
            PathBuf::from(override_dir)
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("railops")
        };
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Loads configuration from file, with environment variable overrides.
    ///
    /// A missing or unreadable file falls back to defaults; the overrides
    /// still apply on top.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file().unwrap_or_else(|_| Self::default());
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_from_file() -> Result<Self> {
        let config_path = Self::config_dir()?.join("config.json");
        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            anyhow::bail!("Config file not found")
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(api_url) = std::env::var("RAILOPS_API_URL") {
            self.api_url = api_url;
        }

        if let Ok(ws_url) = std::env::var("RAILOPS_WS_URL") {
            self.ws_url = ws_url;
        }

        if let Ok(interval) = std::env::var("RAILOPS_HEARTBEAT_INTERVAL") {
            if let Ok(seconds) = interval.parse::<u64>() {
                self.heartbeat_interval = seconds;
            }
        }
    }

    /// Persists the current configuration to disk.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_dir()?.join("config.json");
        fs::write(&config_path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Heartbeat cadence as a [`Duration`].
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval)
    }
}
