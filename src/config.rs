//! Configuration for the shutter trigger agent.
//!
//! This is agent plumbing (where files live, channel sizing, pause state).
//! Per-trigger behaviour lives in the settings store, see [`crate::settings`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Main configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path of the flat key→value settings file
    pub settings_path: PathBuf,

    /// Path for storing activity stats
    pub data_path: PathBuf,

    /// Capacity of the collector → engine event queue
    pub channel_capacity: usize,

    /// Whether triggering is currently paused
    pub paused: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shutter-trigger");

        Self {
            settings_path: Self::config_dir().join("settings.json"),
            data_path: data_dir,
            channel_capacity: 4_096,
            paused: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::Parse(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(&config_path, content)?;

        Ok(())
    }

    fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shutter-trigger")
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    /// Path of the persisted activity stats.
    pub fn activity_path(&self) -> PathBuf {
        self.data_path.join("activity.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)?;
        if let Some(parent) = self.settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.paused);
        assert_eq!(config.channel_capacity, 4_096);
        assert!(config.settings_path.ends_with("settings.json"));
        assert!(config.activity_path().ends_with("activity.json"));
    }

    #[test]
    fn test_config_json_shape() {
        let config = Config {
            settings_path: PathBuf::from("/tmp/s.json"),
            data_path: PathBuf::from("/tmp/data"),
            channel_capacity: 16,
            paused: true,
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert!(parsed.paused);
        assert_eq!(parsed.channel_capacity, 16);
        assert_eq!(parsed.settings_path, PathBuf::from("/tmp/s.json"));
    }
}
