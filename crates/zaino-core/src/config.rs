//! Persistent monitor configuration
//!
//! Stores the backend URL, polling cadence and sensor field mapping in a
//! JSON file at `<data_dir>/zaino-monitor/config.json`.

use crate::source::payload::{FlowExtractor, MissingValue, DEFAULT_FLOW_FIELD};
use crate::stats::buffer::DEFAULT_CAPACITY;
use crate::stream::sample_stream::DEFAULT_POLL_INTERVAL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors from validating or saving a [`MonitorConfig`]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("poll interval must be greater than zero")]
    ZeroInterval,

    #[error("capacity must be greater than zero")]
    ZeroCapacity,

    #[error("flow field name must not be empty")]
    EmptyField,

    #[error("base URL must not be empty")]
    EmptyBaseUrl,

    #[error("failed to write config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode config: {0}")]
    Encode(#[from] serde_json::Error),
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_flow_field() -> String {
    DEFAULT_FLOW_FIELD.to_string()
}

fn default_fetch_timeout_ms() -> Option<u64> {
    Some(8_000)
}

/// Persistent monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Dashboard backend, e.g. `http://127.0.0.1:5000`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Time between flow polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Samples kept in the rolling chart
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Sensor field under `data` that feeds the chart
    #[serde(default = "default_flow_field")]
    pub flow_field: String,
    /// Policy for a reading without a value
    #[serde(default)]
    pub missing_value: MissingValue,
    /// Per-fetch timeout (None = no limit)
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: Option<u64>,
    /// Weather station shown next to the gauge
    #[serde(default)]
    pub weather_station: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            capacity: default_capacity(),
            flow_field: default_flow_field(),
            missing_value: MissingValue::default(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            weather_station: None,
        }
    }
}

impl MonitorConfig {
    /// Config file path: `<data_dir>/zaino-monitor/config.json`
    pub fn path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zaino-monitor")
            .join("config.json")
    }

    /// Load config from the default location, falling back to defaults on any error
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from `path`, falling back to defaults on any error
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "Loaded config from disk");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save config to disk, creating parent directories if needed
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "Config saved to disk");
        Ok(())
    }

    /// Reject values the stream cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.flow_field.trim().is_empty() {
            return Err(ConfigError::EmptyField);
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    /// Payload extractor for the configured field mapping
    pub fn extractor(&self) -> FlowExtractor {
        FlowExtractor::new(self.flow_field.clone(), self.missing_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.poll_interval(), DEFAULT_POLL_INTERVAL);
        assert_eq!(config.capacity, 30);
        assert_eq!(config.flow_field, "constflow");
        assert_eq!(config.missing_value, MissingValue::Zero);
        assert_eq!(config.fetch_timeout(), Some(Duration::from_secs(8)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let json = r#"{"flow_field": "instflow", "capacity": 60}"#;
        let config: MonitorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.flow_field, "instflow");
        assert_eq!(config.capacity, 60);
        assert_eq!(config.poll_interval_ms, 10_000);
        assert_eq!(config.weather_station, None);
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: MonitorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_null_timeout_disables_limit() {
        let config: MonitorConfig = serde_json::from_str(r#"{"fetch_timeout_ms": null}"#).unwrap();
        assert_eq!(config.fetch_timeout(), None);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = MonitorConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroInterval)));

        let config = MonitorConfig {
            capacity: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroCapacity)));

        let config = MonitorConfig {
            flow_field: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyField)));
    }

    #[test]
    fn test_extractor_follows_mapping() {
        let config = MonitorConfig {
            flow_field: "instflow".to_string(),
            missing_value: MissingValue::Reject,
            ..Default::default()
        };
        let extractor = config.extractor();
        assert_eq!(extractor.field(), "instflow");
        assert_eq!(extractor.missing_value(), MissingValue::Reject);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = MonitorConfig {
            base_url: "http://zaino.local".to_string(),
            weather_station: Some("LEMD".to_string()),
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = MonitorConfig::load_from(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(MonitorConfig::load_from(&path), MonitorConfig::default());
    }
}
