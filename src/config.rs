//! Search configuration
//!
//! Loaded once per session from JSON; immutable afterwards. Every field has a
//! default so an empty object `{}` is a valid configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event, Logger, Severity};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Engine configuration for one search session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Lowest log severity written (default: warn)
    #[serde(default = "default_log_level")]
    pub log_level: Severity,

    /// Let leaf evaluators answer from the reverse index when one exists
    #[serde(default = "default_true")]
    pub use_reverse_index: bool,

    /// Drive indexed leaves from their forward index instead of a full scan
    #[serde(default = "default_true")]
    pub prefer_index_cursors: bool,

    /// Attributes the in-memory store maintains indexes for
    #[serde(default)]
    pub indexed_attributes: Vec<String>,
}

fn default_log_level() -> Severity {
    Severity::Warn
}

fn default_true() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            use_reverse_index: true,
            prefer_index_cursors: true,
            indexed_attributes: Vec::new(),
        }
    }
}

impl SearchConfig {
    /// Configuration that never consults an index; every leaf is a full scan
    pub fn full_scan() -> Self {
        Self {
            use_reverse_index: false,
            prefer_index_cursors: false,
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&content)?;
        log_event_with_fields(Event::ConfigLoaded, &[("path", &path.display().to_string())]);
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: SearchConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the engine cannot honor
    pub fn validate(&self) -> ConfigResult<()> {
        for name in &self.indexed_attributes {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "indexed_attributes contains an empty name".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Applies the configured log level process-wide
    pub fn apply_logging(&self) {
        Logger::set_min_severity(self.log_level);
    }
}
