//! Configuration management
//!
//! TOML configuration with `[session]`, `[source]`, `[logging]` and `[strings]`
//! sections. Every field has a default, so a missing file or a partial file is
//! valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, PARALLEL_THRESHOLD_DEFAULT, POLL_INTERVAL_DEFAULT, POLL_INTERVAL_MAX,
    POLL_INTERVAL_MIN,
};
use crate::errors::ConfigError;
use crate::filter::{pattern, FilterKey, FilterOptions};
use crate::logging::parse_level;
use crate::pipeline::PipelineSettings;
use crate::presentation::SummaryStrings;
use crate::sort::{SortMode, SortOptions};

/// Main configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub session: SessionConfig,
    pub source: SourceConfig,
    pub logging: LoggingConfig,
    pub strings: SummaryStrings,
}

/// Session defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub default_sort: SortMode,
    /// Filter keys enabled when a session starts
    pub default_filters: Vec<FilterKey>,
    /// Snapshot size from which filtering and sorting go parallel
    pub parallel_threshold: usize,
    pub case_sensitive_search: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_sort: SortMode::default(),
            default_filters: Vec::new(),
            parallel_threshold: PARALLEL_THRESHOLD_DEFAULT,
            case_sensitive_search: false,
        }
    }
}

/// Snapshot source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Polling interval in seconds (0.1-300.0)
    pub poll_interval: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL_DEFAULT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of off, error, warn, info, debug, trace
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Configuration {
    /// `<config dir>/permlens/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("Could not determine the user configuration directory")?;
        Ok(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Configuration = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Explicit path must exist; the default path falls back to defaults when absent
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()));
        }

        let default_path = match Self::default_config_path() {
            Ok(path) => path,
            Err(_) => return Ok(Self::default()),
        };
        if !default_path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_file(&default_path)
            .with_context(|| format!("Failed to load configuration from {}", default_path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let interval = self.source.poll_interval;
        if !(POLL_INTERVAL_MIN..=POLL_INTERVAL_MAX).contains(&interval) {
            return Err(ConfigError::InvalidInterval(interval));
        }
        if self.session.parallel_threshold == 0 {
            return Err(ConfigError::InvalidThreshold);
        }
        for key in &self.session.default_filters {
            if let FilterKey::Requests(filter) = key {
                pattern::validate_permission_filter(filter)?;
            }
        }
        self.log_level()?;
        self.strings.validate()
    }

    pub fn poll_duration(&self) -> Duration {
        Duration::from_secs_f64(self.source.poll_interval)
    }

    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        parse_level(&self.logging.level)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            parallel_threshold: self.session.parallel_threshold,
            case_sensitive_search: self.session.case_sensitive_search,
        }
    }

    pub fn default_filter_options(&self) -> FilterOptions {
        self.session.default_filters.iter().cloned().collect()
    }

    pub fn default_sort_options(&self) -> SortOptions {
        SortOptions::new(self.session.default_sort)
    }
}
