//! Error types
//!
//! Library-facing failures. Orchestration code wraps these in `anyhow`.

use std::path::PathBuf;

use crate::apps::PackageId;

/// Failures of a pipeline recomputation
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The mapper has no case for this application kind. This is a
    /// programming error and ends the session's pipeline.
    #[error("No display mapping for application kind '{kind}' (package {id})")]
    UnsupportedAppKind { id: PackageId, kind: String },

    #[error("Recomputation worker failed: {0}")]
    Worker(String),
}

/// Failures reading application snapshots
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read snapshot {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed snapshot {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Invalid filter or sort option text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionParseError {
    #[error("Unknown filter '{0}'. Expected one of: internet, no-internet, declares, all-granted, has-denied, requests:<pattern>")]
    UnknownFilter(String),

    #[error("Invalid permission pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Unknown sort mode '{0}'. Expected one of: label, package, permissions, granted, internet")]
    UnknownSort(String),
}

/// Configuration loading and validation failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Note: bounds must match POLL_INTERVAL_MIN/MAX in constants.rs
    #[error("Invalid poll interval: {0}. Must be between 0.1 and 300.0 seconds")]
    InvalidInterval(f64),

    #[error("Invalid parallel threshold: must be at least 1")]
    InvalidThreshold,

    #[error("Invalid log level '{0}'")]
    InvalidLevel(String),

    #[error("Summary template '{template}' is missing placeholder {placeholder}")]
    InvalidTemplate { template: String, placeholder: &'static str },

    #[error(transparent)]
    Option(#[from] OptionParseError),
}
