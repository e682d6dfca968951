//! Logging backend setup
//!
//! Everything logs through the `log` facade. On macOS records go to the
//! Unified Logging System under the `io.permlens` subsystem; elsewhere they are
//! bridged into a `tracing_subscriber` fmt layer writing to stderr.

use anyhow::Result;
use log::LevelFilter;

use crate::errors::ConfigError;

/// Parse a level name as used in configuration and on the command line
pub fn parse_level(name: &str) -> Result<LevelFilter, ConfigError> {
    name.trim()
        .parse::<LevelFilter>()
        .map_err(|_| ConfigError::InvalidLevel(name.to_string()))
}

/// Install the platform logger. Can only succeed once per process.
pub fn init_logger(level: LevelFilter) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        use crate::constants::APP_SUBSYSTEM;
        use oslog::OsLogger;

        let logger = OsLogger::new(APP_SUBSYSTEM);
        log::set_boxed_logger(Box::new(logger))
            .map_err(|e| anyhow::anyhow!("Failed to set logger: {}", e))?;
    }

    #[cfg(not(target_os = "macos"))]
    {
        use std::io::IsTerminal;
        use tracing_subscriber::prelude::*;

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .with_target(true);

        // try_init also installs the log -> tracing bridge
        tracing_subscriber::registry()
            .with(env_filter(level))
            .with(fmt_layer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to set logger: {}", e))?;
    }

    log::set_max_level(level);
    Ok(())
}

/// Filter matching the configured `log` level
#[cfg(not(target_os = "macos"))]
fn env_filter(level: LevelFilter) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::new(level.as_str().to_ascii_lowercase())
}
