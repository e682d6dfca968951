//! Global constants for permlens
//!
//! Centralized location for application-wide constants

/// Application subsystem identifier, used as the unified logging subsystem
/// on macOS and as the target prefix elsewhere
pub const APP_SUBSYSTEM: &str = "io.permlens";

/// Directory name under the platform config dir
pub const CONFIG_DIR_NAME: &str = "permlens";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Minimum snapshot polling interval in seconds
pub const POLL_INTERVAL_MIN: f64 = 0.1;

/// Maximum snapshot polling interval in seconds
pub const POLL_INTERVAL_MAX: f64 = 300.0;

/// Default snapshot polling interval in seconds
pub const POLL_INTERVAL_DEFAULT: f64 = 1.0;

/// Snapshot size from which filtering and sorting run on the rayon pool
pub const PARALLEL_THRESHOLD_DEFAULT: usize = 2048;

/// Separator between the granted summary and the declared-permission suffix
pub const SUMMARY_SEPARATOR: &str = " · ";
