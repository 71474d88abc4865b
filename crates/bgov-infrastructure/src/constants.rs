//! Infrastructure layer constants
//!
//! Contains constants that are part of the infrastructure implementation.
//! Governor defaults are defined in `bgov_domain::constants`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "bgov.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "bgov";

/// Environment variable prefix for configuration (nested keys use `__`)
pub const CONFIG_ENV_PREFIX: &str = "BGOV";

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable that overrides the configured log filter
pub const LOG_FILTER_ENV: &str = "BGOV_LOG";

/// File stem used for rolling log files
pub const LOG_FILE_STEM: &str = "bgov";

// ============================================================================
// LIFECYCLE CONSTANTS
// ============================================================================

/// Time allowed for background tasks to stop on shutdown (seconds)
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;
