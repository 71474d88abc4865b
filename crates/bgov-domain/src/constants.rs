//! Domain layer constants
//!
//! Default ceilings and fair-share parameters. Infrastructure-specific
//! constants (config file names, env prefixes) live in
//! `bgov_infrastructure::constants`.

use std::time::Duration;

// ============================================================================
// SYSTEM TIER CONSTANTS
// ============================================================================

/// Maximum number of concurrently registered users
pub const DEFAULT_MAX_CONCURRENT_USERS: usize = 50;

/// CPU percentage held back for the host process itself
pub const DEFAULT_SYSTEM_RESERVED_CPU: f64 = 25.0;

/// RAM (MB) held back for the host process itself
pub const DEFAULT_SYSTEM_RESERVED_RAM_MB: u64 = 256;

/// Lower bound used when the detected host RAM is smaller
pub const DEFAULT_MIN_SYSTEM_RAM_MB: u64 = 512;

/// Fair-share floor for CPU percentage
pub const MIN_CPU_PERCENT_PER_USER: f64 = 1.0;

/// Fair-share floor for RAM
pub const MIN_MEMORY_MB_PER_USER: u64 = 32;

/// System monitor sampling interval
pub const DEFAULT_RESOURCE_MONITOR_INTERVAL: Duration = Duration::from_secs(5);

/// Idle time after which the system monitor flags a user
pub const DEFAULT_MAX_INACTIVE_TIME: Duration = Duration::from_secs(30 * 60);

// ============================================================================
// EXECUTION TIER CONSTANTS
// ============================================================================

/// Concurrent workers a single user may hold
pub const DEFAULT_MAX_WORKERS: usize = 20;

/// Wall-clock ceiling for one program run
pub const DEFAULT_MAX_EXECUTION_TIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Largest file a user may write (enforced by the storage layer)
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 1024 * 1024;

/// File count a user may hold (enforced by the storage layer)
pub const DEFAULT_MAX_TOTAL_FILES: usize = 100;

/// Absolute statement ceiling per run
pub const DEFAULT_MAX_COMMANDS: u64 = 20_000_000;

/// Absolute loop/jump ceiling per run
pub const DEFAULT_MAX_LOOP_COUNT: u64 = 3_000_000;

/// Memory guard sampling interval
pub const DEFAULT_MEMORY_GUARD_INTERVAL: Duration = Duration::from_secs(2);

// ============================================================================
// SESSION TIER CONSTANTS
// ============================================================================

/// Concurrent sessions per user
pub const DEFAULT_MAX_SESSIONS_PER_USER: usize = 3;

/// Concurrent sessions per client IP
pub const DEFAULT_MAX_SESSIONS_PER_IP: usize = 5;

/// Messages accepted per session window
pub const DEFAULT_RATE_LIMIT_MESSAGES: u64 = 60;

/// Bytes accepted per session window
pub const DEFAULT_RATE_LIMIT_BANDWIDTH: u64 = 10 * 1024;

/// Length of one rate-limit window
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Idle sweep interval
pub const DEFAULT_SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Inactivity after which the idle sweep drops a session
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
