//! `[system]` section

use bgov_domain::constants::*;
use serde::{Deserialize, Serialize};

/// Population, fair-share pool, and monitor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Maximum concurrently registered users
    pub max_concurrent_users: usize,
    /// CPU percentage held back for the host process
    pub system_reserved_cpu: f64,
    /// RAM (MB) held back for the host process
    pub system_reserved_ram_mb: u64,
    /// Lower bound for the detected host RAM (MB)
    pub min_system_ram_mb: u64,
    /// System monitor interval
    pub resource_monitor_interval_secs: u64,
    /// Idle time before the monitor flags a user
    pub max_inactive_time_secs: u64,
    /// Memory guard interval
    pub memory_guard_interval_secs: u64,
    /// Fair-share CPU floor per user
    pub min_cpu_percent: f64,
    /// Fair-share RAM floor per user (MB)
    pub min_memory_mb: u64,
}

/// Default system configuration.
///
/// - `max_concurrent_users`: 50
/// - `system_reserved_cpu`: 25.0
/// - `system_reserved_ram_mb`: 256
/// - `min_system_ram_mb`: 512
/// - `resource_monitor_interval_secs`: 5
/// - `max_inactive_time_secs`: 1800
/// - `memory_guard_interval_secs`: 2
impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            max_concurrent_users: DEFAULT_MAX_CONCURRENT_USERS,
            system_reserved_cpu: DEFAULT_SYSTEM_RESERVED_CPU,
            system_reserved_ram_mb: DEFAULT_SYSTEM_RESERVED_RAM_MB,
            min_system_ram_mb: DEFAULT_MIN_SYSTEM_RAM_MB,
            resource_monitor_interval_secs: DEFAULT_RESOURCE_MONITOR_INTERVAL.as_secs(),
            max_inactive_time_secs: DEFAULT_MAX_INACTIVE_TIME.as_secs(),
            memory_guard_interval_secs: DEFAULT_MEMORY_GUARD_INTERVAL.as_secs(),
            min_cpu_percent: MIN_CPU_PERCENT_PER_USER,
            min_memory_mb: MIN_MEMORY_MB_PER_USER,
        }
    }
}
