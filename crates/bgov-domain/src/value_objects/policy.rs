//! Tier policies
//!
//! Plain settings consumed by each governor tier. The infrastructure layer
//! builds these from the loaded configuration; tests build them directly.

use crate::constants::*;
use std::time::Duration;

/// Settings for the system tier (population, fair share, monitor)
#[derive(Debug, Clone, PartialEq)]
pub struct SystemPolicy {
    pub max_concurrent_users: usize,
    pub reserved_cpu_percent: f64,
    pub reserved_ram_mb: u64,
    pub min_system_ram_mb: u64,
    pub min_cpu_percent: f64,
    pub min_memory_mb: u64,
    pub max_workers: usize,
    pub max_execution_time: Duration,
    pub max_file_size_bytes: u64,
    pub max_total_files: usize,
    pub monitor_interval: Duration,
    pub max_inactive_time: Duration,
}

impl SystemPolicy {
    /// CPU percentage left after the reservation
    pub fn available_cpu_percent(&self) -> f64 {
        (100.0 - self.reserved_cpu_percent).max(0.0)
    }

    /// RAM pool in MB left after the reservation
    pub fn available_memory_mb(&self, detected_total_mb: u64) -> u64 {
        detected_total_mb
            .max(self.min_system_ram_mb)
            .saturating_sub(self.reserved_ram_mb)
    }
}

impl Default for SystemPolicy {
    fn default() -> Self {
        Self {
            max_concurrent_users: DEFAULT_MAX_CONCURRENT_USERS,
            reserved_cpu_percent: DEFAULT_SYSTEM_RESERVED_CPU,
            reserved_ram_mb: DEFAULT_SYSTEM_RESERVED_RAM_MB,
            min_system_ram_mb: DEFAULT_MIN_SYSTEM_RAM_MB,
            min_cpu_percent: MIN_CPU_PERCENT_PER_USER,
            min_memory_mb: MIN_MEMORY_MB_PER_USER,
            max_workers: DEFAULT_MAX_WORKERS,
            max_execution_time: DEFAULT_MAX_EXECUTION_TIME,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_total_files: DEFAULT_MAX_TOTAL_FILES,
            monitor_interval: DEFAULT_RESOURCE_MONITOR_INTERVAL,
            max_inactive_time: DEFAULT_MAX_INACTIVE_TIME,
        }
    }
}

/// Settings for the execution tier (step ceilings, memory guard)
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPolicy {
    pub max_commands: u64,
    pub max_loop_count: u64,
    pub memory_guard_interval: Duration,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            max_commands: DEFAULT_MAX_COMMANDS,
            max_loop_count: DEFAULT_MAX_LOOP_COUNT,
            memory_guard_interval: DEFAULT_MEMORY_GUARD_INTERVAL,
        }
    }
}

/// Settings for the session tier (caps, rate limits, idle sweep)
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPolicy {
    pub max_sessions_per_user: usize,
    pub max_sessions_per_ip: usize,
    pub rate_limit_messages: u64,
    pub rate_limit_bandwidth: u64,
    pub window: Duration,
    pub sweep_interval: Duration,
    pub idle_timeout: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            max_sessions_per_user: DEFAULT_MAX_SESSIONS_PER_USER,
            max_sessions_per_ip: DEFAULT_MAX_SESSIONS_PER_IP,
            rate_limit_messages: DEFAULT_RATE_LIMIT_MESSAGES,
            rate_limit_bandwidth: DEFAULT_RATE_LIMIT_BANDWIDTH,
            window: RATE_LIMIT_WINDOW,
            sweep_interval: DEFAULT_SESSION_SWEEP_INTERVAL,
            idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
        }
    }
}
