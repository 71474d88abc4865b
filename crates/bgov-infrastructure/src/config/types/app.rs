//! Root configuration

use super::{ExecutionConfig, LoggingConfig, SecurityConfig, SystemConfig};
use bgov_domain::value_objects::{ExecutionPolicy, SessionPolicy, SystemPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration, one field per TOML section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Population, fair-share pool, and system monitor
    pub system: SystemConfig,
    /// Session caps and rate limits
    pub security: SecurityConfig,
    /// Per-user and per-run ceilings
    pub execution: ExecutionConfig,
    /// Log output
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Policy for the system tier
    pub fn system_policy(&self) -> SystemPolicy {
        SystemPolicy {
            max_concurrent_users: self.system.max_concurrent_users,
            reserved_cpu_percent: self.system.system_reserved_cpu,
            reserved_ram_mb: self.system.system_reserved_ram_mb,
            min_system_ram_mb: self.system.min_system_ram_mb,
            min_cpu_percent: self.system.min_cpu_percent,
            min_memory_mb: self.system.min_memory_mb,
            max_workers: self.execution.max_goroutines,
            max_execution_time: Duration::from_secs(self.execution.max_execution_time_secs),
            max_file_size_bytes: self.execution.max_file_size_bytes,
            max_total_files: self.execution.max_total_files,
            monitor_interval: Duration::from_secs(self.system.resource_monitor_interval_secs),
            max_inactive_time: Duration::from_secs(self.system.max_inactive_time_secs),
        }
    }

    /// Policy for the execution tier
    pub fn execution_policy(&self) -> ExecutionPolicy {
        ExecutionPolicy {
            max_commands: self.execution.max_commands,
            max_loop_count: self.execution.max_loop_count,
            memory_guard_interval: Duration::from_secs(self.system.memory_guard_interval_secs),
        }
    }

    /// Policy for the session tier
    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            max_sessions_per_user: self.security.max_sessions_per_user,
            max_sessions_per_ip: self.security.max_sessions_per_ip,
            rate_limit_messages: self.security.rate_limit_messages,
            rate_limit_bandwidth: self.security.rate_limit_bandwidth,
            sweep_interval: Duration::from_secs(self.security.session_sweep_interval_secs),
            idle_timeout: Duration::from_secs(self.security.session_idle_timeout_secs),
            ..SessionPolicy::default()
        }
    }
}
