//! Per-user resource allowance

use crate::value_objects::policy::SystemPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// CPU shares are computed in millionths of a percent
const CPU_SHARE_SCALE: f64 = 1_000_000.0;

/// Snapshot of one user's current allowance
///
/// Never mutated in place; the system tier recomputes a fresh value for every
/// registered user whenever the population changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Fair share of the non-reserved CPU, in percent
    pub max_cpu_percent: f64,
    /// Fair share of the non-reserved RAM, in MB
    pub max_memory_mb: u64,
    /// Concurrent workers the user may hold
    pub max_workers: usize,
    /// Wall-clock ceiling for one program run
    pub max_execution_time: Duration,
    /// Largest file the storage layer accepts from this user
    pub max_file_size_bytes: u64,
    /// Number of files the storage layer accepts from this user
    pub max_total_files: usize,
}

impl ResourceLimits {
    /// Even split of the available pool across `active_users`, clamped to the
    /// policy floors.
    ///
    /// CPU shares are rounded down to a millionth of a percent so their sum
    /// never exceeds the pool. The RAM sum is only bounded by the pool while
    /// the per-user share stays above `min_memory_mb`; once the floor applies
    /// the allowances may overcommit RAM.
    ///
    /// `detected_total_mb` is the host RAM as sampled; it is raised to
    /// `min_system_ram_mb` when smaller.
    // Weighted or priority-aware sharing would replace this function.
    pub fn fair_share(policy: &SystemPolicy, detected_total_mb: u64, active_users: usize) -> Self {
        let users = active_users.max(1);

        let available_cpu = policy.available_cpu_percent();
        let micro_share = (available_cpu * CPU_SHARE_SCALE).floor() as u64 / users as u64;
        let cpu = (micro_share as f64 / CPU_SHARE_SCALE).max(policy.min_cpu_percent);

        let available_ram = policy.available_memory_mb(detected_total_mb);
        let ram = (available_ram / users as u64).max(policy.min_memory_mb);

        Self {
            max_cpu_percent: cpu,
            max_memory_mb: ram,
            max_workers: policy.max_workers,
            max_execution_time: policy.max_execution_time,
            max_file_size_bytes: policy.max_file_size_bytes,
            max_total_files: policy.max_total_files,
        }
    }
}
