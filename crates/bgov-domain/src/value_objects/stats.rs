//! Stats snapshots for operational tooling
//!
//! Plain serializable values; nothing here is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-user line of [`SystemStats`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub max_cpu_percent: f64,
    pub max_memory_mb: u64,
    pub estimated_cpu_percent: f64,
    pub estimated_memory_mb: u64,
    pub active_workers: usize,
    pub idle_secs: u64,
}

/// Population and memory snapshot of the system tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub active_users: usize,
    pub max_concurrent_users: usize,
    pub process_memory_mb: u64,
    pub total_memory_mb: u64,
    pub available_memory_mb: u64,
    pub available_cpu_percent: f64,
    pub active_workers: usize,
    pub active_executions: usize,
    pub inactive_users: Vec<String>,
    pub users: Vec<UserSummary>,
    pub sampled_at: Option<DateTime<Utc>>,
}

/// Per-session line of [`SessionStats`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub username: String,
    pub ip_address: String,
    pub messages_in_window: u64,
    pub bytes_in_window: u64,
    pub total_messages: u64,
    pub total_bytes: u64,
    pub connection_count: u32,
    pub idle_secs: u64,
}

/// Snapshot of the session tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub active_sessions: usize,
    pub unique_users: usize,
    pub unique_ips: usize,
    pub max_sessions_per_user: usize,
    pub max_sessions_per_ip: usize,
    pub rate_limit_messages: u64,
    pub rate_limit_bandwidth: u64,
    pub sessions: Vec<SessionSummary>,
}

/// Statistics of an active run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningExecution {
    pub username: String,
    pub program: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub remaining_ms: u64,
    pub command_count: u64,
    pub loop_count: u64,
    pub max_commands: u64,
    pub max_loop_count: u64,
}

/// Result of an execution stats lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionStats {
    /// The user has no active run
    NotRunning { username: String },
    /// The user has an active run
    Running(RunningExecution),
}

impl ExecutionStats {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    /// The active run, if any
    pub fn running(&self) -> Option<&RunningExecution> {
        match self {
            Self::Running(run) => Some(run),
            Self::NotRunning { .. } => None,
        }
    }
}

impl fmt::Display for ExecutionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRunning { .. } => f.write_str("no running program"),
            Self::Running(run) => write!(
                f,
                "{} running for {}ms ({} statements, {} loops)",
                run.program, run.elapsed_ms, run.command_count, run.loop_count
            ),
        }
    }
}
