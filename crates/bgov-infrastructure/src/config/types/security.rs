//! `[security]` section

use bgov_domain::constants::*;
use serde::{Deserialize, Serialize};

/// Session caps and per-minute rate limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub max_sessions_per_user: usize,
    pub max_sessions_per_ip: usize,
    /// Messages per session per minute
    pub rate_limit_messages: u64,
    /// Bytes per session per minute
    pub rate_limit_bandwidth: u64,
    pub session_sweep_interval_secs: u64,
    pub session_idle_timeout_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_sessions_per_user: DEFAULT_MAX_SESSIONS_PER_USER,
            max_sessions_per_ip: DEFAULT_MAX_SESSIONS_PER_IP,
            rate_limit_messages: DEFAULT_RATE_LIMIT_MESSAGES,
            rate_limit_bandwidth: DEFAULT_RATE_LIMIT_BANDWIDTH,
            session_sweep_interval_secs: DEFAULT_SESSION_SWEEP_INTERVAL.as_secs(),
            session_idle_timeout_secs: DEFAULT_SESSION_IDLE_TIMEOUT.as_secs(),
        }
    }
}
