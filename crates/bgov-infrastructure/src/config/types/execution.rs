//! `[execution]` section

use bgov_domain::constants::*;
use serde::{Deserialize, Serialize};

/// Per-user and per-run ceilings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Concurrent workers per user
    pub max_goroutines: usize,
    /// Wall-clock ceiling for one run
    pub max_execution_time_secs: u64,
    /// Largest file per user (enforced by the storage layer)
    pub max_file_size_bytes: u64,
    /// File count per user (enforced by the storage layer)
    pub max_total_files: usize,
    /// Statement ceiling per run
    pub max_commands: u64,
    /// Loop/jump ceiling per run
    pub max_loop_count: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_goroutines: DEFAULT_MAX_WORKERS,
            max_execution_time_secs: DEFAULT_MAX_EXECUTION_TIME.as_secs(),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_total_files: DEFAULT_MAX_TOTAL_FILES,
            max_commands: DEFAULT_MAX_COMMANDS,
            max_loop_count: DEFAULT_MAX_LOOP_COUNT,
        }
    }
}
