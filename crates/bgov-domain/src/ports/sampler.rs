//! Process sampling port
//!
//! The governor never measures memory or CPU synchronously on a check; the
//! background monitors pull a [`ProcessSample`] through this port and cache
//! the result.

use crate::error::Result;
use std::sync::Arc;

/// One reading of process-wide resource usage
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProcessSample {
    /// Resident memory of this process, in MB
    pub process_memory_mb: u64,
    /// CPU usage of this process, in percent of one host
    pub process_cpu_percent: f64,
    /// Host RAM, in MB
    pub total_memory_mb: u64,
    /// Live async tasks in the current runtime (0 outside a runtime)
    pub worker_tasks: usize,
}

/// Source of process-wide usage readings
pub trait ProcessSampler: Send + Sync {
    /// Take a fresh reading
    fn sample(&self) -> Result<ProcessSample>;

    /// Host RAM in MB, used for the fair-share pool
    fn total_memory_mb(&self) -> u64;
}

/// Shared sampler handle
pub type SharedSampler = Arc<dyn ProcessSampler>;
