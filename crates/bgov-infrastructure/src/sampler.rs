//! sysinfo-backed process sampler

use bgov_domain::error::{Error, Result};
use bgov_domain::ports::{ProcessSample, ProcessSampler};
use std::sync::Mutex;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::debug;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Samples this process's RSS and CPU plus host RAM
///
/// CPU usage is a delta between refreshes, so the first sample reads 0.
pub struct SysinfoSampler {
    system: Mutex<System>,
    pid: Pid,
}

impl SysinfoSampler {
    pub fn new() -> Result<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|err| Error::internal(format!("cannot resolve current pid: {err}")))?;
        let mut system = System::new();
        system.refresh_memory();
        debug!(pid = %pid, total_memory_mb = system.total_memory() / BYTES_PER_MB, "Process sampler ready");
        Ok(Self {
            system: Mutex::new(system),
            pid,
        })
    }
}

impl ProcessSampler for SysinfoSampler {
    fn sample(&self) -> Result<ProcessSample> {
        let mut system = self.system.lock()?;
        system.refresh_memory();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );
        let process = system
            .process(self.pid)
            .ok_or_else(|| Error::internal(format!("process {} vanished from sysinfo", self.pid)))?;

        Ok(ProcessSample {
            process_memory_mb: process.memory() / BYTES_PER_MB,
            process_cpu_percent: f64::from(process.cpu_usage()),
            total_memory_mb: system.total_memory() / BYTES_PER_MB,
            worker_tasks: live_tasks(),
        })
    }

    fn total_memory_mb(&self) -> u64 {
        self.system
            .lock()
            .map(|mut system| {
                system.refresh_memory();
                system.total_memory() / BYTES_PER_MB
            })
            .unwrap_or(0)
    }
}

/// Alive tasks in the current tokio runtime, 0 outside one
fn live_tasks() -> usize {
    tokio::runtime::Handle::try_current()
        .map(|handle| handle.metrics().num_alive_tasks())
        .unwrap_or(0)
}
