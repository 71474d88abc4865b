//! Shared fixtures for governor tests

#![allow(dead_code)]

use bgov_application::{ExecutionGovernor, SessionGovernor, SystemResourceManager};
use bgov_domain::ports::{ProcessSample, ProcessSampler, SharedSampler};
use bgov_domain::{ExecutionPolicy, Result, SessionPolicy, SystemPolicy};
use std::sync::{Arc, Mutex};

/// Host RAM reported by default; pool is 4096 - 256 = 3840MB
pub const HOST_MB: u64 = 4096;

/// Sampler returning whatever the test last set
pub struct FixedSampler {
    sample: Mutex<ProcessSample>,
}

impl FixedSampler {
    pub fn new(total_memory_mb: u64) -> Arc<Self> {
        Arc::new(Self {
            sample: Mutex::new(ProcessSample {
                total_memory_mb,
                ..ProcessSample::default()
            }),
        })
    }

    pub fn set_process(&self, memory_mb: u64, cpu_percent: f64) {
        let mut sample = self.sample.lock().unwrap();
        sample.process_memory_mb = memory_mb;
        sample.process_cpu_percent = cpu_percent;
    }
}

impl ProcessSampler for FixedSampler {
    fn sample(&self) -> Result<ProcessSample> {
        Ok(*self.sample.lock().unwrap())
    }

    fn total_memory_mb(&self) -> u64 {
        self.sample.lock().unwrap().total_memory_mb
    }
}

/// All three tiers plus the sampler driving them
pub struct Stack {
    pub sampler: Arc<FixedSampler>,
    pub system: Arc<SystemResourceManager>,
    pub execution: Arc<ExecutionGovernor>,
    pub session: Arc<SessionGovernor>,
}

pub fn system_with(policy: SystemPolicy) -> (Arc<SystemResourceManager>, Arc<FixedSampler>) {
    let sampler = FixedSampler::new(HOST_MB);
    let shared: SharedSampler = sampler.clone();
    (Arc::new(SystemResourceManager::new(policy, shared)), sampler)
}

pub fn stack_with(system: SystemPolicy, execution: ExecutionPolicy, session: SessionPolicy) -> Stack {
    let (system, sampler) = system_with(system);
    let execution = Arc::new(ExecutionGovernor::new(Arc::clone(&system), execution));
    let session = Arc::new(SessionGovernor::new(Arc::clone(&execution), session));
    Stack {
        sampler,
        system,
        execution,
        session,
    }
}

pub fn default_stack() -> Stack {
    stack_with(
        SystemPolicy::default(),
        ExecutionPolicy::default(),
        SessionPolicy::default(),
    )
}
