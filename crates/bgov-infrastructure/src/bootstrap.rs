//! Governor stack wiring
//!
//! Builds the three tiers from an [`AppConfig`] by explicit composition and
//! starts their background loops under a [`ShutdownCoordinator`].

use crate::config::AppConfig;
use crate::shutdown::ShutdownCoordinator;
use bgov_application::{ExecutionGovernor, SessionGovernor, SystemResourceManager};
use bgov_domain::error::Result;
use bgov_domain::ports::SharedSampler;
use bgov_domain::value_objects::{SessionStats, SystemStats};
use std::sync::Arc;
use tracing::info;

/// The composed governor, bottom tier first
#[derive(Clone)]
pub struct GovernorStack {
    pub system: Arc<SystemResourceManager>,
    pub execution: Arc<ExecutionGovernor>,
    pub session: Arc<SessionGovernor>,
}

impl GovernorStack {
    pub fn from_config(config: &AppConfig, sampler: SharedSampler) -> Self {
        let system = Arc::new(SystemResourceManager::new(config.system_policy(), sampler));
        let execution = Arc::new(ExecutionGovernor::new(
            Arc::clone(&system),
            config.execution_policy(),
        ));
        let session = Arc::new(SessionGovernor::new(
            Arc::clone(&execution),
            config.session_policy(),
        ));

        info!(
            max_concurrent_users = config.system.max_concurrent_users,
            available_memory_mb = system.available_memory_mb(),
            max_sessions_per_user = config.security.max_sessions_per_user,
            max_sessions_per_ip = config.security.max_sessions_per_ip,
            "Governor stack assembled"
        );
        Self {
            system,
            execution,
            session,
        }
    }

    /// Start the system monitor, memory guard and idle sweep
    pub fn spawn_monitors(&self, coordinator: &ShutdownCoordinator) {
        let system = Arc::clone(&self.system);
        coordinator.spawn_cancellable("system-monitor", move |token| system.run_monitor(token));

        let execution = Arc::clone(&self.execution);
        coordinator.spawn_cancellable("memory-guard", move |token| {
            execution.run_memory_guard(token)
        });

        let session = Arc::clone(&self.session);
        coordinator.spawn_cancellable("idle-sweep", move |token| session.run_idle_sweep(token));
    }

    /// System and session snapshots taken back to back
    pub fn snapshot(&self) -> Result<(SystemStats, SessionStats)> {
        Ok((self.session.system_stats()?, self.session.session_stats()?))
    }
}
