//! # Basic Governor
//!
//! Three-tier resource governor for a multi-user BASIC interpreter service.
//! It decides who may connect, how fast they may send, how long and how far
//! their programs may run, and what CPU and RAM share each user gets.
//!
//! ```ignore
//! use bgov::infrastructure::{AppConfig, GovernorStack, SysinfoSampler};
//! use std::sync::Arc;
//!
//! let stack = GovernorStack::from_config(&AppConfig::default(), Arc::new(SysinfoSampler::new()?));
//! stack.session.register_session("s1", "alice", "10.0.0.1")?;
//! let run = stack.session.start_basic_execution("alice", "10 PRINT 1")?;
//! stack.session.check_basic_execution("alice", StatementKind::Other)?;
//! ```
//!
//! ## Architecture
//!
//! - `domain` - error taxonomy, limits, policies, stats snapshots, sampler port
//! - `application` - the session, execution and system tiers
//! - `infrastructure` - config, logging, sysinfo sampler, shutdown, bootstrap

/// Domain layer - limits, policies, errors and ports
pub mod domain {
    pub use bgov_domain::*;
}

/// Application layer - the governor tiers
pub mod application {
    pub use bgov_application::*;
}

/// Infrastructure layer - config, logging and lifecycle
pub mod infrastructure {
    pub use bgov_infrastructure::*;
}

pub use bgov_application::{
    ExecutionGovernor, ExecutionHandle, SessionGovernor, StopReason, SystemResourceManager,
    WorkerPermit,
};
pub use bgov_domain::{Error, LimitKind, Result, StatementKind};
