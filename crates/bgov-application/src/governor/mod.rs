//! Governor tiers
//!
//! Three tiers composed explicitly, each holding an `Arc` to the one below:
//!
//! | Tier | Type | Owns |
//! |------|------|------|
//! | system | [`SystemResourceManager`] | registered users, fair-share limits, worker permits |
//! | execution | [`ExecutionGovernor`] | one active run per user, step ceilings, memory guard |
//! | session | [`SessionGovernor`] | connection sessions, per-user/per-IP caps, rate windows |
//!
//! Enforcement is cooperative. The interpreter must call
//! [`ExecutionGovernor::check_basic_execution`] once per statement; a
//! statement that blocks or loops internally without calling it cannot be
//! stopped by the governor.
//!
//! Lock order is always session → execution → system. Lower tiers never call
//! upwards.

mod execution;
mod session;
mod system;

pub use execution::{ExecutionGovernor, ExecutionHandle, StopReason};
pub use session::SessionGovernor;
pub use system::{SystemResourceManager, WorkerPermit};

use bgov_domain::error::Result;
use tokio::time::Instant;
use tracing::warn;

/// Log not-found results as caller bugs and pass the result through
pub(crate) fn log_caller_bug<T>(result: Result<T>, operation: &'static str, key: &str) -> Result<T> {
    if let Err(err) = &result {
        if err.is_not_found() {
            warn!(operation, key, error = %err, "Governed operation on unknown resource");
        }
    }
    result
}

pub(crate) fn epoch_millis(epoch: Instant) -> u64 {
    u64::try_from(epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
}
