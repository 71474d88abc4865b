//! Value Objects
//!
//! Immutable values passed between the governor tiers and their callers.

pub mod limits;
pub mod policy;
pub mod statement;
pub mod stats;

pub use limits::ResourceLimits;
pub use policy::{ExecutionPolicy, SessionPolicy, SystemPolicy};
pub use statement::StatementKind;
pub use stats::{ExecutionStats, RunningExecution, SessionStats, SessionSummary, SystemStats, UserSummary};
