//! Configuration types
//!
//! One struct per TOML section. Durations are stored as whole seconds.

mod app;
mod execution;
mod logging;
mod security;
mod system;

pub use app::AppConfig;
pub use execution::ExecutionConfig;
pub use logging::LoggingConfig;
pub use security::SecurityConfig;
pub use system::SystemConfig;
