//! Configuration
//!
//! TOML file + `BGOV__` environment overrides, merged over defaults with
//! Figment. Read once at process start.

pub mod loader;
pub mod types;

pub use loader::{ConfigBuilder, ConfigLoader};
pub use types::{AppConfig, ExecutionConfig, LoggingConfig, SecurityConfig, SystemConfig};
