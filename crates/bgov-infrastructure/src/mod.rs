//! Infrastructure layer
//!
//! | Module | Provides |
//! |--------|----------|
//! | [`config`] | figment-backed loading, validation and TOML export |
//! | [`logging`] | tracing subscriber setup |
//! | [`error_ext`] | context helpers for foreign errors |
//! | [`sampler`] | sysinfo implementation of `ProcessSampler` |
//! | [`shutdown`] | background task lifecycle |
//! | [`bootstrap`] | builds the governor stack from configuration |

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod error_ext;
pub mod logging;
pub mod sampler;
pub mod shutdown;

pub use bootstrap::GovernorStack;
pub use config::{AppConfig, ConfigBuilder, ConfigLoader};
pub use sampler::SysinfoSampler;
pub use shutdown::ShutdownCoordinator;
