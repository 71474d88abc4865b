//! Application Layer - Basic Governor
//!
//! In-process resource governor for a server that hosts many users, each
//! running an interpreted program without OS-level isolation.
//!
//! ## Architecture
//!
//! Three tiers, composed explicitly:
//! - [`SystemResourceManager`]: user registry, fair-share limits, system monitor
//! - [`ExecutionGovernor`]: one run per user, per-statement checks, memory guard
//! - [`SessionGovernor`]: transport sessions, session caps, rate windows, idle sweep
//!
//! Construct the stack once at process start and pass it by `Arc` to the
//! transport and interpreter layers.
//!
//! ## Dependencies
//!
//! This crate depends only on:
//! - `bgov-domain`: limits, policies, error taxonomy, sampler port
//! - `tokio` / `tokio-util`: clocks, tickers, cancellation scopes

pub mod governor;

pub use governor::*;
