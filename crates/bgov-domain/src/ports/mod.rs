//! Ports
//!
//! Interfaces the application layer depends on and the infrastructure layer
//! implements.

pub mod sampler;

pub use sampler::{ProcessSample, ProcessSampler, SharedSampler};
