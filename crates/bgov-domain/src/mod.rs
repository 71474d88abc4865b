//! # Domain Layer
//!
//! Core types for the multi-user interpreter resource governor.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error taxonomy shared by every tier |
//! | [`constants`] | Default ceilings and fair-share parameters |
//! | [`value_objects`] | Limits, statement kinds, tier policies, stats snapshots |
//! | [`ports`] | Interfaces implemented by the infrastructure layer |

pub mod constants;
pub mod error;
pub mod ports;
pub mod value_objects;

pub use error::{Error, LimitKind, Result};
pub use ports::{ProcessSample, ProcessSampler};
pub use value_objects::*;
