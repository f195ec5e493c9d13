//! Core types and traits for mountainwatch
//!
//! This crate contains the domain types shared across all other crates:
//! the `Condition` record, change events, the action mode, payload
//! normalization and the runtime settings.

mod condition;
mod config;
mod env_config;
mod error;
mod payload;
mod transport;

pub use condition::*;
pub use config::*;
pub use error::*;
pub use payload::*;
pub use transport::*;
