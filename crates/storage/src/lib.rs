//! Storage layer for mountainwatch
//!
//! SQLite-based store holding one row per condition, keyed by the
//! Outdooractive id.

mod error;
mod migrations;
mod storage;

pub use error::{Result, StorageError};
pub use storage::{PendingStatus, Storage};
