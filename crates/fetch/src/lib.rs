//! Outdooractive client: condition listing, detail and region lookups

mod client;
mod error;
mod pacing;
mod source;

pub use client::{OutdoorClient, truncate};
pub use error::FetchError;
pub use pacing::Pacer;
