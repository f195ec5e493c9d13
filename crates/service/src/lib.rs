//! Service layer for mountainwatch
//!
//! Reconciles upstream conditions with the store and dispatches the
//! resulting notifications. Collaborators are injected as trait objects.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::cognitive_complexity, reason = "Complex async flows are inherent")]
#![allow(clippy::min_ident_chars, reason = "Short error vars are idiomatic")]

mod dispatcher;
mod engine;
mod error;
mod message;
mod watcher;

#[cfg(test)]
mod tests;

pub use dispatcher::{
    Delivery, DispatchResult, DispatchSettings, NotificationDispatcher, TicketOutcome,
};
pub use engine::{Batch, ReconciliationEngine};
pub use error::ServiceError;
pub use message::Composed;
pub use watcher::{RunReport, Watcher};
