//! Collaborator interfaces
//!
//! The reconciliation engine and the notification dispatcher only see these
//! traits. Production implementations live in `mountainwatch-fetch` and
//! `mountainwatch-notify`; tests substitute in-memory fakes.

use anyhow::Result;
use async_trait::async_trait;

use crate::Condition;

/// Source of condition records.
#[async_trait]
pub trait ConditionSource: Send + Sync {
    /// Ids of every condition reachable under the configured project.
    async fn candidate_ids(&self) -> Result<Vec<String>>;

    /// Fetch the detail record of `id` (with its regions) and normalize it.
    async fn fetch_condition(&self, id: &str) -> Result<Condition>;

    /// Fetch and normalize the detail record alone. Regions are not resolved,
    /// so `geometry_description` is left empty.
    async fn fetch_detail(&self, id: &str) -> Result<Condition>;
}

/// Plain-text message to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Issue to open in the ticketing system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub project_id: String,
    pub summary: String,
    pub description: String,
    pub issue_type: String,
}

#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> Result<()>;
}

#[async_trait]
pub trait TicketTransport: Send + Sync {
    /// Create the issue and return its key.
    async fn create_issue(&self, ticket: &NewTicket) -> Result<String>;
}
