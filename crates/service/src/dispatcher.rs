use std::sync::Arc;

use mountainwatch_core::{
    ActionMode, MessageTransport, NewTicket, NotificationEvent, OutgoingMessage, Settings,
    TicketTransport,
};
use mountainwatch_storage::Storage;

use crate::{Composed, ServiceError};

/// Addresses and ticket fields used for every dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub from: String,
    pub to: String,
    pub link_base: String,
    pub project_id: String,
    pub issue_type: String,
    pub mark_processed_on_ticket_failure: bool,
}

impl DispatchSettings {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let (project_id, issue_type) = settings
            .jira
            .as_ref()
            .map(|jira| (jira.project_id.clone(), jira.issue_type.clone()))
            .unwrap_or_default();
        Self {
            from: settings.mail.from.clone(),
            to: settings.mail.to.clone(),
            link_base: settings.link_base.clone(),
            project_id,
            issue_type,
            mark_processed_on_ticket_failure: settings.mark_processed_on_ticket_failure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketOutcome {
    Created(String),
    Failed,
}

/// What a dispatch attempt actually delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    pub message_sent: bool,
    pub ticket: Option<TicketOutcome>,
    pub fallback_sent: bool,
    /// Whether the processed flag or the notified status was written
    pub marked: bool,
}

impl Delivery {
    /// Every channel required by `mode` succeeded.
    #[must_use]
    pub fn is_complete(&self, mode: ActionMode) -> bool {
        (!mode.sends_message() || self.message_sent)
            && (!mode.creates_ticket() || matches!(self.ticket, Some(TicketOutcome::Created(_))))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    Dispatched(Delivery),
    /// New-record event for a row that is already processed
    AlreadyProcessed,
    /// Change event whose status was already announced
    AlreadyNotified,
}

/// Delivers notifications and records that they went out.
///
/// Each event is announced at most once: new records through the
/// `processed` flag, status changes through the stored `notified_status`.
pub struct NotificationDispatcher {
    storage: Arc<Storage>,
    messenger: Arc<dyn MessageTransport>,
    tickets: Option<Arc<dyn TicketTransport>>,
    settings: DispatchSettings,
}

impl NotificationDispatcher {
    #[must_use]
    pub fn new(
        storage: Arc<Storage>,
        messenger: Arc<dyn MessageTransport>,
        tickets: Option<Arc<dyn TicketTransport>>,
        settings: DispatchSettings,
    ) -> Self {
        Self { storage, messenger, tickets, settings }
    }

    /// Fails when `mode` needs a transport this dispatcher does not have.
    pub fn ensure_supports(&self, mode: ActionMode) -> Result<(), ServiceError> {
        if mode.creates_ticket() && self.tickets.is_none() {
            return Err(ServiceError::NotConfigured(format!(
                "action mode {mode} creates tickets but no ticket transport is configured"
            )));
        }
        Ok(())
    }

    pub async fn dispatch(
        &self,
        event: &NotificationEvent,
        mode: ActionMode,
    ) -> Result<DispatchResult, ServiceError> {
        self.dispatch_inner(event, mode, false).await
    }

    /// Dispatches even when the event was already handled.
    pub async fn dispatch_forced(
        &self,
        event: &NotificationEvent,
        mode: ActionMode,
    ) -> Result<DispatchResult, ServiceError> {
        self.dispatch_inner(event, mode, true).await
    }

    async fn dispatch_inner(
        &self,
        event: &NotificationEvent,
        mode: ActionMode,
        force: bool,
    ) -> Result<DispatchResult, ServiceError> {
        self.ensure_supports(mode)?;
        let id = event.condition_id();

        if !force {
            if let Some(skip) = self.already_handled(event)? {
                tracing::debug!(id = %id, result = ?skip, "Skipping dispatch");
                return Ok(skip);
            }
        }

        let composed = match event {
            NotificationEvent::NewCondition(condition) => {
                Composed::new_condition(condition, &self.settings.link_base)
            },
            NotificationEvent::StatusChanged(change) => {
                Composed::status_change(change, &self.settings.link_base)
            },
        };

        let mut delivery = Delivery::default();
        if mode.sends_message() {
            delivery.message_sent = self.send(&composed).await;
        }
        if mode.creates_ticket() {
            let outcome = self.open_ticket(&composed).await;
            if let Err(e) = &outcome {
                delivery.fallback_sent = self.send(&Composed::ticket_failure(&composed, e)).await;
            }
            delivery.ticket = Some(outcome.map_or(TicketOutcome::Failed, TicketOutcome::Created));
        }

        delivery.marked = match event {
            NotificationEvent::NewCondition(_) => {
                let ticket_failed = matches!(delivery.ticket, Some(TicketOutcome::Failed));
                if ticket_failed && !self.settings.mark_processed_on_ticket_failure {
                    tracing::warn!(id = %id, "Ticket failed, leaving condition unprocessed");
                    false
                } else {
                    let today = chrono::Local::now().date_naive();
                    self.storage.mark_processed(id, today)?
                }
            },
            NotificationEvent::StatusChanged(change) => {
                self.storage.mark_status_notified(id, &change.new_status)?
            },
        };

        Ok(DispatchResult::Dispatched(delivery))
    }

    fn already_handled(
        &self,
        event: &NotificationEvent,
    ) -> Result<Option<DispatchResult>, ServiceError> {
        Ok(match event {
            NotificationEvent::NewCondition(condition) => self
                .storage
                .is_processed(&condition.id)?
                .filter(|processed| *processed)
                .map(|_| DispatchResult::AlreadyProcessed),
            NotificationEvent::StatusChanged(change) => self
                .storage
                .notified_status(&change.id)?
                .filter(|notified| *notified == change.new_status)
                .map(|_| DispatchResult::AlreadyNotified),
        })
    }

    async fn send(&self, composed: &Composed) -> bool {
        let message = OutgoingMessage {
            from: self.settings.from.clone(),
            to: self.settings.to.clone(),
            subject: composed.subject.clone(),
            body: composed.body.clone(),
        };
        match self.messenger.send(&message).await {
            Ok(()) => {
                tracing::info!(subject = %message.subject, "Message sent");
                true
            },
            Err(e) => {
                tracing::error!(subject = %message.subject, error = %format!("{e:#}"), "Sending message failed");
                false
            },
        }
    }

    async fn open_ticket(&self, composed: &Composed) -> anyhow::Result<String> {
        let tickets = self
            .tickets
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no ticket transport configured"))?;
        let ticket = NewTicket {
            project_id: self.settings.project_id.clone(),
            summary: composed.subject.clone(),
            description: composed.body.clone(),
            issue_type: self.settings.issue_type.clone(),
        };
        match tickets.create_issue(&ticket).await {
            Ok(key) => {
                tracing::info!(key = %key, summary = %ticket.summary, "Ticket created");
                Ok(key)
            },
            Err(e) => {
                tracing::error!(summary = %ticket.summary, error = %format!("{e:#}"), "Creating ticket failed");
                Err(e)
            },
        }
    }
}
