use mountainwatch_core::{ActionMode, NotificationEvent};

use crate::{DispatchResult, NotificationDispatcher, ReconciliationEngine, ServiceError};

/// Counters of a single `run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Events from an interrupted earlier run that were dispatched again
    pub recovered: usize,
    pub inserted: usize,
    pub changed: usize,
    pub notified: usize,
    pub failed: usize,
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "inserted: {}, changed: {}, recovered: {}, notified: {}, failed: {}",
            self.inserted, self.changed, self.recovered, self.notified, self.failed
        )
    }
}

/// One watch pass: recover, ingest, detect, notify.
pub struct Watcher {
    engine: ReconciliationEngine,
    dispatcher: NotificationDispatcher,
    mode: ActionMode,
}

impl Watcher {
    pub fn new(
        engine: ReconciliationEngine,
        dispatcher: NotificationDispatcher,
        mode: ActionMode,
    ) -> Result<Self, ServiceError> {
        dispatcher.ensure_supports(mode)?;
        Ok(Self { engine, dispatcher, mode })
    }

    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::default();

        self.recover(&mut report).await;

        let candidates = match self.engine.candidate_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(error = %e, "Candidate list unavailable, nothing to ingest");
                report.failed += 1;
                Vec::new()
            },
        };
        tracing::info!(count = candidates.len(), "Candidates fetched");

        let ingested = self.engine.ingest_batch(&candidates).await;
        report.inserted = ingested.items.len();
        report.failed += ingested.failed;
        for condition in ingested.items {
            self.notify(NotificationEvent::NewCondition(condition), &mut report).await;
        }

        let stored = match self.engine.stored() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(error = %e, "Reading stored conditions failed");
                report.failed += 1;
                Vec::new()
            },
        };
        let detected = self.engine.detect_batch(&stored).await;
        report.changed = detected.items.len();
        report.failed += detected.failed;
        for change in detected.items {
            self.notify(NotificationEvent::StatusChanged(change), &mut report).await;
        }

        tracing::info!(%report, "Run finished");
        report
    }

    /// Fetches `id`, stores it when absent and dispatches it even if already processed.
    pub async fn process(&self, id: &str) -> Result<DispatchResult, ServiceError> {
        let condition = self.engine.fetch_and_store(id).await?;
        self.dispatcher
            .dispatch_forced(&NotificationEvent::NewCondition(condition), self.mode)
            .await
    }

    async fn recover(&self, report: &mut RunReport) {
        let mut events = Vec::new();
        match self.engine.unprocessed() {
            Ok(rows) => events.extend(rows.into_iter().map(NotificationEvent::NewCondition)),
            Err(e) => {
                tracing::error!(error = %e, "Reading unprocessed conditions failed");
                report.failed += 1;
            },
        }
        match self.engine.pending_changes() {
            Ok(changes) => events.extend(changes.into_iter().map(NotificationEvent::StatusChanged)),
            Err(e) => {
                tracing::error!(error = %e, "Reading pending status changes failed");
                report.failed += 1;
            },
        }

        if !events.is_empty() {
            tracing::info!(count = events.len(), "Recovering notifications of an interrupted run");
        }
        for event in events {
            if self.notify(event, report).await {
                report.recovered += 1;
            }
        }
    }

    async fn notify(&self, event: NotificationEvent, report: &mut RunReport) -> bool {
        match self.dispatcher.dispatch(&event, self.mode).await {
            Ok(DispatchResult::Dispatched(delivery)) => {
                report.notified += 1;
                if !delivery.is_complete(self.mode) {
                    report.failed += 1;
                }
                true
            },
            Ok(DispatchResult::AlreadyProcessed | DispatchResult::AlreadyNotified) => false,
            Err(e) if e.is_transient() => {
                tracing::warn!(id = %event.condition_id(), error = %e, "Dispatch deferred to the next run");
                report.failed += 1;
                false
            },
            Err(e) => {
                tracing::error!(id = %event.condition_id(), error = %e, "Dispatch failed");
                report.failed += 1;
                false
            },
        }
    }
}
