use std::collections::HashSet;
use std::sync::Arc;

use mountainwatch_core::{ChangeEvent, Condition, ConditionSource};
use mountainwatch_storage::Storage;

use crate::ServiceError;

/// Items produced by a reconciliation pass plus the number of ids that
/// were skipped because of a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T> {
    pub items: Vec<T>,
    pub failed: usize,
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self { items: Vec::new(), failed: 0 }
    }
}

/// Keeps the store in line with the upstream source.
///
/// Every id is handled on its own: a failure is logged and the pass moves on
/// to the next id.
pub struct ReconciliationEngine {
    storage: Arc<Storage>,
    source: Arc<dyn ConditionSource>,
}

impl ReconciliationEngine {
    #[must_use]
    pub fn new(storage: Arc<Storage>, source: Arc<dyn ConditionSource>) -> Self {
        Self { storage, source }
    }

    pub async fn candidate_ids(&self) -> Result<Vec<String>, ServiceError> {
        self.source.candidate_ids().await.map_err(ServiceError::Source)
    }

    /// Inserts every candidate not yet stored and returns the newly inserted records.
    pub async fn ingest(&self, candidate_ids: &[String]) -> Vec<Condition> {
        self.ingest_batch(candidate_ids).await.items
    }

    pub async fn ingest_batch(&self, candidate_ids: &[String]) -> Batch<Condition> {
        let mut seen = HashSet::new();
        let mut batch = Batch::default();

        for id in candidate_ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            match self.ingest_one(id).await {
                Ok(Some(condition)) => {
                    tracing::info!(id = %condition.id, status = %condition.status, "New condition stored");
                    batch.items.push(condition);
                },
                Ok(None) => {},
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "Skipping candidate");
                    batch.failed += 1;
                },
            }
        }
        batch
    }

    async fn ingest_one(&self, id: &str) -> Result<Option<Condition>, ServiceError> {
        if self.storage.condition_exists(id)? {
            tracing::debug!(id = %id, "Already stored");
            return Ok(None);
        }
        let condition = self.fetch(id).await?;
        if self.storage.insert_condition(&condition)? {
            Ok(Some(condition))
        } else {
            tracing::debug!(id = %id, "Inserted concurrently, ignoring");
            Ok(None)
        }
    }

    /// Re-fetches each stored record and persists status transitions.
    pub async fn detect_changes(&self, stored: &[Condition]) -> Vec<ChangeEvent> {
        self.detect_batch(stored).await.items
    }

    pub async fn detect_batch(&self, stored: &[Condition]) -> Batch<ChangeEvent> {
        let mut batch = Batch::default();
        for condition in stored {
            match self.detect_one(condition).await {
                Ok(Some(change)) => {
                    tracing::info!(
                        id = %change.id,
                        old = %change.old_status,
                        new = %change.new_status,
                        "Status changed"
                    );
                    batch.items.push(change);
                },
                Ok(None) => {},
                Err(e) => {
                    tracing::warn!(id = %condition.id, error = %e, "Status check failed");
                    batch.failed += 1;
                },
            }
        }
        batch
    }

    async fn detect_one(&self, stored: &Condition) -> Result<Option<ChangeEvent>, ServiceError> {
        let fresh = self.fetch_detail(&stored.id).await?;
        if fresh.status == stored.status {
            return Ok(None);
        }
        if !self.storage.update_status(&stored.id, &fresh.status)? {
            // Row already carries the fresh status; the pending sweep owns it now.
            tracing::debug!(id = %stored.id, "Status already up to date");
            return Ok(None);
        }
        Ok(Some(ChangeEvent {
            id: fresh.id,
            old_status: stored.status.clone(),
            new_status: fresh.status,
            title: fresh.title,
        }))
    }

    /// Fetches `id` and stores it when absent.
    ///
    /// For a known row the fresh detail wins: its status is persisted and the
    /// returned record carries the fresh fields with the stored processing
    /// state and geometry description.
    pub async fn fetch_and_store(&self, id: &str) -> Result<Condition, ServiceError> {
        let Some(stored) = self.storage.get_condition(id)? else {
            let fresh = self.fetch(id).await?;
            if self.storage.insert_condition(&fresh)? {
                tracing::info!(id = %id, "Condition stored");
            }
            return Ok(fresh);
        };

        let fresh = self.fetch_detail(id).await?;
        if self.storage.update_status(id, &fresh.status)? {
            tracing::info!(id = %id, old = %stored.status, new = %fresh.status, "Status refreshed");
        }
        Ok(Condition {
            processed: stored.processed,
            date_processed: stored.date_processed,
            geometry_description: stored.geometry_description,
            ..fresh
        })
    }

    /// Status changes persisted by an earlier run whose notification never completed.
    pub fn pending_changes(&self) -> Result<Vec<ChangeEvent>, ServiceError> {
        Ok(self
            .storage
            .pending_status_notifications()?
            .into_iter()
            .map(|pending| ChangeEvent {
                id: pending.id,
                old_status: pending.notified_status,
                new_status: pending.status,
                title: pending.title,
            })
            .collect())
    }

    /// Records inserted by an earlier run but never processed.
    pub fn unprocessed(&self) -> Result<Vec<Condition>, ServiceError> {
        Ok(self.storage.unprocessed_conditions()?)
    }

    pub fn stored(&self) -> Result<Vec<Condition>, ServiceError> {
        Ok(self.storage.all_conditions()?)
    }

    async fn fetch(&self, id: &str) -> Result<Condition, ServiceError> {
        let condition = self.source.fetch_condition(id).await.map_err(ServiceError::Source)?;
        requested(id, condition)
    }

    /// Detail only; status checks never touch regions.
    async fn fetch_detail(&self, id: &str) -> Result<Condition, ServiceError> {
        let condition = self.source.fetch_detail(id).await.map_err(ServiceError::Source)?;
        requested(id, condition)
    }
}

fn requested(id: &str, condition: Condition) -> Result<Condition, ServiceError> {
    if condition.id != id {
        return Err(ServiceError::InvalidInput(format!(
            "asked for condition {id}, source returned {}",
            condition.id
        )));
    }
    Ok(condition)
}
