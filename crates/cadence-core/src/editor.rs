//! Async facade tying the planner to an event store.

use crate::error::CoreError;
use crate::expander::OccurrenceExpander;
use crate::models::{EditScope, EventRecord};
use crate::planner::{MutationPlanner, PlanRequest};
use crate::plan::PlanOutcome;
use crate::store::{BatchExecutor, BatchReceipt, EventStore};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Result of a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing differed from the stored event, so nothing was written.
    Unchanged,
    Applied(BatchReceipt),
}

impl SaveOutcome {
    pub fn receipt(&self) -> Option<&BatchReceipt> {
        match self {
            SaveOutcome::Unchanged => None,
            SaveOutcome::Applied(receipt) => Some(receipt),
        }
    }
}

pub struct SeriesEditor<S, E>
where
    S: EventStore + BatchExecutor,
    E: OccurrenceExpander,
{
    store: S,
    expander: E,
}

impl<S, E> SeriesEditor<S, E>
where
    S: EventStore + BatchExecutor,
    E: OccurrenceExpander,
{
    pub fn new(store: S, expander: E) -> Self {
        Self { store, expander }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn expander(&self) -> &E {
        &self.expander
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Plan `request` and apply the result in one batch.
    #[tracing::instrument(level = "debug", skip(self, request), fields(scope = %request.scope))]
    pub async fn save(&self, request: &PlanRequest) -> Result<SaveOutcome, CoreError> {
        let outcome = MutationPlanner::new(&self.expander).plan(request)?;
        match outcome {
            PlanOutcome::Unchanged => Ok(SaveOutcome::Unchanged),
            PlanOutcome::Planned(plan) => {
                let receipt = self.store.execute_batch(plan).await?;
                Ok(SaveOutcome::Applied(receipt))
            }
        }
    }

    /// Insert a new event. Returns the id it was stored under.
    #[tracing::instrument(level = "debug", skip(self, record))]
    pub async fn create(&self, record: &EventRecord) -> Result<Uuid, CoreError> {
        let plan = MutationPlanner::new(&self.expander).plan_insert(record)?;
        let receipt = self.store.execute_batch(plan).await?;
        receipt
            .id_for(0)
            .ok_or_else(|| CoreError::Store("insert did not report an id".to_string()))
    }

    /// Edit the occurrence of `event_id` that originally started at `target`.
    #[tracing::instrument(level = "debug", skip(self, edited))]
    pub async fn edit_occurrence(
        &self,
        event_id: Uuid,
        edited: EventRecord,
        target: DateTime<Utc>,
        scope: EditScope,
    ) -> Result<SaveOutcome, CoreError> {
        let original = self.load(event_id).await?;
        self.save(&PlanRequest::edit(original, edited, target, scope))
            .await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn delete_occurrence(
        &self,
        event_id: Uuid,
        target: DateTime<Utc>,
        scope: EditScope,
    ) -> Result<SaveOutcome, CoreError> {
        let original = self.load(event_id).await?;
        self.save(&PlanRequest::delete(original, target, scope)).await
    }

    async fn load(&self, event_id: Uuid) -> Result<EventRecord, CoreError> {
        let mut original = self
            .store
            .find_event(event_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(event_id.to_string()))?;
        original.reminders = self.store.find_reminders(event_id).await?;
        Ok(original)
    }
}
