use super::{BatchExecutor, BatchReceipt, EventStore};
use crate::error::CoreError;
use crate::models::{EventRecord, EventStatus, ReminderEntry};
use crate::plan::{EventRef, MutationPlan, Operation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Full contents of a [`MemoryStore`], serializable for persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Event rows; their `reminders` field is always empty here.
    #[serde(default)]
    pub events: BTreeMap<Uuid, EventRecord>,
    #[serde(default)]
    pub reminders: BTreeMap<Uuid, Vec<ReminderEntry>>,
}

impl StoreSnapshot {
    fn event_mut(&mut self, id: Uuid) -> Result<&mut EventRecord, CoreError> {
        self.events
            .get_mut(&id)
            .ok_or_else(|| CoreError::Store(format!("event {} does not exist", id)))
    }

    fn remove_event(&mut self, id: Uuid) -> Result<EventRecord, CoreError> {
        self.reminders.remove(&id);
        self.events
            .remove(&id)
            .ok_or_else(|| CoreError::Store(format!("event {} does not exist", id)))
    }

    fn insert_event(&mut self, record: &EventRecord) -> Uuid {
        let id = Uuid::now_v7();
        let mut row = record.clone();
        row.id = Some(id);
        row.anchor_id = row.rule.as_ref().map(|_| id);
        row.reminders = Vec::new();
        self.events.insert(id, row);
        id
    }

    fn apply(&mut self, plan: MutationPlan) -> Result<BatchReceipt, CoreError> {
        let mut receipt = BatchReceipt::default();

        for (index, operation) in plan.into_iter().enumerate() {
            tracing::trace!(index, op = operation.name(), "applying operation");
            match operation {
                Operation::UpdateSeriesRule {
                    series_id,
                    rule,
                    anchor_start,
                } => {
                    let event = self.event_mut(series_id)?;
                    if event.rule.is_none() {
                        return Err(CoreError::Store(format!(
                            "event {} is not a recurring series",
                            series_id
                        )));
                    }
                    event.rule = Some(rule);
                    event.start = anchor_start;
                }
                Operation::UpdateEvent {
                    event_id,
                    record,
                    time_fields,
                } => {
                    let event = self.event_mut(event_id)?;
                    if time_fields {
                        event.start = record.start;
                        event.extent = record.extent;
                        event.all_day = record.all_day;
                        event.timezone = record.timezone.clone();
                        event.rule = record.rule.clone();
                        event.anchor_id = event.rule.as_ref().map(|_| event_id);
                    }
                    event.calendar_id = record.calendar_id;
                    event.owner_account = record.owner_account.clone();
                    event.title = record.title.clone();
                    event.description = record.description.clone();
                    event.location = record.location.clone();
                    event.status = record.status;
                }
                Operation::DeleteSeries { series_id } => {
                    let removed = self.remove_event(series_id)?;
                    if removed.rule.is_none() {
                        return Err(CoreError::Store(format!(
                            "event {} is not a recurring series",
                            series_id
                        )));
                    }
                }
                Operation::DeleteEvent { event_id } => {
                    self.remove_event(event_id)?;
                }
                Operation::CancelInstance { event_id } => {
                    self.event_mut(event_id)?.status = EventStatus::Canceled;
                }
                Operation::InsertSeries { record }
                | Operation::InsertStandaloneInstance { record }
                | Operation::InsertEvent { record } => {
                    let id = self.insert_event(&record);
                    receipt.inserted.insert(index, id);
                }
                Operation::ReconcileReminders { event, adds, .. } => {
                    let id = match event {
                        EventRef::Id(id) => {
                            self.event_mut(id)?;
                            id
                        }
                        EventRef::Pending(target) => receipt.id_for(target).ok_or_else(|| {
                            CoreError::Store(format!(
                                "operation #{} refers to #{}, which is not an earlier insert",
                                index, target
                            ))
                        })?,
                    };
                    if adds.is_empty() {
                        self.reminders.remove(&id);
                    } else {
                        self.reminders.insert(id, adds);
                    }
                }
            }
        }

        Ok(receipt)
    }
}

/// In-memory event store.
///
/// A batch is applied to a copy of the current state, which replaces the
/// state only once every operation has succeeded.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        self.state.read().await.clone()
    }

    /// Seed a row directly, bypassing planning. Returns the assigned id.
    pub async fn seed(&self, record: EventRecord) -> Uuid {
        let mut state = self.state.write().await;
        let id = state.insert_event(&record);
        if !record.reminders.is_empty() {
            state.reminders.insert(id, record.reminders);
        }
        id
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn find_event(&self, id: Uuid) -> Result<Option<EventRecord>, CoreError> {
        let state = self.state.read().await;
        Ok(state.events.get(&id).map(|event| {
            let mut event = event.clone();
            event.reminders = state.reminders.get(&id).cloned().unwrap_or_default();
            event
        }))
    }

    async fn find_reminders(&self, event_id: Uuid) -> Result<Vec<ReminderEntry>, CoreError> {
        let state = self.state.read().await;
        Ok(state.reminders.get(&event_id).cloned().unwrap_or_default())
    }

    async fn list_events(&self) -> Result<Vec<EventRecord>, CoreError> {
        let state = self.state.read().await;
        Ok(state
            .events
            .iter()
            .map(|(id, event)| {
                let mut event = event.clone();
                event.reminders = state.reminders.get(id).cloned().unwrap_or_default();
                event
            })
            .collect())
    }
}

#[async_trait]
impl BatchExecutor for MemoryStore {
    #[tracing::instrument(level = "debug", skip(self, plan), fields(operations = plan.len()))]
    async fn execute_batch(&self, plan: MutationPlan) -> Result<BatchReceipt, CoreError> {
        let mut state = self.state.write().await;
        let mut working = state.clone();
        match working.apply(plan) {
            Ok(receipt) => {
                *state = working;
                tracing::debug!(inserted = receipt.inserted.len(), "batch committed");
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(error = %err, "batch rolled back");
                Err(err)
            }
        }
    }
}
