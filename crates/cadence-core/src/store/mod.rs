use crate::error::CoreError;
use crate::models::{EventRecord, ReminderEntry};
use crate::plan::MutationPlan;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub mod memory;

pub use memory::{MemoryStore, StoreSnapshot};

// Traits are defined in this module and implemented in respective backend modules

/// Read access to persisted events and their reminders
#[async_trait]
pub trait EventStore: Send + Sync {
    /// The stored event with its reminders filled in.
    async fn find_event(&self, id: Uuid) -> Result<Option<EventRecord>, CoreError>;
    async fn find_reminders(&self, event_id: Uuid) -> Result<Vec<ReminderEntry>, CoreError>;
    async fn list_events(&self) -> Result<Vec<EventRecord>, CoreError>;
}

/// Applies a [`MutationPlan`] atomically: every operation commits or none does.
#[async_trait]
pub trait BatchExecutor: Send + Sync {
    async fn execute_batch(&self, plan: MutationPlan) -> Result<BatchReceipt, CoreError>;
}

/// Ids assigned to the rows a batch inserted, keyed by operation index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    pub inserted: BTreeMap<usize, Uuid>,
}

impl BatchReceipt {
    pub fn id_for(&self, index: usize) -> Option<Uuid> {
        self.inserted.get(&index).copied()
    }

    pub fn inserted_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.inserted.values().copied()
    }
}
