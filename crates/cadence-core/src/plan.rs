use crate::models::{EventRecord, ReminderEntry};
use crate::rule::RecurrenceRule;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies the event an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventRef {
    /// An event that already exists in the store
    Id(Uuid),
    /// The event created by the insert at this index of the same plan
    Pending(usize),
}

impl fmt::Display for EventRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventRef::Id(id) => write!(f, "{}", id),
            EventRef::Pending(index) => write!(f, "<op #{}>", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Rewrite a series' rule and `DTSTART`, leaving every other field alone.
    UpdateSeriesRule {
        series_id: Uuid,
        rule: RecurrenceRule,
        anchor_start: DateTime<Utc>,
    },
    /// In-place update of an existing event.
    ///
    /// With `time_fields` unset the executor keeps the stored start,
    /// extent, all-day flag, rule and timezone.
    UpdateEvent {
        event_id: Uuid,
        record: Box<EventRecord>,
        time_fields: bool,
    },
    DeleteSeries {
        series_id: Uuid,
    },
    DeleteEvent {
        event_id: Uuid,
    },
    /// Soft delete: the exception stays, marked canceled.
    CancelInstance {
        event_id: Uuid,
    },
    InsertSeries {
        record: Box<EventRecord>,
    },
    InsertStandaloneInstance {
        record: Box<EventRecord>,
    },
    InsertEvent {
        record: Box<EventRecord>,
    },
    /// Replace every reminder of `event` with `adds`.
    ///
    /// `removes` lists the reminders the event had when the plan was built.
    ReconcileReminders {
        event: EventRef,
        adds: Vec<ReminderEntry>,
        removes: Vec<ReminderEntry>,
    },
}

impl Operation {
    pub fn is_insert(&self) -> bool {
        matches!(
            self,
            Operation::InsertSeries { .. }
                | Operation::InsertStandaloneInstance { .. }
                | Operation::InsertEvent { .. }
        )
    }

    /// Whether applying this operation touches start, extent, rule or timezone.
    pub fn is_time_related(&self) -> bool {
        match self {
            Operation::UpdateSeriesRule { .. } => true,
            Operation::UpdateEvent { time_fields, .. } => *time_fields,
            Operation::ReconcileReminders { .. }
            | Operation::CancelInstance { .. } => false,
            Operation::DeleteSeries { .. }
            | Operation::DeleteEvent { .. }
            | Operation::InsertSeries { .. }
            | Operation::InsertStandaloneInstance { .. }
            | Operation::InsertEvent { .. } => true,
        }
    }

    pub fn is_reminder_related(&self) -> bool {
        matches!(self, Operation::ReconcileReminders { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::UpdateSeriesRule { .. } => "update-series-rule",
            Operation::UpdateEvent { .. } => "update-event",
            Operation::DeleteSeries { .. } => "delete-series",
            Operation::DeleteEvent { .. } => "delete-event",
            Operation::CancelInstance { .. } => "cancel-instance",
            Operation::InsertSeries { .. } => "insert-series",
            Operation::InsertStandaloneInstance { .. } => "insert-instance",
            Operation::InsertEvent { .. } => "insert-event",
            Operation::ReconcileReminders { .. } => "reconcile-reminders",
        }
    }
}

/// Ordered operations produced for one user action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationPlan {
    operations: Vec<Operation>,
}

impl MutationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `operation`, returning its index for back-references.
    pub fn push(&mut self, operation: Operation) -> usize {
        self.operations.push(operation);
        self.operations.len() - 1
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn time_operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| op.is_time_related())
    }

    pub fn reminder_operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| op.is_reminder_related())
    }

    pub fn inserted_indices(&self) -> Vec<usize> {
        self.operations
            .iter()
            .enumerate()
            .filter(|(_, op)| op.is_insert())
            .map(|(index, _)| index)
            .collect()
    }
}

impl IntoIterator for MutationPlan {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

impl<'a> IntoIterator for &'a MutationPlan {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

/// Result of planning one request.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// The edit changes nothing; the save is skipped.
    Unchanged,
    Planned(MutationPlan),
}

impl PlanOutcome {
    pub fn plan(&self) -> Option<&MutationPlan> {
        match self {
            PlanOutcome::Unchanged => None,
            PlanOutcome::Planned(plan) => Some(plan),
        }
    }

    pub fn into_plan(self) -> Option<MutationPlan> {
        match self {
            PlanOutcome::Unchanged => None,
            PlanOutcome::Planned(plan) => Some(plan),
        }
    }
}
