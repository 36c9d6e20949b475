//! Turning one edit or delete request into an ordered mutation plan.

use crate::error::CoreError;
use crate::expander::{OccurrenceExpander, SeriesAnchor};
use crate::models::{EditScope, EventRecord, EventStatus, Extent, ReminderEntry};
use crate::plan::{EventRef, MutationPlan, Operation, PlanOutcome};
use crate::reminders::{reconcile, same_set};
use crate::rule::RecurrenceRule;
use crate::scope::{self, Action, MutationShape, Replacement, SeriesTopology, Truncation};
use crate::split::{split, SplitOutcome};
use crate::timezone::{floor_to_day, truncate_to_minute, REFERENCE_ZONE};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum PlanAction {
    Edit(Box<EventRecord>),
    Delete,
}

/// Everything needed to plan one user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// The series anchor (or the single event), as stored
    pub original: EventRecord,
    pub action: PlanAction,
    /// Start of the occurrence acted on, before any edit
    pub target_original_start: DateTime<Utc>,
    pub scope: EditScope,
}

impl PlanRequest {
    pub fn edit(
        original: EventRecord,
        edited: EventRecord,
        target_original_start: DateTime<Utc>,
        scope: EditScope,
    ) -> Self {
        Self {
            original,
            action: PlanAction::Edit(Box::new(edited)),
            target_original_start,
            scope,
        }
    }

    pub fn delete(
        original: EventRecord,
        target_original_start: DateTime<Utc>,
        scope: EditScope,
    ) -> Self {
        Self {
            original,
            action: PlanAction::Delete,
            target_original_start,
            scope,
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self.action, PlanAction::Delete)
    }

    pub fn edited(&self) -> Option<&EventRecord> {
        match &self.action {
            PlanAction::Edit(edited) => Some(edited),
            PlanAction::Delete => None,
        }
    }

    /// End of the targeted occurrence before the edit.
    fn target_original_end(&self) -> Result<DateTime<Utc>, CoreError> {
        let length = self.original.end()? - self.original.start;
        shift(self.target_original_start, length)
    }
}

/// Builds [`MutationPlan`]s. Planning never touches the store.
pub struct MutationPlanner<'a, E: OccurrenceExpander + ?Sized> {
    expander: &'a E,
}

impl<'a, E: OccurrenceExpander + ?Sized> MutationPlanner<'a, E> {
    pub fn new(expander: &'a E) -> Self {
        Self { expander }
    }

    /// Read whether `target` is the first occurrence and what follows it.
    pub fn topology(
        &self,
        original: &EventRecord,
        target: DateTime<Utc>,
    ) -> Result<SeriesTopology, CoreError> {
        let next_occurrence = match &original.rule {
            Some(rule) => self
                .expander
                .first_after(rule, &SeriesAnchor::of(original)?, target)?
                .map(truncate_to_minute),
            None => None,
        };
        Ok(SeriesTopology {
            is_first_occurrence: target == original.start,
            next_occurrence,
        })
    }

    /// Plan the creation of a brand-new event.
    pub fn plan_insert(&self, record: &EventRecord) -> Result<MutationPlan, CoreError> {
        if !record.is_valid() {
            return Err(CoreError::Validation(
                "event is missing its calendar or owner account".to_string(),
            ));
        }
        if record.id.is_some() {
            return Err(CoreError::Validation(
                "event has already been saved".to_string(),
            ));
        }
        record.end()?;
        if let Some(rule) = &record.rule {
            // Surface a rule the expander cannot handle before anything is written.
            self.expander
                .first_after(rule, &SeriesAnchor::of(record)?, record.start)?;
        }

        let mut plan = MutationPlan::new();
        let index = plan.push(Operation::InsertEvent {
            record: Box::new(fresh(record)),
        });
        push_reminders(&mut plan, EventRef::Pending(index), &[], record, true);
        Ok(plan)
    }

    /// Plan an edit or delete of an existing event.
    ///
    /// # Returns
    ///
    /// [`PlanOutcome::Unchanged`] when the edited record is equivalent to the
    /// original, otherwise the operations to apply in order.
    #[tracing::instrument(
        level = "debug",
        skip(self, request),
        fields(scope = %request.scope, delete = request.is_delete())
    )]
    pub fn plan(&self, request: &PlanRequest) -> Result<PlanOutcome, CoreError> {
        let original_id = validate(request)?;
        let original = &request.original;
        let target = request.target_original_start;

        let action = match &request.action {
            PlanAction::Edit(edited) => {
                if is_unchanged(request, edited)? {
                    tracing::debug!(%original_id, "edit leaves the event unchanged");
                    return Ok(PlanOutcome::Unchanged);
                }
                Action::Edit(edited)
            }
            PlanAction::Delete => Action::Delete,
        };

        let topology = self.topology(original, target)?;
        let shape = scope::resolve(request.scope, action, original, &topology);
        tracing::debug!(
            %original_id,
            first = topology.is_first_occurrence,
            next = ?topology.next_occurrence,
            shape = shape_name(&shape),
            "resolved mutation shape"
        );

        let mut plan = MutationPlan::new();
        match shape {
            MutationShape::UpdateSingle { edited } => {
                let time_fields = time_changed(request, edited)?;
                plan.push(Operation::UpdateEvent {
                    event_id: original_id,
                    record: Box::new(in_place(edited, original_id, edited.start)?),
                    time_fields,
                });
                push_reminders(
                    &mut plan,
                    EventRef::Id(original_id),
                    &original.reminders,
                    edited,
                    false,
                );
            }
            MutationShape::CancelException => {
                plan.push(Operation::CancelInstance {
                    event_id: original_id,
                });
            }
            MutationShape::DeleteSingle => {
                plan.push(Operation::DeleteEvent {
                    event_id: original_id,
                });
            }
            MutationShape::DeleteSeries => {
                plan.push(Operation::DeleteSeries {
                    series_id: original_id,
                });
            }
            MutationShape::CarveOut {
                truncation,
                continue_series,
                standalone,
            } => {
                let split = self.truncate(&mut plan, request, original_id, truncation)?;
                if let (true, Some(next)) = (continue_series, topology.next_occurrence) {
                    continue_series_at(&mut plan, original, next, split.as_ref())?;
                }
                if let Some(edited) = standalone {
                    let mut record = fresh(edited);
                    record.original_series_id = match truncation {
                        Truncation::DeleteSeries => None,
                        Truncation::SplitPast => Some(original_id),
                    };
                    record.original_series_start = Some(target);
                    record.status = EventStatus::Confirmed;
                    let index = plan.push(Operation::InsertStandaloneInstance {
                        record: Box::new(record),
                    });
                    push_reminders(&mut plan, EventRef::Pending(index), &[], edited, true);
                }
            }
            MutationShape::TruncateFollowing {
                truncation,
                replacement,
            } => {
                let split = self.truncate(&mut plan, request, original_id, truncation)?;
                match replacement {
                    Replacement::Nothing => {}
                    Replacement::Standalone(edited) => {
                        let mut record = fresh(edited);
                        record.status = original.status;
                        let index = plan.push(Operation::InsertStandaloneInstance {
                            record: Box::new(record),
                        });
                        push_reminders(
                            &mut plan,
                            EventRef::Pending(index),
                            &original.reminders,
                            edited,
                            true,
                        );
                    }
                    Replacement::Series(edited) => {
                        let mut record = fresh(edited);
                        if edited.rule == original.rule {
                            if let Some(future) = split.and_then(|outcome| outcome.future) {
                                record.rule = Some(future.rule);
                            }
                        }
                        record.status = original.status;
                        let index = plan.push(Operation::InsertSeries {
                            record: Box::new(record.normalized()),
                        });
                        push_reminders(
                            &mut plan,
                            EventRef::Pending(index),
                            &original.reminders,
                            edited,
                            true,
                        );
                    }
                }
            }
            MutationShape::ReplaceInPlace {
                edited,
                force_reminders,
            } => {
                let time_fields = time_changed(request, edited)?;
                let start = if time_fields {
                    adjusted_start(request, edited)?
                } else {
                    original.start
                };
                plan.push(Operation::UpdateEvent {
                    event_id: original_id,
                    record: Box::new(in_place(edited, original_id, start)?),
                    time_fields,
                });
                push_reminders(
                    &mut plan,
                    EventRef::Id(original_id),
                    &original.reminders,
                    edited,
                    force_reminders,
                );
            }
            MutationShape::ReplaceWithStandalone { edited } => {
                plan.push(Operation::DeleteSeries {
                    series_id: original_id,
                });
                let index = plan.push(Operation::InsertStandaloneInstance {
                    record: Box::new(fresh(edited)),
                });
                push_reminders(
                    &mut plan,
                    EventRef::Pending(index),
                    &original.reminders,
                    edited,
                    true,
                );
            }
        }

        tracing::debug!(operations = plan.len(), "planned mutation");
        Ok(PlanOutcome::Planned(plan))
    }

    /// Remove the target and everything after it from the original series.
    fn truncate(
        &self,
        plan: &mut MutationPlan,
        request: &PlanRequest,
        original_id: Uuid,
        truncation: Truncation,
    ) -> Result<Option<SplitOutcome>, CoreError> {
        match truncation {
            Truncation::DeleteSeries => {
                plan.push(Operation::DeleteSeries {
                    series_id: original_id,
                });
                Ok(None)
            }
            Truncation::SplitPast => {
                let original = &request.original;
                let rule = series_rule(original)?;
                let outcome = split(
                    self.expander,
                    rule,
                    &SeriesAnchor::of(original)?,
                    request.target_original_start,
                )?;
                plan.push(Operation::UpdateSeriesRule {
                    series_id: original_id,
                    rule: outcome.past_rule.clone(),
                    anchor_start: outcome.past_anchor_start,
                });
                Ok(Some(outcome))
            }
        }
    }
}

/// Re-create the occurrences after the target as a new series starting at `next`.
fn continue_series_at(
    plan: &mut MutationPlan,
    original: &EventRecord,
    next: DateTime<Utc>,
    split: Option<&SplitOutcome>,
) -> Result<(), CoreError> {
    let rule = series_rule(original)?;
    let future_rule = match split {
        Some(outcome) if rule.has_count() => match &outcome.future {
            Some(future) => future.rule.clone(),
            None => return Ok(()),
        },
        _ => rule.clone(),
    };
    // The targeted occurrence is not part of the new series.
    let Some(future_rule) = future_rule.decrement_count() else {
        return Ok(());
    };

    let mut record = fresh(original);
    record.start = next;
    record.rule = Some(future_rule);
    record.extent = Extent::Duration(original.duration());
    let index = plan.push(Operation::InsertSeries {
        record: Box::new(record),
    });
    if let Some(op) = reconcile(EventRef::Pending(index), &[], &original.reminders, true) {
        plan.push(op);
    }
    Ok(())
}

fn validate(request: &PlanRequest) -> Result<Uuid, CoreError> {
    let original = &request.original;
    let original_id = original
        .id
        .ok_or_else(|| CoreError::Validation("original event has no id".to_string()))?;
    request.target_original_end()?;

    if let PlanAction::Edit(edited) = &request.action {
        if !edited.is_valid() {
            return Err(CoreError::Validation(
                "edited event is missing its calendar or owner account".to_string(),
            ));
        }
        let edited_id = edited
            .id
            .ok_or_else(|| CoreError::Validation("edited event has no id".to_string()))?;
        if edited_id != original_id {
            return Err(CoreError::SeriesMismatch(format!(
                "edited event {} is not {}",
                edited_id, original_id
            )));
        }
        if edited.calendar_id != original.calendar_id {
            return Err(CoreError::SeriesMismatch(format!(
                "event {} moved between calendars",
                original_id
            )));
        }
        edited.end()?;
    }
    Ok(original_id)
}

fn series_rule(original: &EventRecord) -> Result<&RecurrenceRule, CoreError> {
    original
        .rule
        .as_ref()
        .ok_or_else(|| CoreError::Validation("event is not recurring".to_string()))
}

/// Whether any of start, end, all-day, rule or timezone differs.
fn time_changed(request: &PlanRequest, edited: &EventRecord) -> Result<bool, CoreError> {
    let original = &request.original;
    Ok(edited.start != request.target_original_start
        || edited.end()? != request.target_original_end()?
        || edited.all_day != original.all_day
        || edited.rule != original.rule
        || edited.timezone != original.timezone)
}

fn is_unchanged(request: &PlanRequest, edited: &EventRecord) -> Result<bool, CoreError> {
    let original = &request.original;
    Ok(!time_changed(request, edited)?
        && edited.title == original.title
        && edited.description == original.description
        && edited.location == original.location
        && edited.status == original.status
        && same_set(&original.reminders, &edited.reminders))
}

/// `instant + delta`, failing validation outside the representable range.
fn shift(instant: DateTime<Utc>, delta: TimeDelta) -> Result<DateTime<Utc>, CoreError> {
    instant.checked_add_signed(delta).ok_or_else(|| {
        CoreError::Validation(format!("{} shifted by {} is out of range", instant, delta))
    })
}

/// Shift the series start by however far the user moved the occurrence.
fn adjusted_start(
    request: &PlanRequest,
    edited: &EventRecord,
) -> Result<DateTime<Utc>, CoreError> {
    let start = shift(
        request.original.start,
        edited.start - request.target_original_start,
    )?;
    if edited.all_day {
        Ok(floor_to_day(start))
    } else {
        Ok(start)
    }
}

/// A copy of `record` ready to be inserted as a new row.
fn fresh(record: &EventRecord) -> EventRecord {
    let mut copy = record.clone();
    copy.id = None;
    copy.anchor_id = None;
    copy.original_series_id = None;
    copy.original_series_start = None;
    in_reference_zone(copy).normalized()
}

fn in_place(
    edited: &EventRecord,
    id: Uuid,
    start: DateTime<Utc>,
) -> Result<EventRecord, CoreError> {
    let mut record = edited.clone();
    let end = shift(edited.end()?, start - edited.start)?;
    record.id = Some(id);
    record.anchor_id = record.rule.as_ref().map(|_| id);
    record.start = start;
    record.extent = Extent::End(end);
    Ok(in_reference_zone(record).normalized())
}

/// All-day rows are stored against the reference zone.
fn in_reference_zone(mut record: EventRecord) -> EventRecord {
    if record.all_day {
        record.timezone = REFERENCE_ZONE.name().to_string();
    }
    record
}

fn push_reminders(
    plan: &mut MutationPlan,
    event: EventRef,
    old: &[ReminderEntry],
    edited: &EventRecord,
    forced: bool,
) {
    if let Some(op) = reconcile(event, old, &edited.reminders, forced) {
        plan.push(op);
    }
}

fn shape_name(shape: &MutationShape<'_>) -> &'static str {
    match shape {
        MutationShape::UpdateSingle { .. } => "update-single",
        MutationShape::CancelException => "cancel-exception",
        MutationShape::DeleteSingle => "delete-single",
        MutationShape::CarveOut { .. } => "carve-out",
        MutationShape::TruncateFollowing { .. } => "truncate-following",
        MutationShape::ReplaceInPlace { .. } => "replace-in-place",
        MutationShape::ReplaceWithStandalone { .. } => "replace-with-standalone",
        MutationShape::DeleteSeries => "delete-series",
    }
}
