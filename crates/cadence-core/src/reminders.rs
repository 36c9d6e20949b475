use crate::models::ReminderEntry;
use crate::plan::{EventRef, Operation};
use std::collections::HashSet;

/// Whether two reminder lists hold the same reminders, ignoring order.
pub fn same_set(old: &[ReminderEntry], new: &[ReminderEntry]) -> bool {
    old.iter().collect::<HashSet<_>>() == new.iter().collect::<HashSet<_>>()
}

/// Build the reminder operation for `event`, if one is needed.
///
/// Reminders are replaced wholesale: every existing reminder of the event
/// is dropped and `new` is inserted. Nothing is emitted when both hold the same
/// reminders in any order, unless `forced` (used for rows created by the
/// same plan).
pub fn reconcile(
    event: EventRef,
    old: &[ReminderEntry],
    new: &[ReminderEntry],
    forced: bool,
) -> Option<Operation> {
    if !forced && same_set(old, new) {
        tracing::trace!(%event, "reminders unchanged");
        return None;
    }
    tracing::trace!(%event, adds = new.len(), removes = old.len(), forced, "replacing reminders");
    Some(Operation::ReconcileReminders {
        event,
        adds: new.to_vec(),
        removes: old.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReminderMethod;
    use rstest::rstest;
    use uuid::Uuid;

    fn entry(minutes: i32, method: ReminderMethod) -> ReminderEntry {
        ReminderEntry::new(minutes, method)
    }

    #[rstest]
    #[case::both_empty(vec![], vec![])]
    #[case::same(vec![entry(10, ReminderMethod::Email)], vec![entry(10, ReminderMethod::Email)])]
    #[case::legacy_default(vec![entry(15, ReminderMethod::Default)], vec![entry(15, ReminderMethod::Alert)])]
    fn test_equal_sets_emit_nothing(
        #[case] old: Vec<ReminderEntry>,
        #[case] new: Vec<ReminderEntry>,
    ) {
        assert!(reconcile(EventRef::Id(Uuid::nil()), &old, &new, false).is_none());
    }

    #[test]
    fn test_changed_set_replaces_wholesale() {
        let old = vec![entry(10, ReminderMethod::Alert), entry(60, ReminderMethod::Email)];
        let new = vec![entry(30, ReminderMethod::Alert)];
        let event = EventRef::Id(Uuid::now_v7());

        let op = reconcile(event, &old, &new, false).unwrap();
        assert_eq!(
            op,
            Operation::ReconcileReminders {
                event,
                adds: new.clone(),
                removes: old.clone(),
            }
        );
    }

    #[test]
    fn test_forced_writes_even_when_equal() {
        let set = vec![entry(10, ReminderMethod::Alert)];
        let op = reconcile(EventRef::Pending(2), &set, &set, true).unwrap();
        match op {
            Operation::ReconcileReminders { event, adds, .. } => {
                assert_eq!(event, EventRef::Pending(2));
                assert_eq!(adds, set);
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[test]
    fn test_reordered_set_emits_nothing() {
        let a = entry(10, ReminderMethod::Alert);
        let b = entry(30, ReminderMethod::Email);
        assert!(reconcile(EventRef::Pending(0), &[a, b], &[b, a], false).is_none());
        assert!(reconcile(EventRef::Pending(0), &[a, b], &[b], false).is_some());
    }
}
