//! Mapping an edit scope and series topology to a mutation shape.

use crate::models::{EditScope, EventRecord};
use chrono::{DateTime, Utc};

/// Facts about the targeted occurrence, read before planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesTopology {
    /// The target is the series' own first occurrence
    pub is_first_occurrence: bool,
    /// The next occurrence after the target, if any
    pub next_occurrence: Option<DateTime<Utc>>,
}

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action<'r> {
    Edit(&'r EventRecord),
    Delete,
}

/// How the occurrences before the target are dealt with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    /// The target is the anchor, so the whole series row goes.
    DeleteSeries,
    /// The series keeps the occurrences before the target.
    SplitPast,
}

/// What takes over from the target onwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Replacement<'r> {
    Nothing,
    Standalone(&'r EventRecord),
    Series(&'r EventRecord),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MutationShape<'r> {
    /// A non-recurring event updated in place.
    UpdateSingle { edited: &'r EventRecord },
    /// Soft delete of a carved-out exception.
    CancelException,
    /// Hard delete of a non-recurring event.
    DeleteSingle,
    /// One occurrence pulled out of the series.
    CarveOut {
        truncation: Truncation,
        continue_series: bool,
        standalone: Option<&'r EventRecord>,
    },
    /// The series ends before the target; something else may follow.
    TruncateFollowing {
        truncation: Truncation,
        replacement: Replacement<'r>,
    },
    /// The series row is rewritten in place with the edited rule.
    ReplaceInPlace {
        edited: &'r EventRecord,
        force_reminders: bool,
    },
    /// The series is dropped in favor of a single event.
    ReplaceWithStandalone { edited: &'r EventRecord },
    DeleteSeries,
}

/// Resolve the concrete shape of a mutation.
pub fn resolve<'r>(
    scope: EditScope,
    action: Action<'r>,
    original: &EventRecord,
    topology: &SeriesTopology,
) -> MutationShape<'r> {
    if !original.is_recurring() {
        return match action {
            Action::Edit(edited) => MutationShape::UpdateSingle { edited },
            Action::Delete if original.is_exception() => MutationShape::CancelException,
            Action::Delete => MutationShape::DeleteSingle,
        };
    }

    let truncation = if topology.is_first_occurrence {
        Truncation::DeleteSeries
    } else {
        Truncation::SplitPast
    };

    match (scope, action) {
        (EditScope::ThisInstance, action) => MutationShape::CarveOut {
            truncation,
            continue_series: topology.next_occurrence.is_some(),
            standalone: match action {
                Action::Edit(edited) => Some(edited),
                Action::Delete => None,
            },
        },
        (EditScope::ThisAndFollowing, Action::Delete) => MutationShape::TruncateFollowing {
            truncation,
            replacement: Replacement::Nothing,
        },
        (EditScope::ThisAndFollowing, Action::Edit(edited)) if !edited.is_recurring() => {
            MutationShape::TruncateFollowing {
                truncation,
                replacement: Replacement::Standalone(edited),
            }
        }
        (EditScope::ThisAndFollowing, Action::Edit(edited)) => match truncation {
            Truncation::DeleteSeries => MutationShape::ReplaceInPlace {
                edited,
                force_reminders: true,
            },
            Truncation::SplitPast => MutationShape::TruncateFollowing {
                truncation,
                replacement: Replacement::Series(edited),
            },
        },
        (EditScope::AllInSeries, Action::Delete) => MutationShape::DeleteSeries,
        (EditScope::AllInSeries, Action::Edit(edited)) if !edited.is_recurring() => {
            MutationShape::ReplaceWithStandalone { edited }
        }
        (EditScope::AllInSeries, Action::Edit(edited)) => MutationShape::ReplaceInPlace {
            edited,
            force_reminders: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use rstest::rstest;
    use uuid::Uuid;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn single() -> EventRecord {
        let mut event = EventRecord::new(
            Uuid::now_v7(),
            "owner",
            start(),
            start() + TimeDelta::hours(1),
            "UTC",
        );
        event.id = Some(Uuid::now_v7());
        event
    }

    fn recurring() -> EventRecord {
        single().with_rule("FREQ=WEEKLY;COUNT=10".parse().unwrap())
    }

    fn topology(first: bool, has_next: bool) -> SeriesTopology {
        SeriesTopology {
            is_first_occurrence: first,
            next_occurrence: has_next.then(|| start() + TimeDelta::weeks(1)),
        }
    }

    #[rstest]
    #[case(EditScope::ThisInstance)]
    #[case(EditScope::ThisAndFollowing)]
    #[case(EditScope::AllInSeries)]
    fn test_non_recurring_ignores_scope(#[case] scope: EditScope) {
        let original = single();
        let edited = single();
        assert!(matches!(
            resolve(scope, Action::Edit(&edited), &original, &topology(true, false)),
            MutationShape::UpdateSingle { .. }
        ));
        assert_eq!(
            resolve(scope, Action::Delete, &original, &topology(true, false)),
            MutationShape::DeleteSingle
        );

        let mut exception = single();
        exception.original_series_id = Some(Uuid::now_v7());
        assert_eq!(
            resolve(scope, Action::Delete, &exception, &topology(true, false)),
            MutationShape::CancelException
        );
    }

    #[rstest]
    #[case(true, true, Truncation::DeleteSeries, true)]
    #[case(false, true, Truncation::SplitPast, true)]
    #[case(false, false, Truncation::SplitPast, false)]
    fn test_this_instance_carves_out(
        #[case] first: bool,
        #[case] has_next: bool,
        #[case] expected_truncation: Truncation,
        #[case] expected_continue: bool,
    ) {
        let original = recurring();
        let edited = recurring();

        let shape = resolve(
            EditScope::ThisInstance,
            Action::Edit(&edited),
            &original,
            &topology(first, has_next),
        );
        assert_eq!(
            shape,
            MutationShape::CarveOut {
                truncation: expected_truncation,
                continue_series: expected_continue,
                standalone: Some(&edited),
            }
        );

        let shape = resolve(
            EditScope::ThisInstance,
            Action::Delete,
            &original,
            &topology(first, has_next),
        );
        assert!(matches!(shape, MutationShape::CarveOut { standalone: None, .. }));
    }

    #[test]
    fn test_this_and_following_shapes() {
        let original = recurring();
        let series_edit = recurring();
        let single_edit = single();

        assert_eq!(
            resolve(
                EditScope::ThisAndFollowing,
                Action::Delete,
                &original,
                &topology(false, true)
            ),
            MutationShape::TruncateFollowing {
                truncation: Truncation::SplitPast,
                replacement: Replacement::Nothing,
            }
        );
        assert_eq!(
            resolve(
                EditScope::ThisAndFollowing,
                Action::Edit(&single_edit),
                &original,
                &topology(true, true)
            ),
            MutationShape::TruncateFollowing {
                truncation: Truncation::DeleteSeries,
                replacement: Replacement::Standalone(&single_edit),
            }
        );
        assert_eq!(
            resolve(
                EditScope::ThisAndFollowing,
                Action::Edit(&series_edit),
                &original,
                &topology(true, true)
            ),
            MutationShape::ReplaceInPlace {
                edited: &series_edit,
                force_reminders: true,
            }
        );
        assert_eq!(
            resolve(
                EditScope::ThisAndFollowing,
                Action::Edit(&series_edit),
                &original,
                &topology(false, true)
            ),
            MutationShape::TruncateFollowing {
                truncation: Truncation::SplitPast,
                replacement: Replacement::Series(&series_edit),
            }
        );
    }

    #[test]
    fn test_all_in_series_shapes() {
        let original = recurring();
        let series_edit = recurring();
        let single_edit = single();
        let any = topology(false, true);

        assert_eq!(
            resolve(EditScope::AllInSeries, Action::Delete, &original, &any),
            MutationShape::DeleteSeries
        );
        assert_eq!(
            resolve(EditScope::AllInSeries, Action::Edit(&single_edit), &original, &any),
            MutationShape::ReplaceWithStandalone {
                edited: &single_edit
            }
        );
        assert_eq!(
            resolve(EditScope::AllInSeries, Action::Edit(&series_edit), &original, &any),
            MutationShape::ReplaceInPlace {
                edited: &series_edit,
                force_reminders: false,
            }
        );
    }
}
