//! Dividing one series into a truncated past and a continuing future.

use crate::error::CoreError;
use crate::expander::{OccurrenceExpander, SeriesAnchor};
use crate::rule::{RecurrenceRule, Termination};
use crate::timezone::floor_to_day;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// The part of a series that continues from the cutoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FuturePart {
    pub rule: RecurrenceRule,
    /// First occurrence at or after the cutoff
    pub anchor_start: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitOutcome {
    pub past_rule: RecurrenceRule,
    /// `DTSTART` to store with the past rule; floored for all-day series.
    pub past_anchor_start: DateTime<Utc>,
    /// `None` when nothing of the series remains after the cutoff.
    pub future: Option<FuturePart>,
}

/// Split `rule`, anchored at `anchor`, so the past part ends before `cutoff`.
///
/// # Behavior
///
/// - `Count(n)`: the past keeps the `k` occurrences in `[anchor, cutoff)`
///   and the future keeps `n - k`.
/// - `Until` / `Never`: the past ends one second before the cutoff (one day
///   before for all-day series) and the future keeps the termination.
///
/// Fails with [`CoreError::SplitAtAnchor`] when the cutoff is not after the
/// anchor, or when a count-bounded rule has no occurrence before it.
#[tracing::instrument(level = "debug", skip(expander, rule), fields(rule = %rule))]
pub fn split<E: OccurrenceExpander + ?Sized>(
    expander: &E,
    rule: &RecurrenceRule,
    anchor: &SeriesAnchor,
    cutoff: DateTime<Utc>,
) -> Result<SplitOutcome, CoreError> {
    if cutoff <= anchor.start {
        return Err(CoreError::SplitAtAnchor {
            anchor: anchor.start,
            cutoff,
        });
    }

    let outcome = match rule.termination() {
        Termination::Count(total) => {
            let before = expander.expand(rule, anchor, anchor.start..cutoff)?;
            let kept = u32::try_from(before.len())
                .map_err(|_| CoreError::Expander("occurrence count overflow".to_string()))?;
            if kept == 0 {
                return Err(CoreError::SplitAtAnchor {
                    anchor: anchor.start,
                    cutoff,
                });
            }

            let past_rule = rule.clone().with_count(kept)?;
            let future = match total.checked_sub(kept) {
                Some(remaining) if remaining > 0 => Some(FuturePart {
                    rule: rule.clone().with_count(remaining)?,
                    anchor_start: expander.first_at_or_after(rule, anchor, cutoff)?,
                }),
                _ => None,
            };

            SplitOutcome {
                past_rule,
                past_anchor_start: anchor.start,
                future,
            }
        }
        Termination::Until(_) | Termination::Never => {
            let last_instant = cutoff - TimeDelta::seconds(1);
            let (until, past_anchor_start) = if anchor.all_day {
                (floor_to_day(last_instant), floor_to_day(anchor.start))
            } else {
                (last_instant, anchor.start)
            };

            let future = expander
                .first_at_or_after(rule, anchor, cutoff)?
                .map(|start| FuturePart {
                    rule: rule.clone(),
                    anchor_start: Some(start),
                });

            SplitOutcome {
                past_rule: rule.clone().with_until(until),
                past_anchor_start,
                future,
            }
        }
    };

    tracing::debug!(
        past = %outcome.past_rule,
        future = ?outcome.future.as_ref().map(|part| part.rule.to_string()),
        "split series"
    );
    Ok(outcome)
}
