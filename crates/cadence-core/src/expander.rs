use crate::error::CoreError;
use crate::models::EventRecord;
use crate::rule::RecurrenceRule;
use crate::timezone::{floor_to_day, REFERENCE_ZONE};
use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Where a series starts and how its occurrences are laid out in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesAnchor {
    pub start: DateTime<Utc>,
    pub all_day: bool,
    pub timezone: Tz,
}

impl SeriesAnchor {
    /// All-day series are laid out on whole days of [`REFERENCE_ZONE`],
    /// whatever `timezone` says.
    pub fn new(start: DateTime<Utc>, all_day: bool, timezone: Tz) -> Self {
        if all_day {
            return Self {
                start: floor_to_day(start),
                all_day,
                timezone: REFERENCE_ZONE,
            };
        }
        Self {
            start,
            all_day,
            timezone,
        }
    }

    pub fn of(record: &EventRecord) -> Result<Self, CoreError> {
        let timezone = if record.all_day {
            REFERENCE_ZONE
        } else {
            record.tz()?
        };
        Ok(Self::new(record.start, record.all_day, timezone))
    }

    pub fn with_start(self, start: DateTime<Utc>) -> Self {
        Self { start, ..self }
    }
}

/// Date-expansion oracle used to count and locate occurrences.
pub trait OccurrenceExpander {
    /// Occurrence starts inside `window` (start inclusive, end exclusive), in order.
    fn expand(
        &self,
        rule: &RecurrenceRule,
        anchor: &SeriesAnchor,
        window: Range<DateTime<Utc>>,
    ) -> Result<Vec<DateTime<Utc>>, CoreError>;

    /// The first occurrence strictly after `after`, if the series has one.
    fn first_after(
        &self,
        rule: &RecurrenceRule,
        anchor: &SeriesAnchor,
        after: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, CoreError>;

    /// The first occurrence at or after `at`.
    fn first_at_or_after(
        &self,
        rule: &RecurrenceRule,
        anchor: &SeriesAnchor,
        at: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, CoreError> {
        self.first_after(rule, anchor, at - TimeDelta::seconds(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpanderConfig {
    /// Upper bound on occurrences produced by a single expansion
    pub max_occurrences: u16,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            max_occurrences: 5000,
        }
    }
}

/// [`OccurrenceExpander`] backed by the `rrule` crate.
#[derive(Debug, Clone, Default)]
pub struct RRuleExpander {
    config: ExpanderConfig,
}

impl RRuleExpander {
    pub fn new(config: ExpanderConfig) -> Self {
        Self { config }
    }

    fn rule_set(
        &self,
        rule: &RecurrenceRule,
        anchor: &SeriesAnchor,
    ) -> Result<rrule::RRuleSet, CoreError> {
        let dtstart = if anchor.timezone == chrono_tz::UTC {
            format!("DTSTART:{}", anchor.start.format("%Y%m%dT%H%M%SZ"))
        } else {
            format!(
                "DTSTART;TZID={}:{}",
                anchor.timezone.name(),
                anchor.start.with_timezone(&anchor.timezone).format("%Y%m%dT%H%M%S")
            )
        };
        format!("{}\nRRULE:{}", dtstart, rule)
            .parse::<rrule::RRuleSet>()
            .map_err(|e| CoreError::Expander(format!("{} (rule '{}')", e, rule)))
    }

    fn collect(
        &self,
        set: rrule::RRuleSet,
        rule: &RecurrenceRule,
    ) -> Result<Vec<DateTime<Utc>>, CoreError> {
        // One extra slot tells a series of exactly `max_occurrences` apart
        // from one that runs past it.
        let max = self.config.max_occurrences;
        let result = set.all(max.saturating_add(1));
        if result.dates.len() > usize::from(max) || (result.limited && max == u16::MAX) {
            return Err(CoreError::Expander(format!(
                "rule '{}' produced more than {} occurrences",
                rule, self.config.max_occurrences
            )));
        }
        Ok(result
            .dates
            .into_iter()
            .map(|dt| dt.with_timezone(&Utc))
            .collect())
    }
}

fn utc(instant: DateTime<Utc>) -> DateTime<rrule::Tz> {
    instant.with_timezone(&rrule::Tz::Tz(chrono_tz::UTC))
}

impl OccurrenceExpander for RRuleExpander {
    #[tracing::instrument(level = "trace", skip(self, rule), fields(rule = %rule))]
    fn expand(
        &self,
        rule: &RecurrenceRule,
        anchor: &SeriesAnchor,
        window: Range<DateTime<Utc>>,
    ) -> Result<Vec<DateTime<Utc>>, CoreError> {
        if window.start >= window.end {
            return Ok(Vec::new());
        }
        // `after`/`before` bounds are widened and re-checked below so the
        // window is half-open regardless of the crate's inclusivity.
        let set = self
            .rule_set(rule, anchor)?
            .after(utc(window.start - TimeDelta::seconds(1)))
            .before(utc(window.end));
        let occurrences: Vec<_> = self
            .collect(set, rule)?
            .into_iter()
            .filter(|dt| window.contains(dt))
            .collect();
        tracing::trace!(count = occurrences.len(), "expanded occurrences");
        Ok(occurrences)
    }

    fn first_after(
        &self,
        rule: &RecurrenceRule,
        anchor: &SeriesAnchor,
        after: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, CoreError> {
        let set = self.rule_set(rule, anchor)?.after(utc(after));
        let dates = set.all(2).dates;
        Ok(dates
            .into_iter()
            .map(|dt| dt.with_timezone(&Utc))
            .find(|dt| *dt > after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn monday() -> DateTime<Utc> {
        // 2024-01-01 is a Monday
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn anchor(start: DateTime<Utc>) -> SeriesAnchor {
        SeriesAnchor::new(start, false, chrono_tz::UTC)
    }

    #[test]
    fn test_expand_is_half_open() {
        let expander = RRuleExpander::default();
        let rule: RecurrenceRule = "FREQ=WEEKLY;COUNT=10".parse().unwrap();
        let start = monday();

        let window = start..start + TimeDelta::weeks(4);
        let occurrences = expander.expand(&rule, &anchor(start), window).unwrap();
        assert_eq!(
            occurrences,
            (0..4).map(|w| start + TimeDelta::weeks(w)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_expand_respects_count() {
        let expander = RRuleExpander::default();
        let rule: RecurrenceRule = "FREQ=DAILY;COUNT=3".parse().unwrap();
        let start = monday();

        let occurrences = expander
            .expand(&rule, &anchor(start), start..start + TimeDelta::days(30))
            .unwrap();
        assert_eq!(occurrences.len(), 3);
    }

    #[test]
    fn test_expand_empty_window() {
        let expander = RRuleExpander::default();
        let rule: RecurrenceRule = "FREQ=DAILY".parse().unwrap();
        let start = monday();
        assert!(expander
            .expand(&rule, &anchor(start), start..start)
            .unwrap()
            .is_empty());
    }

    #[rstest]
    #[case(monday(), Some(monday() + TimeDelta::weeks(1)))]
    #[case(monday() + TimeDelta::days(2), Some(monday() + TimeDelta::weeks(1)))]
    #[case(monday() + TimeDelta::weeks(2), None)]
    fn test_first_after(
        #[case] after: DateTime<Utc>,
        #[case] expected: Option<DateTime<Utc>>,
    ) {
        let expander = RRuleExpander::default();
        let rule: RecurrenceRule = "FREQ=WEEKLY;COUNT=3".parse().unwrap();
        assert_eq!(
            expander.first_after(&rule, &anchor(monday()), after).unwrap(),
            expected
        );
    }

    #[test]
    fn test_first_at_or_after_includes_boundary() {
        let expander = RRuleExpander::default();
        let rule: RecurrenceRule = "FREQ=WEEKLY".parse().unwrap();
        let second = monday() + TimeDelta::weeks(1);
        assert_eq!(
            expander
                .first_at_or_after(&rule, &anchor(monday()), second)
                .unwrap(),
            Some(second)
        );
    }

    #[test]
    fn test_local_wall_clock_is_kept_across_dst() {
        let expander = RRuleExpander::default();
        let rule: RecurrenceRule = "FREQ=WEEKLY;COUNT=2".parse().unwrap();
        // 09:00 New York, the Saturday before DST starts (2024-03-10)
        let start = Utc.with_ymd_and_hms(2024, 3, 9, 14, 0, 0).unwrap();
        let ny = SeriesAnchor::new(start, false, chrono_tz::America::New_York);

        let occurrences = expander
            .expand(&rule, &ny, start..start + TimeDelta::weeks(2))
            .unwrap();
        assert_eq!(
            occurrences,
            vec![start, Utc.with_ymd_and_hms(2024, 3, 16, 13, 0, 0).unwrap()]
        );
    }

    #[test]
    fn test_all_day_series_stays_on_day_boundaries() {
        let expander = RRuleExpander::default();
        let rule: RecurrenceRule = "FREQ=WEEKLY;COUNT=3".parse().unwrap();
        // The zone is ignored: New York switches to DST on 2024-03-10
        let start = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let all_day = SeriesAnchor::new(start, true, chrono_tz::America::New_York);
        assert_eq!(all_day.timezone, REFERENCE_ZONE);

        let occurrences = expander
            .expand(&rule, &all_day, start..start + TimeDelta::weeks(3))
            .unwrap();
        assert_eq!(
            occurrences,
            (0..3).map(|w| start + TimeDelta::weeks(w)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_expansion_up_to_the_limit_is_allowed() {
        let expander = RRuleExpander::new(ExpanderConfig { max_occurrences: 5 });
        let rule: RecurrenceRule = "FREQ=DAILY;COUNT=5".parse().unwrap();
        let start = monday();

        let occurrences = expander
            .expand(&rule, &anchor(start), start..start + TimeDelta::days(30))
            .unwrap();
        assert_eq!(occurrences.len(), 5);

        let rule: RecurrenceRule = "FREQ=DAILY;COUNT=6".parse().unwrap();
        let result = expander.expand(&rule, &anchor(start), start..start + TimeDelta::days(30));
        assert!(matches!(result, Err(CoreError::Expander(_))));
    }

    #[test]
    fn test_expansion_limit_is_an_error() {
        let expander = RRuleExpander::new(ExpanderConfig { max_occurrences: 5 });
        let rule: RecurrenceRule = "FREQ=DAILY".parse().unwrap();
        let start = monday();

        let result = expander.expand(&rule, &anchor(start), start..start + TimeDelta::days(30));
        assert!(matches!(result, Err(CoreError::Expander(_))));
    }
}
