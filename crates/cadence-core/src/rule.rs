//! Recurrence rule value type and its canonical text form.
//!
//! The text form is the `RRULE` value grammar of RFC 5545 restricted to the
//! parts the engine understands:
//!
//! ```text
//! FREQ=WEEKLY;COUNT=10;INTERVAL=2;WKST=SU;BYDAY=MO,WE
//! FREQ=MONTHLY;UNTIL=20251231T235959Z;BYDAY=-1FR
//! FREQ=MONTHLY;BYMONTHDAY=15
//! ```
//!
//! Parts are always written in the order `FREQ`, `UNTIL`/`COUNT`,
//! `INTERVAL`, `WKST`, `BYDAY`, `BYMONTHDAY`, so `parse(to_string(rule))`
//! yields the same rule.

use crate::error::CoreError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc, Weekday};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;

const UNTIL_FORMAT: &str = "%Y%m%dT%H%M%SZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "YEARLY" => Ok(Frequency::Yearly),
            other => Err(CoreError::MalformedRule(format!(
                "unrecognized frequency '{}'",
                other
            ))),
        }
    }
}

/// How a series ends. Exactly one mode is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    Never,
    Until(DateTime<Utc>),
    Count(u32),
}

/// Day or position selector attached to a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DaySelector {
    /// `BYDAY=MO,WE,FR`, kept sorted Monday first.
    Weekdays(Vec<Weekday>),
    /// `BYDAY=2TU`; an ordinal of `-1` means the last such weekday.
    NthWeekday { ordinal: i8, weekday: Weekday },
    /// `BYMONTHDAY=15`
    MonthDay(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct RecurrenceRule {
    frequency: Frequency,
    interval: u32,
    termination: Termination,
    selector: Option<DaySelector>,
    week_start: Option<Weekday>,
}

impl RecurrenceRule {
    /// An unbounded rule repeating every period of `frequency`.
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            termination: Termination::Never,
            selector: None,
            week_start: None,
        }
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn selector(&self) -> Option<&DaySelector> {
        self.selector.as_ref()
    }

    pub fn week_start(&self) -> Option<Weekday> {
        self.week_start
    }

    pub fn count(&self) -> Option<u32> {
        match self.termination {
            Termination::Count(n) => Some(n),
            _ => None,
        }
    }

    pub fn until(&self) -> Option<DateTime<Utc>> {
        match self.termination {
            Termination::Until(until) => Some(until),
            _ => None,
        }
    }

    pub fn has_count(&self) -> bool {
        self.count().is_some()
    }

    pub fn with_interval(mut self, interval: u32) -> Result<Self, CoreError> {
        if interval == 0 {
            return Err(CoreError::MalformedRule(
                "INTERVAL must be at least 1".to_string(),
            ));
        }
        self.interval = interval;
        Ok(self)
    }

    pub fn with_selector(mut self, selector: DaySelector) -> Result<Self, CoreError> {
        self.selector = Some(normalize_selector(selector)?);
        Ok(self)
    }

    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = Some(week_start);
        self
    }

    /// Replace the termination, rejecting `Count(0)`.
    pub fn with_termination(self, termination: Termination) -> Result<Self, CoreError> {
        match termination {
            Termination::Never => Ok(Self {
                termination: Termination::Never,
                ..self
            }),
            Termination::Until(until) => Ok(self.with_until(until)),
            Termination::Count(n) => self.with_count(n),
        }
    }

    pub fn with_count(mut self, count: u32) -> Result<Self, CoreError> {
        if count == 0 {
            return Err(CoreError::MalformedRule(
                "COUNT must be at least 1".to_string(),
            ));
        }
        self.termination = Termination::Count(count);
        Ok(self)
    }

    /// `UNTIL` is stored at second precision so the text form is exact.
    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.termination = Termination::Until(until.trunc_subsecs(0));
        self
    }

    /// Drop one occurrence from a count-bounded rule.
    ///
    /// Returns `None` when nothing would remain. Rules that are not
    /// count-bounded come back unchanged.
    pub fn decrement_count(self) -> Option<Self> {
        match self.termination {
            Termination::Count(n) if n <= 1 => None,
            Termination::Count(n) => Some(Self {
                termination: Termination::Count(n - 1),
                ..self
            }),
            _ => Some(self),
        }
    }

    /// Equality ignoring termination.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.frequency == other.frequency
            && self.interval == other.interval
            && self.selector == other.selector
            && self.week_start == other.week_start
    }
}

fn normalize_selector(selector: DaySelector) -> Result<DaySelector, CoreError> {
    match selector {
        DaySelector::Weekdays(mut days) => {
            if days.is_empty() {
                return Err(CoreError::MalformedRule("BYDAY is empty".to_string()));
            }
            days.sort_by_key(|day| day.num_days_from_monday());
            days.dedup();
            Ok(DaySelector::Weekdays(days))
        }
        DaySelector::NthWeekday { ordinal, weekday } => {
            if ordinal == 0 || !(-5..=5).contains(&ordinal) {
                return Err(CoreError::MalformedRule(format!(
                    "weekday ordinal {} out of range",
                    ordinal
                )));
            }
            Ok(DaySelector::NthWeekday { ordinal, weekday })
        }
        DaySelector::MonthDay(day) => {
            if !(1..=31).contains(&day) {
                return Err(CoreError::MalformedRule(format!(
                    "BYMONTHDAY {} out of range",
                    day
                )));
            }
            Ok(DaySelector::MonthDay(day))
        }
    }
}

pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

pub fn parse_weekday_code(code: &str) -> Result<Weekday, CoreError> {
    match code.to_ascii_uppercase().as_str() {
        "MO" => Ok(Weekday::Mon),
        "TU" => Ok(Weekday::Tue),
        "WE" => Ok(Weekday::Wed),
        "TH" => Ok(Weekday::Thu),
        "FR" => Ok(Weekday::Fri),
        "SA" => Ok(Weekday::Sat),
        "SU" => Ok(Weekday::Sun),
        other => Err(CoreError::MalformedRule(format!(
            "unknown weekday '{}'",
            other
        ))),
    }
}

/// Parse one `BYDAY` entry such as `MO`, `2TU` or `-1FR`.
fn parse_byday_entry(entry: &str) -> Result<(Option<i8>, Weekday), CoreError> {
    let entry = entry.trim();
    // The weekday code is the last two characters, which need not be ASCII.
    let Some((code_start, _)) = entry.char_indices().rev().nth(1) else {
        return Err(CoreError::MalformedRule(format!(
            "invalid BYDAY entry '{}'",
            entry
        )));
    };
    let (ordinal, code) = entry.split_at(code_start);
    let weekday = parse_weekday_code(code)?;
    if ordinal.is_empty() {
        return Ok((None, weekday));
    }
    let ordinal = ordinal
        .trim_start_matches('+')
        .parse::<i8>()
        .map_err(|_| CoreError::MalformedRule(format!("invalid BYDAY entry '{}'", entry)))?;
    Ok((Some(ordinal), weekday))
}

fn parse_byday(value: &str) -> Result<DaySelector, CoreError> {
    let entries = value
        .split(',')
        .map(parse_byday_entry)
        .collect::<Result<Vec<_>, _>>()?;

    match entries.as_slice() {
        [(Some(ordinal), weekday)] => Ok(DaySelector::NthWeekday {
            ordinal: *ordinal,
            weekday: *weekday,
        }),
        _ if entries.iter().any(|(ordinal, _)| ordinal.is_some()) => {
            Err(CoreError::MalformedRule(format!(
                "BYDAY '{}' mixes several positional weekdays",
                value
            )))
        }
        _ => Ok(DaySelector::Weekdays(
            entries.into_iter().map(|(_, weekday)| weekday).collect(),
        )),
    }
}

fn parse_until(value: &str) -> Result<DateTime<Utc>, CoreError> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, UNTIL_FORMAT) {
        return Ok(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CoreError::MalformedRule(format!("invalid UNTIL '{}'", value)))
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, CoreError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| CoreError::MalformedRule(format!("invalid {} '{}'", key, value)))
}

impl FromStr for RecurrenceRule {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.trim();
        let body = body
            .strip_prefix("RRULE:")
            .or_else(|| body.strip_prefix("rrule:"))
            .unwrap_or(body);

        let mut frequency = None;
        let mut interval = None;
        let mut count = None;
        let mut until = None;
        let mut selector = None;
        let mut month_day = None;
        let mut week_start = None;

        for part in body.split(';').filter(|part| !part.trim().is_empty()) {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                CoreError::MalformedRule(format!("rule part '{}' has no value", part))
            })?;
            let key = key.trim().to_ascii_uppercase();
            let value = value.trim();

            let duplicate = match key.as_str() {
                "FREQ" => frequency.replace(value.parse::<Frequency>()?).is_some(),
                "INTERVAL" => interval
                    .replace(parse_number::<u32>("INTERVAL", value)?)
                    .is_some(),
                "COUNT" => count.replace(parse_number::<u32>("COUNT", value)?).is_some(),
                "UNTIL" => until.replace(parse_until(value)?).is_some(),
                "BYDAY" => selector.replace(parse_byday(value)?).is_some(),
                "BYMONTHDAY" => month_day
                    .replace(parse_number::<u8>("BYMONTHDAY", value)?)
                    .is_some(),
                "WKST" => week_start.replace(parse_weekday_code(value)?).is_some(),
                other => {
                    return Err(CoreError::MalformedRule(format!(
                        "unsupported rule part '{}'",
                        other
                    )))
                }
            };
            if duplicate {
                return Err(CoreError::MalformedRule(format!(
                    "rule part '{}' given twice",
                    key
                )));
            }
        }

        let frequency =
            frequency.ok_or_else(|| CoreError::MalformedRule("missing FREQ".to_string()))?;
        let mut rule = RecurrenceRule::new(frequency).with_interval(interval.unwrap_or(1))?;

        rule = match (count, until) {
            (Some(_), Some(_)) => {
                return Err(CoreError::MalformedRule(
                    "COUNT and UNTIL are mutually exclusive".to_string(),
                ))
            }
            (Some(n), None) => rule.with_count(n)?,
            (None, Some(until)) => rule.with_until(until),
            (None, None) => rule,
        };

        rule = match (selector, month_day) {
            (Some(_), Some(_)) => {
                return Err(CoreError::MalformedRule(
                    "BYDAY and BYMONTHDAY cannot be combined".to_string(),
                ))
            }
            (Some(selector), None) => rule.with_selector(selector)?,
            (None, Some(day)) => rule.with_selector(DaySelector::MonthDay(day))?,
            (None, None) => rule,
        };

        if let Some(day) = week_start {
            rule = rule.with_week_start(day);
        }

        Ok(rule)
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FREQ={}", self.frequency)?;
        match self.termination {
            Termination::Never => {}
            Termination::Until(until) => write!(f, ";UNTIL={}", until.format(UNTIL_FORMAT))?,
            Termination::Count(n) => write!(f, ";COUNT={}", n)?,
        }
        if self.interval > 1 {
            write!(f, ";INTERVAL={}", self.interval)?;
        }
        if let Some(day) = self.week_start {
            write!(f, ";WKST={}", weekday_code(day))?;
        }
        match &self.selector {
            None => {}
            Some(DaySelector::Weekdays(days)) => {
                let codes: Vec<&str> = days.iter().map(|day| weekday_code(*day)).collect();
                write!(f, ";BYDAY={}", codes.join(","))?;
            }
            Some(DaySelector::NthWeekday { ordinal, weekday }) => {
                write!(f, ";BYDAY={}{}", ordinal, weekday_code(*weekday))?;
            }
            Some(DaySelector::MonthDay(day)) => write!(f, ";BYMONTHDAY={}", day)?,
        }
        Ok(())
    }
}
