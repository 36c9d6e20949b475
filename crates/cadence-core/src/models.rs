use crate::error::CoreError;
use crate::rule::RecurrenceRule;
use crate::timezone::{self, floor_to_day};
use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

const SECONDS_PER_DAY: i64 = 86_400;
/// Longest event length accepted, about a century.
const MAX_DURATION_DAYS: i64 = 36_525;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Tentative,
    #[default]
    Confirmed,
    Canceled,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid event status: {0}")]
pub struct ParseEventStatusError(String);

impl FromStr for EventStatus {
    type Err = ParseEventStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tentative" => Ok(EventStatus::Tentative),
            "confirmed" => Ok(EventStatus::Confirmed),
            "canceled" | "cancelled" => Ok(EventStatus::Canceled),
            _ => Err(ParseEventStatusError(s.to_string())),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Tentative => write!(f, "tentative"),
            EventStatus::Confirmed => write!(f, "confirmed"),
            EventStatus::Canceled => write!(f, "canceled"),
        }
    }
}

/// Which occurrences of a recurring event an edit or delete applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditScope {
    /// Only the selected occurrence
    ThisInstance,
    /// The selected occurrence and every later one
    ThisAndFollowing,
    /// Every occurrence, including past ones
    AllInSeries,
}

impl fmt::Display for EditScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditScope::ThisInstance => write!(f, "this"),
            EditScope::ThisAndFollowing => write!(f, "following"),
            EditScope::AllInSeries => write!(f, "all"),
        }
    }
}

impl FromStr for EditScope {
    type Err = ParseEditScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "this" | "instance" | "this_instance" => Ok(EditScope::ThisInstance),
            "following" | "future" | "this_and_following" => Ok(EditScope::ThisAndFollowing),
            "all" | "series" | "all_in_series" => Ok(EditScope::AllInSeries),
            _ => Err(ParseEditScopeError(s.to_string())),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid edit scope: {0}")]
pub struct ParseEditScopeError(String);

// ============================================================================
// Reminders
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReminderMethod {
    #[default]
    Default,
    Alert,
    Email,
    Sms,
    Alarm,
}

impl ReminderMethod {
    /// `Default` is the legacy spelling of `Alert`.
    pub fn canonical(self) -> Self {
        match self {
            ReminderMethod::Default => ReminderMethod::Alert,
            other => other,
        }
    }
}

impl fmt::Display for ReminderMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReminderMethod::Default => write!(f, "default"),
            ReminderMethod::Alert => write!(f, "alert"),
            ReminderMethod::Email => write!(f, "email"),
            ReminderMethod::Sms => write!(f, "sms"),
            ReminderMethod::Alarm => write!(f, "alarm"),
        }
    }
}

/// A reminder fired `minutes` before an occurrence starts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReminderEntry {
    pub minutes: i32,
    #[serde(default)]
    pub method: ReminderMethod,
}

impl ReminderEntry {
    pub fn new(minutes: i32, method: ReminderMethod) -> Self {
        Self { minutes, method }
    }
}

impl PartialEq for ReminderEntry {
    fn eq(&self, other: &Self) -> bool {
        self.minutes == other.minutes && self.method.canonical() == other.method.canonical()
    }
}

impl Eq for ReminderEntry {}

impl Hash for ReminderEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.minutes.hash(state);
        self.method.canonical().hash(state);
    }
}

// ============================================================================
// Event records
// ============================================================================

/// Stored length of a recurring event, written as `P{n}D` or `P{n}S`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum EventDuration {
    Days(i64),
    Seconds(i64),
}

impl EventDuration {
    /// Default length for an all-day event with no usable end.
    pub const ONE_DAY: EventDuration = EventDuration::Days(1);
    /// Default length for a timed event with no usable end.
    pub const ONE_HOUR: EventDuration = EventDuration::Seconds(3600);

    /// Derive the stored duration of an event spanning `start..end`.
    ///
    /// All-day spans round up to whole days. An end before the start
    /// falls back to the defaults.
    pub fn from_span(start: DateTime<Utc>, end: DateTime<Utc>, all_day: bool) -> Self {
        let seconds = (end - start).num_seconds();
        if seconds < 0 {
            return if all_day { Self::ONE_DAY } else { Self::ONE_HOUR };
        }
        if all_day {
            EventDuration::Days((seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY)
        } else {
            EventDuration::Seconds(seconds)
        }
    }

    /// `None` when the duration does not fit a [`TimeDelta`].
    pub fn as_time_delta(&self) -> Option<TimeDelta> {
        match self {
            EventDuration::Days(days) => TimeDelta::try_days(*days),
            EventDuration::Seconds(seconds) => TimeDelta::try_seconds(*seconds),
        }
    }
}

impl fmt::Display for EventDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventDuration::Days(days) => write!(f, "P{}D", days),
            EventDuration::Seconds(seconds) => write!(f, "P{}S", seconds),
        }
    }
}

impl FromStr for EventDuration {
    type Err = CoreError;

    /// Accepts the stored forms (`P1D`, `P3600S`) plus weeks and the
    /// `PnDTnHnMnS` designators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidDuration(s.to_string());
        let body = s.trim().strip_prefix('P').ok_or_else(invalid)?;
        if body.is_empty() {
            return Err(invalid());
        }

        let (date_part, time_part) = match body.split_once('T') {
            Some((date, time)) if !time.is_empty() => (date, Some(time)),
            Some(_) => return Err(invalid()),
            None => (body, None),
        };

        let mut days = Some(0i64);
        let mut seconds = Some(0i64);
        let mut has_seconds = time_part.is_some();
        let mut number = String::new();

        for ch in date_part.chars() {
            match ch {
                '0'..='9' => number.push(ch),
                'W' | 'D' | 'S' => {
                    let value: i64 = number.parse().map_err(|_| invalid())?;
                    number.clear();
                    match ch {
                        'W' => {
                            days = value.checked_mul(7).and_then(|weeks| days?.checked_add(weeks))
                        }
                        'D' => days = days.and_then(|days| days.checked_add(value)),
                        _ => {
                            seconds = seconds.and_then(|seconds| seconds.checked_add(value));
                            has_seconds = true;
                        }
                    }
                }
                _ => return Err(invalid()),
            }
        }
        if !number.is_empty() {
            return Err(invalid());
        }

        for ch in time_part.unwrap_or_default().chars() {
            match ch {
                '0'..='9' => number.push(ch),
                'H' | 'M' | 'S' => {
                    let value: i64 = number.parse().map_err(|_| invalid())?;
                    number.clear();
                    let unit = match ch {
                        'H' => 3600,
                        'M' => 60,
                        _ => 1,
                    };
                    seconds = value
                        .checked_mul(unit)
                        .and_then(|value| seconds?.checked_add(value));
                }
                _ => return Err(invalid()),
            }
        }
        if !number.is_empty() {
            return Err(invalid());
        }

        let (days, seconds) = days.zip(seconds).ok_or_else(invalid)?;
        if days > MAX_DURATION_DAYS || seconds > MAX_DURATION_DAYS * SECONDS_PER_DAY {
            return Err(invalid());
        }

        if has_seconds {
            Ok(EventDuration::Seconds(days * SECONDS_PER_DAY + seconds))
        } else {
            Ok(EventDuration::Days(days))
        }
    }
}

/// How long an event lasts.
///
/// Recurring records store a duration; non-recurring records store an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extent {
    End(DateTime<Utc>),
    Duration(EventDuration),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Absent until the record has been persisted
    #[serde(default)]
    pub id: Option<Uuid>,
    /// Equal to `id` when the record heads a recurring series
    #[serde(default)]
    pub anchor_id: Option<Uuid>,
    #[serde(default)]
    pub calendar_id: Option<Uuid>,
    #[serde(default)]
    pub owner_account: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub extent: Extent,
    #[serde(default)]
    pub all_day: bool,
    pub timezone: String,
    #[serde(default)]
    pub rule: Option<RecurrenceRule>,
    /// Set on exceptions carved out of a series
    #[serde(default)]
    pub original_series_id: Option<Uuid>,
    #[serde(default)]
    pub original_series_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub reminders: Vec<ReminderEntry>,
}

impl EventRecord {
    /// A new, unsaved, non-recurring event.
    pub fn new(
        calendar_id: Uuid,
        owner_account: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            anchor_id: None,
            calendar_id: Some(calendar_id),
            owner_account: Some(owner_account.into()),
            title: None,
            description: None,
            location: None,
            start,
            extent: Extent::End(end),
            all_day: false,
            timezone: timezone.into(),
            rule: None,
            original_series_id: None,
            original_series_start: None,
            status: EventStatus::Confirmed,
            reminders: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_rule(mut self, rule: RecurrenceRule) -> Self {
        self.rule = Some(rule);
        self.normalized()
    }

    pub fn with_reminders(mut self, reminders: Vec<ReminderEntry>) -> Self {
        self.reminders = reminders;
        self
    }

    pub fn all_day(mut self) -> Self {
        self.all_day = true;
        self.timezone = timezone::REFERENCE_ZONE.name().to_string();
        self.start = floor_to_day(self.start);
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.rule.is_some()
    }

    pub fn is_exception(&self) -> bool {
        self.original_series_id.is_some()
    }

    /// The end instant, failing when the duration runs past the representable range.
    pub fn end(&self) -> Result<DateTime<Utc>, CoreError> {
        match self.extent {
            Extent::End(end) => Ok(end),
            Extent::Duration(duration) => duration
                .as_time_delta()
                .and_then(|delta| self.start.checked_add_signed(delta))
                .ok_or_else(|| CoreError::InvalidDuration(duration.to_string())),
        }
    }

    pub fn duration(&self) -> EventDuration {
        match self.extent {
            Extent::End(end) => EventDuration::from_span(self.start, end, self.all_day),
            Extent::Duration(duration) => duration,
        }
    }

    /// Convert the extent to the stored form implied by `rule`.
    ///
    /// A duration that cannot be turned into an end is left as it is; the
    /// planner rejects such records through [`EventRecord::end`] first.
    pub fn normalized(mut self) -> Self {
        self.extent = match (self.rule.is_some(), self.extent) {
            (true, Extent::End(end)) => {
                Extent::Duration(EventDuration::from_span(self.start, end, self.all_day))
            }
            (false, Extent::Duration(duration)) => match self.end() {
                Ok(end) => Extent::End(end),
                Err(_) => Extent::Duration(duration),
            },
            (_, extent) => extent,
        };
        self
    }

    pub fn tz(&self) -> Result<Tz, CoreError> {
        timezone::parse_timezone(&self.timezone)
    }

    /// The required identity fields: a calendar and a non-empty owner.
    pub fn is_valid(&self) -> bool {
        self.calendar_id.is_some()
            && self
                .owner_account
                .as_deref()
                .is_some_and(|owner| !owner.trim().is_empty())
    }
}
