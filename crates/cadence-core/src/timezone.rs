use crate::error::CoreError;
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// Zone used to normalize all-day events to day boundaries.
pub const REFERENCE_ZONE: Tz = chrono_tz::UTC;

/// Validate IANA timezone name
pub fn validate_timezone(timezone: &str) -> Result<(), CoreError> {
    parse_timezone(timezone).map(|_| ())
}

/// Parse an IANA timezone name into a `Tz`.
pub fn parse_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone)
        .map_err(|_| CoreError::InvalidTimezone(format!("Invalid timezone: {}", timezone)))
}

/// Floor an instant to midnight of its day in the reference zone.
///
/// All-day events are stored as midnight UTC, so both their starts and
/// any `UNTIL` derived from them go through here.
pub fn floor_to_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    let local = instant.with_timezone(&REFERENCE_ZONE).date_naive();
    local
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(instant)
}

/// Drop seconds and sub-second precision.
pub fn truncate_to_minute(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .duration_trunc(TimeDelta::minutes(1))
        .unwrap_or(instant)
}

/// Format datetime with timezone-aware display
pub fn format_with_timezone(
    datetime: DateTime<Utc>,
    timezone: &str,
    format: &str,
) -> Result<String, CoreError> {
    let tz = parse_timezone(timezone)?;
    let local_dt = datetime.with_timezone(&tz);
    Ok(local_dt.format(format).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_timezone() {
        assert!(validate_timezone("UTC").is_ok());
        assert!(validate_timezone("America/New_York").is_ok());
        assert!(matches!(
            validate_timezone("Invalid/Timezone"),
            Err(CoreError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_floor_to_day() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap();
        assert_eq!(
            floor_to_day(instant),
            Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()
        );

        let midnight = Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap();
        assert_eq!(floor_to_day(midnight), midnight);
    }

    #[test]
    fn test_truncate_to_minute() {
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 42).unwrap();
        assert_eq!(
            truncate_to_minute(instant),
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_format_with_timezone() {
        let instant = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
        let formatted = format_with_timezone(instant, "America/New_York", "%H:%M").unwrap();
        assert_eq!(formatted, "08:00");
    }
}
