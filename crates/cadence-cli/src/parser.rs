use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_english::{parse_date_string, Dialect};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ParseInstantError {
    #[error("Failed to parse date-time '{0}'")]
    Unrecognized(String),
    #[error("'{0}' does not exist in {1} (skipped by a DST transition)")]
    Nonexistent(String, Tz),
}

const LOCAL_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a command-line instant.
///
/// Accepts RFC 3339, a local date-time or date in `tz` (dates mean local
/// midnight), or an English phrase such as `tomorrow 9am`.
pub fn parse_instant(input: &str, tz: Tz) -> Result<DateTime<Utc>, ParseInstantError> {
    let input = input.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Ok(instant.with_timezone(&Utc));
    }

    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        });

    if let Some(naive) = naive {
        return match tz.from_local_datetime(&naive) {
            LocalResult::Single(local) => Ok(local.with_timezone(&Utc)),
            // Ambiguous fall-back hour: take the first pass
            LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => Err(ParseInstantError::Nonexistent(input.to_string(), tz)),
        };
    }

    let now = Utc::now().with_timezone(&tz);
    parse_date_string(input, now, Dialect::Us)
        .map(|local| local.with_timezone(&Utc))
        .map_err(|_| ParseInstantError::Unrecognized(input.to_string()))
}
