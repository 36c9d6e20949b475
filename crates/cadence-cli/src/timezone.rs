use cadence_core::error::CoreError;
use cadence_core::timezone::{parse_timezone, validate_timezone};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Detect system timezone
pub fn detect_system_timezone() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        if !tz.is_empty() && validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    if let Ok(tz) = iana_time_zone::get_timezone() {
        if validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    "UTC".to_string()
}

fn common_timezones() -> &'static [&'static str] {
    &[
        "UTC",
        "America/New_York",
        "America/Chicago",
        "America/Denver",
        "America/Los_Angeles",
        "America/Toronto",
        "America/Sao_Paulo",
        "Europe/London",
        "Europe/Paris",
        "Europe/Berlin",
        "Europe/Madrid",
        "Europe/Amsterdam",
        "Asia/Tokyo",
        "Asia/Seoul",
        "Asia/Shanghai",
        "Asia/Singapore",
        "Asia/Kolkata",
        "Asia/Dubai",
        "Australia/Sydney",
        "Pacific/Auckland",
    ]
}

/// Suggest similar timezone for invalid input
pub fn suggest_timezone(invalid: &str) -> Vec<&'static str> {
    let invalid_lower = invalid.to_lowercase();
    if invalid_lower.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<_> = common_timezones()
        .iter()
        .copied()
        .filter(|tz| {
            let tz_lower = tz.to_lowercase();
            tz_lower.contains(&invalid_lower)
                || tz
                    .split('/')
                    .any(|part| part.to_lowercase().contains(&invalid_lower))
        })
        .collect();

    matches.truncate(5);
    matches
}

/// Resolve user timezone input, accepting a few common abbreviations.
pub fn resolve_timezone(input: &str) -> Result<Tz, CoreError> {
    if let Ok(tz) = parse_timezone(input) {
        return Ok(tz);
    }

    let normalized = match input.to_lowercase().as_str() {
        "est" | "eastern" => "America/New_York",
        "cst" | "central" => "America/Chicago",
        "mst" | "mountain" => "America/Denver",
        "pst" | "pacific" => "America/Los_Angeles",
        "gmt" | "utc" | "z" => "UTC",
        "bst" | "london" => "Europe/London",
        "cet" | "paris" => "Europe/Paris",
        "jst" | "tokyo" => "Asia/Tokyo",
        _ => return Err(CoreError::InvalidTimezone(input.to_string())),
    };
    parse_timezone(normalized)
}

/// Format an instant in `tz` with its abbreviation, e.g. `2024-03-10 09:00 (EDT)`.
pub fn format_local(instant: DateTime<Utc>, tz: Tz) -> String {
    let local = instant.with_timezone(&tz);
    format!("{} ({})", local.format("%Y-%m-%d %H:%M"), local.format("%Z"))
}
