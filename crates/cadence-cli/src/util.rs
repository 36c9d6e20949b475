use crate::config::Config;
use crate::timezone::resolve_timezone;
use anyhow::{Context, Result};
use cadence_core::rule::RecurrenceRule;
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse '{}'", path.display()))
}

/// Write `value` as pretty JSON, replacing the file only once it is fully written.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    let staging = path.with_extension("json.tmp");
    std::fs::write(&staging, text)
        .with_context(|| format!("Failed to write '{}'", staging.display()))?;
    std::fs::rename(&staging, path)
        .with_context(|| format!("Failed to replace '{}'", path.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// The `--timezone` argument, or the configured default.
pub fn command_timezone(explicit: Option<&str>, config: &Config) -> Result<Tz> {
    let name = explicit.unwrap_or(&config.default_timezone);
    Ok(resolve_timezone(name)?)
}

pub fn parse_rule(text: &str) -> Result<RecurrenceRule> {
    Ok(text.parse::<RecurrenceRule>()?)
}
