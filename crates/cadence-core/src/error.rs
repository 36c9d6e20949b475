use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid event: {0}")]
    Validation(String),

    #[error("Edited event does not belong to the original series: {0}")]
    SeriesMismatch(String),

    #[error("Cannot split a series at or before its first occurrence (anchor {anchor}, cutoff {cutoff})")]
    SplitAtAnchor {
        anchor: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    },

    #[error("Malformed recurrence rule: {0}")]
    MalformedRule(String),

    #[error("Occurrence expansion failed: {0}")]
    Expander(String),

    #[error("Batch failed to apply: {0}")]
    Store(String),

    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),
}
