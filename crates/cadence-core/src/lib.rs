//! # Cadence Core Library
//!
//! Mutation engine for recurring calendar events. Editing or deleting one
//! occurrence of a series, or an occurrence and everything after it, is
//! turned into an ordered plan of store operations that leaves the stored
//! recurrence rule describing exactly the intended occurrences.
//!
//! ## Core Modules
//!
//! - [`rule`]: Recurrence rule model with canonical RRULE text
//! - [`expander`]: Occurrence expansion backed by the `rrule` crate
//! - [`split`]: Splitting a series into past and future halves
//! - [`scope`]: Edit scope resolution into a mutation shape
//! - [`planner`]: Building ordered [`plan::MutationPlan`]s
//! - [`reminders`]: Reminder reconciliation
//! - [`store`]: Event store and atomic batch executor traits, plus an
//!   in-memory implementation
//! - [`editor`]: Async facade that loads, plans and applies
//! - [`models`]: Event records, scopes, durations and reminders
//! - [`timezone`]: Timezone utilities and validation
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cadence_core::{
//!     editor::SeriesEditor,
//!     expander::{ExpanderConfig, RRuleExpander},
//!     models::{EditScope, EventRecord},
//!     store::MemoryStore,
//! };
//! use chrono::{TimeDelta, TimeZone, Utc};
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let editor = SeriesEditor::new(
//!         MemoryStore::new(),
//!         RRuleExpander::new(ExpanderConfig::default()),
//!     );
//!
//!     let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
//!     let standup = EventRecord::new(
//!         Uuid::now_v7(),
//!         "me@example.com",
//!         start,
//!         start + TimeDelta::minutes(15),
//!         "America/New_York",
//!     )
//!     .with_title("Daily standup")
//!     .with_rule("FREQ=DAILY;BYDAY=MO,TU,WE,TH,FR".parse()?);
//!
//!     let id = editor.create(&standup).await?;
//!
//!     // Drop the third occurrence and everything after it.
//!     let third = Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap();
//!     editor
//!         .delete_occurrence(id, third, EditScope::ThisAndFollowing)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod editor;
pub mod error;
pub mod expander;
pub mod models;
pub mod plan;
pub mod planner;
pub mod reminders;
pub mod rule;
pub mod scope;
pub mod split;
pub mod store;
pub mod timezone;
