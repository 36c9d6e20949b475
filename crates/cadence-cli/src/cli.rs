use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

/// Plan and apply edits to recurring calendar events
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log planning decisions to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the operations a request would produce, without applying them
    Plan(PlanCommand),
    /// Split a recurrence rule at a cutoff instant
    Split(SplitCommand),
    /// List the first occurrences of a recurrence rule
    Preview(PreviewCommand),
    /// Plan a request and apply it to a JSON store snapshot
    Apply(ApplyCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct PlanCommand {
    /// Path to a JSON plan request
    pub request: PathBuf,
    /// Output format (defaults to the configured one)
    #[clap(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Parser, Debug, Clone)]
pub struct SplitCommand {
    /// Recurrence rule, e.g. 'FREQ=WEEKLY;COUNT=10'
    #[clap(long)]
    pub rule: String,
    /// Start of the series (RFC 3339, local date-time or date)
    #[clap(long)]
    pub start: String,
    /// First instant that belongs to the future half
    #[clap(long)]
    pub cutoff: String,
    /// Treat the series as all-day, laid out on UTC days
    #[clap(long)]
    pub all_day: bool,
    /// Timezone for local times (IANA format, e.g. 'America/New_York')
    #[clap(long)]
    pub timezone: Option<String>,
    #[clap(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Parser, Debug, Clone)]
pub struct PreviewCommand {
    /// Recurrence rule, e.g. 'FREQ=MONTHLY;BYDAY=-1FR'
    #[clap(long)]
    pub rule: String,
    /// Start of the series (RFC 3339, local date-time or date)
    #[clap(long)]
    pub start: String,
    /// Maximum number of occurrences to list
    #[clap(long, default_value_t = 10)]
    pub limit: usize,
    #[clap(long)]
    pub all_day: bool,
    /// Timezone for local times (IANA format, e.g. 'America/New_York')
    #[clap(long)]
    pub timezone: Option<String>,
    #[clap(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Parser, Debug, Clone)]
pub struct ApplyCommand {
    /// Path to the JSON store snapshot; rewritten on success
    pub store: PathBuf,
    /// Path to a JSON plan request
    pub request: PathBuf,
    /// Print the plan without writing the snapshot
    #[clap(long)]
    pub dry_run: bool,
}

#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}
