use crate::cli::{OutputFormat, SplitCommand};
use crate::config::Config;
use crate::parser::parse_instant;
use crate::util::{command_timezone, parse_rule, print_json};
use crate::views::table::display_split;
use anyhow::Result;
use cadence_core::expander::{RRuleExpander, SeriesAnchor};
use cadence_core::split::split;
use cadence_core::timezone::REFERENCE_ZONE;

pub fn split_rule(command: SplitCommand, config: &Config) -> Result<()> {
    let tz = if command.all_day {
        REFERENCE_ZONE
    } else {
        command_timezone(command.timezone.as_deref(), config)?
    };
    let rule = parse_rule(&command.rule)?;
    let start = parse_instant(&command.start, tz)?;
    let cutoff = parse_instant(&command.cutoff, tz)?;

    let expander = RRuleExpander::new(config.expander());
    let anchor = SeriesAnchor::new(start, command.all_day, tz);
    let outcome = split(&expander, &rule, &anchor, cutoff)?;

    match command.format.unwrap_or(config.output_format) {
        OutputFormat::Json => print_json(&outcome),
        OutputFormat::Table => {
            display_split(&outcome, tz);
            Ok(())
        }
    }
}
