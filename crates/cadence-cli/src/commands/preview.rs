use crate::cli::{OutputFormat, PreviewCommand};
use crate::config::Config;
use crate::parser::parse_instant;
use crate::util::{command_timezone, parse_rule, print_json};
use crate::views::table::display_occurrences;
use anyhow::Result;
use cadence_core::expander::{OccurrenceExpander, RRuleExpander, SeriesAnchor};
use cadence_core::timezone::REFERENCE_ZONE;

pub fn preview_rule(command: PreviewCommand, config: &Config) -> Result<()> {
    let tz = if command.all_day {
        REFERENCE_ZONE
    } else {
        command_timezone(command.timezone.as_deref(), config)?
    };
    let rule = parse_rule(&command.rule)?;
    let start = parse_instant(&command.start, tz)?;

    let expander = RRuleExpander::new(config.expander());
    let anchor = SeriesAnchor::new(start, command.all_day, tz);

    let mut occurrences = Vec::with_capacity(command.limit);
    let mut next = expander.first_at_or_after(&rule, &anchor, start)?;
    while let Some(occurrence) = next {
        if occurrences.len() >= command.limit {
            break;
        }
        occurrences.push(occurrence);
        next = expander.first_after(&rule, &anchor, occurrence)?;
    }

    match command.format.unwrap_or(config.output_format) {
        OutputFormat::Json => print_json(&occurrences),
        OutputFormat::Table => {
            println!("Rule: {}", rule);
            display_occurrences(&occurrences, tz);
            Ok(())
        }
    }
}
