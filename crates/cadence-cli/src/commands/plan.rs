use crate::cli::{OutputFormat, PlanCommand};
use crate::config::Config;
use crate::util::{print_json, read_json};
use crate::views::table::display_plan;
use anyhow::Result;
use cadence_core::expander::RRuleExpander;
use cadence_core::plan::PlanOutcome;
use cadence_core::planner::{MutationPlanner, PlanRequest};
use owo_colors::OwoColorize;

pub fn plan_request(command: PlanCommand, config: &Config) -> Result<()> {
    let request: PlanRequest = read_json(&command.request)?;
    let expander = RRuleExpander::new(config.expander());
    let outcome = MutationPlanner::new(&expander).plan(&request)?;

    match (outcome, command.format.unwrap_or(config.output_format)) {
        (PlanOutcome::Unchanged, OutputFormat::Json) => print_json(&serde_json::json!([])),
        (PlanOutcome::Unchanged, OutputFormat::Table) => {
            println!("{}", "No changes: the edit leaves the event as it is.".dimmed());
            Ok(())
        }
        (PlanOutcome::Planned(plan), OutputFormat::Json) => print_json(&plan.operations()),
        (PlanOutcome::Planned(plan), OutputFormat::Table) => {
            println!(
                "{} {} operation(s), scope '{}'",
                "Plan:".blue().bold(),
                plan.len(),
                request.scope
            );
            display_plan(&plan);
            Ok(())
        }
    }
}
