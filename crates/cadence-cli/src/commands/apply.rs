use crate::cli::ApplyCommand;
use crate::config::Config;
use crate::util::{read_json, write_json};
use crate::views::table::{display_plan, display_receipt};
use anyhow::Result;
use cadence_core::editor::{SaveOutcome, SeriesEditor};
use cadence_core::expander::RRuleExpander;
use cadence_core::plan::PlanOutcome;
use cadence_core::planner::{MutationPlanner, PlanRequest};
use cadence_core::store::{MemoryStore, StoreSnapshot};
use owo_colors::OwoColorize;

pub async fn apply_request(command: ApplyCommand, config: &Config) -> Result<()> {
    let snapshot: StoreSnapshot = read_json(&command.store)?;
    let request: PlanRequest = read_json(&command.request)?;
    let expander = RRuleExpander::new(config.expander());

    if command.dry_run {
        match MutationPlanner::new(&expander).plan(&request)? {
            PlanOutcome::Unchanged => println!("{}", "Nothing to apply.".dimmed()),
            PlanOutcome::Planned(plan) => display_plan(&plan),
        }
        return Ok(());
    }

    let editor = SeriesEditor::new(MemoryStore::from_snapshot(snapshot), expander);
    match editor.save(&request).await? {
        SaveOutcome::Unchanged => {
            println!("{}", "Nothing to apply.".dimmed());
        }
        SaveOutcome::Applied(receipt) => {
            write_json(&command.store, &editor.store().snapshot().await)?;
            println!(
                "{} Applied to {} ({} new event(s))",
                "✓".green(),
                command.store.display(),
                receipt.inserted.len()
            );
            display_receipt(&receipt);
        }
    }
    Ok(())
}
