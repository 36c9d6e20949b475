use crate::timezone::format_local;
use cadence_core::models::EventRecord;
use cadence_core::plan::{MutationPlan, Operation};
use cadence_core::split::SplitOutcome;
use cadence_core::store::BatchReceipt;
use chrono::{DateTime, Utc};
use chrono_humanize::HumanTime;
use chrono_tz::Tz;
use comfy_table::{Attribute, Cell, Color, Row, Table};

fn short_id(id: impl ToString) -> String {
    id.to_string().chars().take(8).collect()
}

fn describe_record(record: &EventRecord) -> String {
    let mut parts = Vec::new();
    if let Some(title) = &record.title {
        parts.push(format!("'{}'", title));
    }
    parts.push(format!("at {}", record.start.format("%Y-%m-%d %H:%M UTC")));
    if let Some(rule) = &record.rule {
        parts.push(rule.to_string());
    }
    if let Some(series) = record.original_series_id {
        parts.push(format!("exception of {}", short_id(series)));
    }
    parts.join(" ")
}

fn describe(operation: &Operation) -> (String, String) {
    match operation {
        Operation::UpdateSeriesRule {
            series_id,
            rule,
            anchor_start,
        } => (
            short_id(series_id),
            format!("{} from {}", rule, anchor_start.format("%Y-%m-%d %H:%M UTC")),
        ),
        Operation::UpdateEvent {
            event_id,
            record,
            time_fields,
        } => {
            let mut detail = describe_record(record);
            if !time_fields {
                detail.push_str(" (details only)");
            }
            (short_id(event_id), detail)
        }
        Operation::DeleteSeries { series_id } => (short_id(series_id), String::new()),
        Operation::DeleteEvent { event_id } | Operation::CancelInstance { event_id } => {
            (short_id(event_id), String::new())
        }
        Operation::InsertSeries { record }
        | Operation::InsertStandaloneInstance { record }
        | Operation::InsertEvent { record } => ("new".to_string(), describe_record(record)),
        Operation::ReconcileReminders {
            event,
            adds,
            removes,
        } => {
            let target = match event {
                cadence_core::plan::EventRef::Id(id) => short_id(id),
                pending => pending.to_string(),
            };
            let minutes: Vec<_> = adds.iter().map(|r| format!("{}m", r.minutes)).collect();
            (
                target,
                format!("-{} +{} [{}]", removes.len(), adds.len(), minutes.join(", ")),
            )
        }
    }
}

pub fn display_plan(plan: &MutationPlan) {
    if plan.is_empty() {
        println!("No operations.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Operation", "Target", "Details"]);

    for (index, operation) in plan.operations().iter().enumerate() {
        let mut row = Row::new();
        row.add_cell(Cell::new(index));

        let name_cell = Cell::new(operation.name());
        let name_cell = match operation {
            Operation::DeleteSeries { .. } | Operation::DeleteEvent { .. } => {
                name_cell.fg(Color::Red).add_attribute(Attribute::Bold)
            }
            Operation::CancelInstance { .. } => name_cell.fg(Color::DarkGrey),
            op if op.is_insert() => name_cell.fg(Color::Green),
            op if op.is_reminder_related() => name_cell.fg(Color::Cyan),
            _ => name_cell.fg(Color::Yellow),
        };
        row.add_cell(name_cell);

        let (target, details) = describe(operation);
        row.add_cell(Cell::new(target));
        row.add_cell(Cell::new(details));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_occurrences(occurrences: &[DateTime<Utc>], tz: Tz) {
    if occurrences.is_empty() {
        println!("No occurrences.");
        return;
    }

    let now = Utc::now();
    let mut table = Table::new();
    table.set_header(vec!["#", "UTC", "Local", "When"]);

    for (index, occurrence) in occurrences.iter().enumerate() {
        let when = Cell::new(HumanTime::from(*occurrence - now));
        let when = if *occurrence < now {
            when.fg(Color::DarkGrey)
        } else {
            when
        };
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(occurrence.format("%Y-%m-%d %H:%M")),
            Cell::new(format_local(*occurrence, tz)),
            when,
        ]);
    }

    println!("{table}");
}

pub fn display_split(outcome: &SplitOutcome, tz: Tz) {
    let mut table = Table::new();
    table.set_header(vec!["Half", "Rule", "Starts"]);

    table.add_row(vec![
        Cell::new("past"),
        Cell::new(&outcome.past_rule).fg(Color::Yellow),
        Cell::new(format_local(outcome.past_anchor_start, tz)),
    ]);
    match &outcome.future {
        Some(future) => table.add_row(vec![
            Cell::new("future"),
            Cell::new(&future.rule).fg(Color::Green),
            Cell::new(
                future
                    .anchor_start
                    .map(|start| format_local(start, tz))
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]),
        None => table.add_row(vec![
            Cell::new("future"),
            Cell::new("(none)").fg(Color::DarkGrey),
            Cell::new("-"),
        ]),
    };

    println!("{table}");
}

pub fn display_receipt(receipt: &BatchReceipt) {
    if receipt.inserted.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Operation", "New event"]);
    for (index, id) in &receipt.inserted {
        table.add_row(vec![Cell::new(index), Cell::new(id)]);
    }
    println!("{table}");
}
