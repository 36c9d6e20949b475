use cadence_core::error::CoreError;
use clap::Parser;
use owo_colors::{OwoColorize, Style};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod parser;
mod timezone;
mod util;
mod views;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    let config = config::Config::new().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable configuration");
        config::Config::default()
    });

    let result = match cli.command {
        cli::Commands::Plan(command) => commands::plan::plan_request(command, &config),
        cli::Commands::Split(command) => commands::split::split_rule(command, &config),
        cli::Commands::Preview(command) => commands::preview::preview_rule(command, &config),
        cli::Commands::Apply(command) => commands::apply::apply_request(command, &config).await,
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.chain().find_map(|e| e.downcast_ref::<CoreError>()) {
        match core_error {
            CoreError::NotFound(s) => {
                eprintln!("{} Event not found: {}", "Error:".style(error_style), s);
            }
            CoreError::SplitAtAnchor { anchor, cutoff } => {
                eprintln!(
                    "{} Cannot split at {}: the series starts at {}",
                    "Error:".style(error_style),
                    cutoff.yellow(),
                    anchor.yellow()
                );
            }
            CoreError::SeriesMismatch(s) => {
                eprintln!(
                    "{} Edited event does not match the series: {}",
                    "Error:".style(error_style),
                    s.yellow()
                );
            }
            CoreError::MalformedRule(s) => {
                eprintln!("{} Malformed recurrence rule: {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidTimezone(s) => {
                eprintln!("{} Invalid timezone: {}", "Error:".style(error_style), s);
                let suggestions = timezone::suggest_timezone(s);
                if !suggestions.is_empty() {
                    eprintln!("Did you mean one of these?");
                    for tz in suggestions {
                        eprintln!("  {}", tz.yellow());
                    }
                }
            }
            CoreError::Store(s) => {
                eprintln!(
                    "{} Nothing was written, the batch failed: {}",
                    "Error:".style(error_style),
                    s
                );
            }
            _ => eprintln!("{} {}", "Error:".style(error_style), core_error),
        }
    } else {
        eprintln!("{} {:#}", "Error:".style(error_style), err);
    }
}
