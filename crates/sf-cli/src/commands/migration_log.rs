//! Log command implementation

use anyhow::{Context, Result};
use sf_migrate::{LogEntry, TIMESTAMP_FORMAT};

use crate::cli::{GlobalArgs, LogArgs, LogOutput};
use crate::commands::common::load_project;

/// Execute the log command
pub async fn execute(args: &LogArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let migrator = project.migrator(project.dialect(global)?)?;
    let db = project.connect()?;

    let entries: Vec<LogEntry> = migrator
        .log()
        .entries(db.as_ref(), migrator.dialect())
        .await
        .context("Failed to read migration log")?
        .into_iter()
        .filter(|e| !args.failed || !e.success)
        .collect();

    match args.output {
        LogOutput::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        LogOutput::Table => print_table(&entries),
    }
    Ok(())
}

fn print_table(entries: &[LogEntry]) {
    if entries.is_empty() {
        println!("No log entries.");
        return;
    }

    let name_width = entries
        .iter()
        .map(|e| e.migration_id.len())
        .max()
        .unwrap_or(9)
        .max(9);

    println!(
        "{:>4}  {:<19}  {:<6}  {:<name_width$}  ERROR",
        "ID", "TIMESTAMP", "RESULT", "MIGRATION"
    );
    println!("{}", "-".repeat(4 + 2 + 19 + 2 + 6 + 2 + name_width + 7));
    for e in entries {
        println!(
            "{:>4}  {:<19}  {:<6}  {:<name_width$}  {}",
            e.id,
            e.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            if e.success { "ok" } else { "FAILED" },
            e.migration_id,
            e.error.as_deref().unwrap_or("")
        );
    }
}
