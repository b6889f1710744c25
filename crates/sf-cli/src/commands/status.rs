//! Status command implementation

use anyhow::{Context, Result};
use sf_migrate::StepStatus;

use crate::cli::{GlobalArgs, StatusArgs};
use crate::commands::common::load_project;

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let migrator = project.migrator(project.dialect(global)?)?;
    let db = project.connect()?;

    let statuses = migrator
        .status(db.as_ref())
        .await
        .context("Failed to read migration log")?;
    let rows: Vec<_> = statuses
        .into_iter()
        .filter(|(_, status)| !args.pending || *status != StepStatus::Applied)
        .collect();

    if rows.is_empty() {
        println!("All migrations applied.");
        return Ok(());
    }

    let name_width = rows
        .iter()
        .map(|(step, _)| step.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!("{:<8}  {:<12}  {:<name_width$}", "STATUS", "KIND", "NAME");
    println!("{}", "-".repeat(8 + 2 + 12 + 2 + name_width));
    for (step, status) in &rows {
        println!(
            "{:<8}  {:<12}  {:<name_width$}",
            status.to_string(),
            step.kind.to_string(),
            step.name
        );
    }

    let pending = rows
        .iter()
        .filter(|(_, s)| *s != StepStatus::Applied)
        .count();
    println!("\n{} steps, {} not applied", rows.len(), pending);
    Ok(())
}
