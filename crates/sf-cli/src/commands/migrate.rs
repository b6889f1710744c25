//! Migrate command implementation

use anyhow::{Context, Result};
use sf_migrate::{EngineState, RunReport};

use crate::cli::{GlobalArgs, MigrateArgs, MigrateOutput};
use crate::commands::common::{self, load_project, ExitCode};

/// Execute the migrate command
pub async fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let dialect = project.dialect(global)?;
    let migrator = project.migrator(dialect)?;
    let db = project.connect()?;

    if args.dry_run {
        let pending = migrator
            .pending(db.as_ref())
            .await
            .context("Failed to read migration log")?;
        if pending.is_empty() {
            println!("-- No pending migrations");
        }
        for step in pending {
            println!("-- {}", step.name);
            common::print_statements(&step.statements);
            println!();
        }
        return Ok(());
    }

    if args.output == MigrateOutput::Text {
        println!(
            "Migrating {} ({}, {} steps)\n",
            project.config.name,
            dialect,
            migrator.plan().len()
        );
    }

    let report = migrator.execute(db.as_ref()).await?;

    match args.output {
        MigrateOutput::Text => print_report(&report),
        MigrateOutput::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if report.state == EngineState::Halted {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    for name in &report.applied {
        println!("  applied  {name}");
    }
    if let Some(failure) = &report.failure {
        println!("  FAILED   {}: {}", failure.name, failure.error);
    }

    println!();
    match &report.failure {
        Some(failure) => println!(
            "Halted at '{}': {} applied, {} skipped",
            failure.name,
            report.applied.len(),
            report.skipped.len()
        ),
        None => println!(
            "Completed: {} applied, {} skipped",
            report.applied.len(),
            report.skipped.len()
        ),
    }
}
