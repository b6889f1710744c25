//! Render command implementation

use anyhow::{bail, Result};

use crate::cli::{GlobalArgs, RenderArgs};
use crate::commands::common::{self, load_project};

/// Execute the render command
///
/// Needs no database connection, so any dialect can be rendered, including
/// ones without a live backend.
pub async fn execute(args: &RenderArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let dialect = project.dialect(global)?;
    let migrator = project.migrator(dialect)?;

    let steps: Vec<_> = match &args.step {
        Some(name) => {
            let found: Vec<_> = migrator.plan().iter().filter(|s| &s.name == name).collect();
            if found.is_empty() {
                bail!("No migration named '{name}'");
            }
            found
        }
        None => migrator.plan().iter().collect(),
    };

    println!("-- dialect: {dialect}\n");
    for step in steps {
        println!("-- {} ({})", step.name, step.kind);
        common::print_statements(&step.statements);
        println!();
    }
    Ok(())
}
