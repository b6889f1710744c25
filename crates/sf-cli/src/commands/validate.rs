//! Validate command implementation

use anyhow::Result;
use sf_core::{Dialect, Migration, MigrationStep};
use sf_migrate::MigrationLog;
use sf_sql::{dialect_for_id, RenderSql, SqlDialect};

use crate::cli::{GlobalArgs, ValidateArgs};
use crate::commands::common::{load_project, ExitCode, Project};

/// Validation result severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single validation issue
struct ValidationIssue {
    severity: Severity,
    dialect: Dialect,
    step: String,
    message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} '{}': {}",
            self.severity, self.dialect, self.step, self.message
        )
    }
}

#[derive(Default)]
struct ValidationContext {
    issues: Vec<ValidationIssue>,
}

impl ValidationContext {
    fn push(&mut self, severity: Severity, dialect: Dialect, step: &str, message: String) {
        self.issues.push(ValidationIssue {
            severity,
            dialect,
            step: step.to_string(),
            message,
        });
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

/// Execute the validate command
pub async fn execute(args: &ValidateArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let active = project.dialect(global)?;

    println!(
        "Validating project: {} ({} migrations)\n",
        project.config.name,
        project.catalog.len()
    );

    let mut ctx = ValidationContext::default();

    let log_step = MigrationLog::new(project.config.log_table.as_str()).step_name();
    if project.catalog.contains(&log_step) {
        ctx.push(
            Severity::Error,
            active,
            &log_step,
            "name is reserved for the migration log table step".to_string(),
        );
    }

    let dialects: Vec<Dialect> = if args.all_dialects {
        Dialect::ALL.to_vec()
    } else {
        vec![active]
    };

    for id in dialects {
        // Problems in other dialects never block the active one.
        let severity = if id == active {
            Severity::Error
        } else {
            Severity::Warning
        };
        validate_dialect(&project, dialect_for_id(id).as_ref(), severity, &mut ctx);
    }

    print_issues_and_summary(&ctx, args.strict)
}

/// Render every step and parse the generated DDL back.
///
/// Raw statements are executed verbatim and are never parsed.
fn validate_dialect(
    project: &Project,
    dialect: &dyn SqlDialect,
    severity: Severity,
    ctx: &mut ValidationContext,
) {
    print!("Checking {}... ", dialect.name());
    let before = ctx.issues.len();

    for step in project.catalog.iter() {
        let statements = match step.migration.render(dialect) {
            Ok(statements) => statements,
            Err(e) => {
                ctx.push(severity, dialect.id(), step.name.as_str(), e.to_string());
                continue;
            }
        };
        if is_raw(step) {
            continue;
        }
        for sql in &statements {
            if let Err(e) = dialect.parse(sql) {
                ctx.push(
                    severity,
                    dialect.id(),
                    step.name.as_str(),
                    format!("rendered SQL does not parse: {e}"),
                );
            }
        }
    }

    let found = ctx.issues.len() - before;
    if found == 0 {
        println!("ok");
    } else {
        println!("{found} issue(s)");
    }
}

fn is_raw(step: &MigrationStep) -> bool {
    matches!(step.migration, Migration::Raw(_))
}

fn print_issues_and_summary(ctx: &ValidationContext, strict: bool) -> Result<()> {
    println!();
    for issue in &ctx.issues {
        println!("{}", issue);
    }

    let error_count = ctx.count(Severity::Error);
    let warning_count = ctx.count(Severity::Warning);

    if !ctx.issues.is_empty() {
        println!();
    }
    if error_count == 0 && (warning_count == 0 || !strict) {
        println!(
            "Validation passed: {} errors, {} warnings",
            error_count, warning_count
        );
        Ok(())
    } else {
        println!(
            "Validation failed{}: {} errors, {} warnings",
            if strict { " (strict mode)" } else { "" },
            error_count,
            warning_count
        );
        Err(ExitCode(1).into())
    }
}
