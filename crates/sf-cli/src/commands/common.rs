//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use sf_core::{Catalog, Config, DatabaseConfig, DbType, Dialect};
use sf_db::Database;
use sf_migrate::{Migrator, MigratorOptions};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Empty on purpose: the command has already printed its own summary.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// A loaded project: config, catalog and the resolved target.
pub(crate) struct Project {
    pub root: PathBuf,
    pub config: Config,
    pub catalog: Catalog,
    pub target: Option<String>,
}

impl Project {
    /// Dialect from `--dialect`, else the target's configured dialect.
    pub fn dialect(&self, global: &GlobalArgs) -> Result<Dialect> {
        match &global.dialect {
            Some(name) => Ok(name.parse::<Dialect>()?),
            None => Ok(self.config.dialect_for_target(self.target.as_deref())?),
        }
    }

    /// Database settings for the target, with relative file paths anchored at
    /// the project root.
    pub fn database(&self) -> Result<DatabaseConfig> {
        let mut db = self
            .config
            .database_for_target(self.target.as_deref())?
            .clone();
        let file_backed = db.db_type != DbType::MySql && db.path != ":memory:";
        if file_backed && Path::new(&db.path).is_relative() {
            db.path = self.root.join(&db.path).display().to_string();
        }
        Ok(db)
    }

    /// Plan the catalog for `dialect`.
    pub fn migrator(&self, dialect: Dialect) -> Result<Migrator> {
        let options = MigratorOptions::from_config(&self.config);
        Migrator::with_options(&self.catalog, dialect.as_str(), options)
            .with_context(|| format!("Failed to plan migrations for {dialect}"))
    }

    /// Open the target database, creating the parent directory of a
    /// file-backed database if needed.
    pub fn connect(&self) -> Result<Arc<dyn Database>> {
        let db = self.database()?;
        if db.db_type != DbType::MySql && db.path != ":memory:" {
            if let Some(parent) = Path::new(&db.path).parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }
        sf_db::connect(&db)
            .with_context(|| format!("Failed to connect to {} database", db.db_type))
    }
}

/// Load config and catalog using the global CLI arguments.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(&root),
    }
    .context("Failed to load project config")?;

    let catalog = Catalog::load(&config.catalog_dirs(&root))
        .context("Failed to load migration catalog")?;
    let target = Config::resolve_target(global.target.as_deref());

    log::debug!(
        "Loaded project '{}' with {} migrations (target: {})",
        config.name,
        catalog.len(),
        target.as_deref().unwrap_or("default")
    );

    Ok(Project {
        root,
        config,
        catalog,
        target,
    })
}

/// Print rendered statements, each terminated with `;`.
pub(crate) fn print_statements(statements: &[String]) {
    for sql in statements {
        println!("{sql};");
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
