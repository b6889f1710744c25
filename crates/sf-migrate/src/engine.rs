//! The migration engine.
//!
//! A [`Migrator`] is built from a [`Catalog`] and a dialect. Construction
//! renders the whole plan, so configuration errors never reach the database.
//! Running walks the plan in order:
//!
//! ```text
//! Idle -> LogLoaded -> Running -> Completed
//!                             \-> Halted
//! ```
//!
//! Steps already logged as successful are skipped. The first failing step is
//! logged and halts the run; a later run retries it.

use crate::error::{MigrateError, MigrateResult};
use crate::migration_log::{LogEntry, MigrationLog, NewLogEntry};
use serde::Serialize;
use sf_core::{Catalog, Config, Dialect, Migration, MigrationKind, TransactionMode};
use sf_db::Database;
use sf_sql::{dialect_for_id, RenderSql, SqlDialect};
use std::collections::{HashMap, HashSet};
use std::fmt;
use uuid::Uuid;

/// Separator between a step's statements in the log's `sql` column.
pub const SQL_SEPARATOR: &str = ";\n";

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    LogLoaded,
    Running,
    Completed,
    Halted,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineState::Idle => "idle",
            EngineState::LogLoaded => "log_loaded",
            EngineState::Running => "running",
            EngineState::Completed => "completed",
            EngineState::Halted => "halted",
        };
        f.write_str(s)
    }
}

/// A catalog step rendered for the active dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub name: String,
    pub kind: MigrationKind,
    pub statements: Vec<String>,
}

impl PlannedStep {
    /// The step's SQL as recorded in the log.
    pub fn sql(&self) -> String {
        self.statements.join(SQL_SEPARATOR)
    }
}

/// Engine settings that come from project configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratorOptions {
    pub log_table: String,
    pub transactions: TransactionMode,
}

impl Default for MigratorOptions {
    fn default() -> Self {
        Self {
            log_table: crate::migration_log::DEFAULT_LOG_TABLE.to_string(),
            transactions: TransactionMode::PerStep,
        }
    }
}

impl MigratorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            log_table: config.log_table.clone(),
            transactions: config.transactions,
        }
    }
}

/// The step that stopped a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    pub name: String,
    pub error: String,
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub state: EngineState,
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
    pub failure: Option<StepFailure>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: EngineState::Idle,
            applied: Vec::new(),
            skipped: Vec::new(),
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == EngineState::Completed
    }

    /// A halted run as [`MigrateError::Execution`].
    pub fn into_result(self) -> MigrateResult<RunReport> {
        match &self.failure {
            Some(failure) if self.state == EngineState::Halted => Err(MigrateError::Execution {
                name: failure.name.clone(),
                message: failure.error.clone(),
            }),
            _ => Ok(self),
        }
    }

    fn transition(&mut self, next: EngineState) {
        log::debug!("Run {}: {} -> {}", self.run_id, self.state, next);
        self.state = next;
    }
}

/// Per-step view of the log, as shown by `sf status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Applied,
    Failed,
    Pending,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Applied => "applied",
            StepStatus::Failed => "failed",
            StepStatus::Pending => "pending",
        };
        f.write_str(s)
    }
}

enum StepOutcome {
    Applied,
    Failed(String),
}

/// Applies a rendered plan against a database.
pub struct Migrator {
    dialect: Box<dyn SqlDialect>,
    log: MigrationLog,
    transactions: TransactionMode,
    plan: Vec<PlannedStep>,
}

impl fmt::Debug for Migrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migrator")
            .field("dialect", &self.dialect.name())
            .field("log", &self.log)
            .field("transactions", &self.transactions)
            .field("steps", &self.plan.len())
            .finish()
    }
}

impl Migrator {
    /// Plan `catalog` for `dialect` with default options.
    pub fn new(catalog: &Catalog, dialect: &str) -> MigrateResult<Self> {
        Self::with_options(catalog, dialect, MigratorOptions::default())
    }

    /// Plan `catalog` for `dialect`: the log-table step first, then every
    /// catalog step in registration order, each rendered up front.
    pub fn with_options(
        catalog: &Catalog,
        dialect: &str,
        options: MigratorOptions,
    ) -> MigrateResult<Self> {
        let dialect = dialect_for_id(dialect.parse::<Dialect>()?);
        let log = MigrationLog::new(options.log_table);

        let log_step_name = log.step_name();
        if catalog.contains(&log_step_name) {
            return Err(MigrateError::DuplicateName {
                name: log_step_name,
            });
        }

        let mut plan = Vec::with_capacity(catalog.len() + 1);
        plan.push(plan_step(
            &log_step_name,
            &Migration::create_table(log.descriptor()),
            dialect.as_ref(),
        )?);
        for step in catalog {
            plan.push(plan_step(
                step.name.as_str(),
                &step.migration,
                dialect.as_ref(),
            )?);
        }

        log::debug!(
            "Planned {} steps for {} (log table '{}')",
            plan.len(),
            dialect.name(),
            log.table_name()
        );

        Ok(Self {
            dialect,
            log,
            transactions: options.transactions,
            plan,
        })
    }

    pub fn plan(&self) -> &[PlannedStep] {
        &self.plan
    }

    pub fn dialect(&self) -> &dyn SqlDialect {
        self.dialect.as_ref()
    }

    pub fn log(&self) -> &MigrationLog {
        &self.log
    }

    /// Run the plan; a halted run is an [`MigrateError::Execution`] error.
    pub async fn run(&self, db: &dyn Database) -> MigrateResult<RunReport> {
        self.execute(db).await?.into_result()
    }

    /// Run the plan and report, halted or not.
    ///
    /// Errors are reserved for conditions that stop the engine without a
    /// logged outcome: a log that cannot be read or written, a backend that
    /// does not match the dialect, or a failed transaction control statement.
    pub async fn execute(&self, db: &dyn Database) -> MigrateResult<RunReport> {
        self.check_backend(db)?;
        let mut report = RunReport::new();

        let succeeded = self.log.succeeded(db, self.dialect()).await?;
        report.transition(EngineState::LogLoaded);

        report.transition(EngineState::Running);
        for step in &self.plan {
            if succeeded.contains(&step.name) {
                log::debug!("Skipping '{}': already applied", step.name);
                report.skipped.push(step.name.clone());
                continue;
            }

            log::debug!("Applying '{}' ({})", step.name, step.kind);
            match self.apply(db, step).await? {
                StepOutcome::Applied => {
                    log::info!("Applied migration '{}'", step.name);
                    report.applied.push(step.name.clone());
                }
                StepOutcome::Failed(error) => {
                    log::warn!("Migration '{}' failed: {}", step.name, error);
                    report.failure = Some(StepFailure {
                        name: step.name.clone(),
                        error,
                    });
                    report.transition(EngineState::Halted);
                    return Ok(report);
                }
            }
        }

        report.transition(EngineState::Completed);
        Ok(report)
    }

    /// Steps with no successful log entry, in plan order.
    pub async fn pending(&self, db: &dyn Database) -> MigrateResult<Vec<&PlannedStep>> {
        let succeeded = self.log.succeeded(db, self.dialect()).await?;
        Ok(self
            .plan
            .iter()
            .filter(|s| !succeeded.contains(&s.name))
            .collect())
    }

    /// Every plan step with its logged status.
    pub async fn status(
        &self,
        db: &dyn Database,
    ) -> MigrateResult<Vec<(&PlannedStep, StepStatus)>> {
        let entries = self.log.entries(db, self.dialect()).await?;
        let statuses = summarize(&entries);
        Ok(self
            .plan
            .iter()
            .map(|s| {
                let status = statuses
                    .get(s.name.as_str())
                    .copied()
                    .unwrap_or(StepStatus::Pending);
                (s, status)
            })
            .collect())
    }

    fn check_backend(&self, db: &dyn Database) -> MigrateResult<()> {
        if db.db_type() != self.dialect.name() {
            return Err(MigrateError::BackendMismatch {
                dialect: self.dialect.name().to_string(),
                backend: db.db_type().to_string(),
            });
        }
        Ok(())
    }

    fn transactional(&self) -> bool {
        self.transactions == TransactionMode::PerStep && self.dialect.supports_transactional_ddl()
    }

    /// Execute one step and append its log entry.
    ///
    /// In a transaction, the statements and the success entry commit
    /// together. A failure entry is written after the rollback so it
    /// survives it; if the rollback itself fails the run aborts instead,
    /// since the entry would land in the still-open transaction.
    async fn apply(&self, db: &dyn Database, step: &PlannedStep) -> MigrateResult<StepOutcome> {
        let transactional = self.transactional();
        if transactional {
            db.begin().await?;
        }

        if let Err(error) = execute_statements(db, step).await {
            if transactional {
                rollback(db, step).await?;
            }
            return self.record_failure(db, step, error).await;
        }

        let entry = NewLogEntry::success(&step.name, step.sql());
        if let Err(e) = self.log.append(db, self.dialect(), &entry).await {
            if transactional {
                if let Err(rb) = rollback(db, step).await {
                    log::warn!("{rb}");
                }
            }
            return Err(e);
        }

        if transactional {
            if let Err(e) = db.commit().await {
                rollback(db, step).await?;
                return self.record_failure(db, step, e.to_string()).await;
            }
        }
        Ok(StepOutcome::Applied)
    }

    async fn record_failure(
        &self,
        db: &dyn Database,
        step: &PlannedStep,
        error: String,
    ) -> MigrateResult<StepOutcome> {
        let entry = NewLogEntry::failure(&step.name, step.sql(), error.clone());
        self.log.append(db, self.dialect(), &entry).await?;
        Ok(StepOutcome::Failed(error))
    }
}

fn plan_step(
    name: &str,
    migration: &Migration,
    dialect: &dyn SqlDialect,
) -> MigrateResult<PlannedStep> {
    let statements = migration
        .render(dialect)
        .map_err(|e| MigrateError::from_render(name, e))?;
    Ok(PlannedStep {
        name: name.to_string(),
        kind: migration.kind(),
        statements,
    })
}

async fn execute_statements(db: &dyn Database, step: &PlannedStep) -> Result<(), String> {
    for sql in &step.statements {
        db.execute_batch(sql).await.map_err(|e| e.to_string())?;
    }
    Ok(())
}

async fn rollback(db: &dyn Database, step: &PlannedStep) -> MigrateResult<()> {
    db.rollback().await.map_err(|e| {
        log::error!("Rollback after '{}' failed: {}", step.name, e);
        MigrateError::Db(e)
    })
}

/// Latest status per name; any success wins over later failures.
fn summarize(entries: &[LogEntry]) -> HashMap<&str, StepStatus> {
    let applied: HashSet<&str> = entries
        .iter()
        .filter(|e| e.success)
        .map(|e| e.migration_id.as_str())
        .collect();
    entries
        .iter()
        .map(|e| {
            let name = e.migration_id.as_str();
            let status = if applied.contains(name) {
                StepStatus::Applied
            } else {
                StepStatus::Failed
            };
            (name, status)
        })
        .collect()
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
