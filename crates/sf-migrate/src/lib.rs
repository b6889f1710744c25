//! sf-migrate - Migration engine for Schemaflow
//!
//! Renders a [`sf_core::Catalog`] for one dialect, then applies the pending
//! steps in order against a [`sf_db::Database`], recording every attempt in
//! an append-only log table.

pub mod engine;
pub mod error;
pub mod migration_log;

pub use engine::{
    EngineState, Migrator, MigratorOptions, PlannedStep, RunReport, StepFailure, StepStatus,
    SQL_SEPARATOR,
};
pub use error::{MigrateError, MigrateResult};
pub use migration_log::{
    LogEntry, MigrationLog, NewLogEntry, DEFAULT_LOG_TABLE, TIMESTAMP_FORMAT,
};
