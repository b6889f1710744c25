//! Migration descriptors.
//!
//! [`Migration`] is a closed set of step kinds. Rendering to SQL lives in
//! `sf-sql`, which matches on every variant, so adding a kind is a
//! compile-checked change across the workspace.

use crate::config::Dialect;
use crate::schema::{Column, Index, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One schema-change step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Migration {
    /// Create a table with all of its columns
    CreateTable(Table),
    /// Add a column to an existing table
    AddColumn(AddColumn),
    /// Create an index
    AddIndex(Index),
    /// Opaque per-dialect SQL
    Raw(RawStatement),
}

/// Column addition to an existing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddColumn {
    /// Target table
    pub table: String,
    /// Column to add
    pub column: Column,
}

/// Literal SQL keyed by dialect.
///
/// The text is executed verbatim and never parsed. Rendering for a dialect
/// with no entry is an error rather than a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawStatement {
    statements: BTreeMap<Dialect, String>,
}

impl RawStatement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the literal for `dialect`, replacing any previous one.
    pub fn dialect(mut self, dialect: Dialect, sql: impl Into<String>) -> Self {
        self.statements.insert(dialect, sql.into());
        self
    }

    pub fn sqlite(self, sql: impl Into<String>) -> Self {
        self.dialect(Dialect::Sqlite, sql)
    }

    pub fn mysql(self, sql: impl Into<String>) -> Self {
        self.dialect(Dialect::MySql, sql)
    }

    pub fn duckdb(self, sql: impl Into<String>) -> Self {
        self.dialect(Dialect::DuckDb, sql)
    }

    /// The same literal for every known dialect.
    pub fn portable(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        Dialect::ALL
            .into_iter()
            .fold(Self::new(), |raw, d| raw.dialect(d, sql.clone()))
    }

    /// The literal registered for `dialect`.
    pub fn for_dialect(&self, dialect: Dialect) -> Option<&str> {
        self.statements.get(&dialect).map(String::as_str)
    }

    /// Dialects that have a literal, in stable order.
    pub fn dialects(&self) -> impl Iterator<Item = Dialect> + '_ {
        self.statements.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Kind tag, for display and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationKind {
    CreateTable,
    AddColumn,
    AddIndex,
    Raw,
}

impl fmt::Display for MigrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationKind::CreateTable => write!(f, "create_table"),
            MigrationKind::AddColumn => write!(f, "add_column"),
            MigrationKind::AddIndex => write!(f, "add_index"),
            MigrationKind::Raw => write!(f, "raw"),
        }
    }
}

impl Migration {
    pub fn create_table(table: Table) -> Self {
        Migration::CreateTable(table)
    }

    pub fn add_column(table: impl Into<String>, column: Column) -> Self {
        Migration::AddColumn(AddColumn {
            table: table.into(),
            column,
        })
    }

    pub fn add_index(index: Index) -> Self {
        Migration::AddIndex(index)
    }

    pub fn raw(raw: RawStatement) -> Self {
        Migration::Raw(raw)
    }

    pub fn kind(&self) -> MigrationKind {
        match self {
            Migration::CreateTable(_) => MigrationKind::CreateTable,
            Migration::AddColumn(_) => MigrationKind::AddColumn,
            Migration::AddIndex(_) => MigrationKind::AddIndex,
            Migration::Raw(_) => MigrationKind::Raw,
        }
    }

    /// Check the descriptor's invariants, returning a reason on failure.
    ///
    /// Dialect-specific legality (e.g. adding a NOT NULL column without a
    /// default) is checked when rendering, not here.
    pub fn check(&self) -> Result<(), String> {
        match self {
            Migration::CreateTable(table) => table.check(),
            Migration::AddColumn(add) => {
                if add.table.is_empty() {
                    return Err("add_column table must not be empty".to_string());
                }
                add.column.check()?;
                if add.column.primary_key || add.column.auto_increment {
                    return Err(format!(
                        "column '{}' cannot be added as a primary key or auto-increment column",
                        add.column.name
                    ));
                }
                Ok(())
            }
            Migration::AddIndex(index) => index.check(),
            Migration::Raw(raw) => {
                if raw.is_empty() {
                    return Err("raw statement has no dialect literals".to_string());
                }
                for (dialect, sql) in &raw.statements {
                    if sql.trim().is_empty() {
                        return Err(format!("raw statement for {dialect} is empty"));
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
