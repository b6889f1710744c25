//! The append-only migration log table.
//!
//! One row per step attempt. A step counts as applied once any row for its
//! name has `success = true`; failed rows are kept for inspection and never
//! count.

use crate::error::{MigrateError, MigrateResult};
use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use sf_core::{Column, ColumnType, Table};
use sf_db::{Database, SqlValue};
use sf_sql::SqlDialect;
use std::collections::HashSet;

/// Default log table name.
pub const DEFAULT_LOG_TABLE: &str = "migration_log";

/// Timestamp format written to the log (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepts the written format plus any fractional seconds a backend adds on
/// the way back out.
const TIMESTAMP_READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A row of the migration log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub migration_id: String,
    pub sql: String,
    pub success: bool,
    pub error: Option<String>,
    pub timestamp: NaiveDateTime,
}

/// A row about to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub migration_id: String,
    pub sql: String,
    pub success: bool,
    pub error: Option<String>,
}

impl NewLogEntry {
    pub fn success(migration_id: &str, sql: String) -> Self {
        Self {
            migration_id: migration_id.to_string(),
            sql,
            success: true,
            error: None,
        }
    }

    pub fn failure(migration_id: &str, sql: String, error: String) -> Self {
        Self {
            migration_id: migration_id.to_string(),
            sql,
            success: false,
            error: Some(error),
        }
    }
}

/// Handle on the log table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationLog {
    table: String,
}

impl Default for MigrationLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_TABLE)
    }
}

impl MigrationLog {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Name of the plan step that creates the log table.
    pub fn step_name(&self) -> String {
        format!("create {} table", self.table)
    }

    /// The log table itself, as a schema descriptor.
    pub fn descriptor(&self) -> Table {
        Table::new(
            self.table.clone(),
            vec![
                Column::id("id"),
                Column::nvarchar("migration_id", 255),
                Column::new("sql", ColumnType::Text),
                Column::new("success", ColumnType::Bool),
                Column::new("error", ColumnType::Text).nullable(),
                Column::new("timestamp", ColumnType::DateTime),
            ],
        )
    }

    pub async fn exists(&self, db: &dyn Database) -> MigrateResult<bool> {
        db.relation_exists(&self.table)
            .await
            .map_err(|e| MigrateError::LogRead(e.to_string()))
    }

    /// Every row, oldest first. An absent table reads as empty.
    pub async fn entries(
        &self,
        db: &dyn Database,
        dialect: &dyn SqlDialect,
    ) -> MigrateResult<Vec<LogEntry>> {
        if !self.exists(db).await? {
            return Ok(Vec::new());
        }

        let q = |ident: &str| dialect.quote_ident(ident);
        let sql = format!(
            "SELECT {}, {}, {}, {}, {}, CAST({} AS {}) FROM {} ORDER BY {}",
            q("id"),
            q("migration_id"),
            q("sql"),
            q("success"),
            q("error"),
            q("timestamp"),
            dialect.text_cast_type(),
            q(&self.table),
            q("id"),
        );
        let rows = db
            .query_rows(&sql)
            .await
            .map_err(|e| MigrateError::LogRead(e.to_string()))?;

        rows.iter().map(|row| parse_row(row)).collect()
    }

    /// Names with at least one successful row.
    pub async fn succeeded(
        &self,
        db: &dyn Database,
        dialect: &dyn SqlDialect,
    ) -> MigrateResult<HashSet<String>> {
        Ok(self
            .entries(db, dialect)
            .await?
            .into_iter()
            .filter(|e| e.success)
            .map(|e| e.migration_id)
            .collect())
    }

    /// Append one row stamped with the current UTC time.
    pub async fn append(
        &self,
        db: &dyn Database,
        dialect: &dyn SqlDialect,
        entry: &NewLogEntry,
    ) -> MigrateResult<()> {
        let q = |ident: &str| dialect.quote_ident(ident);
        let sql = format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, {})",
            q(&self.table),
            q("migration_id"),
            q("sql"),
            q("success"),
            q("error"),
            q("timestamp"),
            dialect.timestamp_placeholder(),
        );
        let timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let params = [
            SqlValue::from(entry.migration_id.as_str()),
            SqlValue::from(entry.sql.as_str()),
            SqlValue::from(entry.success),
            SqlValue::from(entry.error.clone()),
            SqlValue::from(timestamp),
        ];

        db.execute_with_params(&sql, &params)
            .await
            .map(|_| ())
            .map_err(|e| MigrateError::LogWrite {
                name: entry.migration_id.clone(),
                message: e.to_string(),
            })
    }
}

fn parse_row(row: &[SqlValue]) -> MigrateResult<LogEntry> {
    let bad = |what: &str| MigrateError::LogRead(format!("malformed {what} in row {row:?}"));

    let [id, migration_id, sql, success, error, timestamp] = row else {
        return Err(MigrateError::LogRead(format!(
            "expected 6 columns, got {}",
            row.len()
        )));
    };

    let timestamp = timestamp.as_str().ok_or_else(|| bad("timestamp"))?;
    let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_READ_FORMAT)
        .map_err(|e| MigrateError::LogRead(format!("bad timestamp '{timestamp}': {e}")))?;

    Ok(LogEntry {
        id: id.as_i64().ok_or_else(|| bad("id"))?,
        migration_id: migration_id
            .as_str()
            .ok_or_else(|| bad("migration_id"))?
            .to_string(),
        sql: sql.as_str().ok_or_else(|| bad("sql"))?.to_string(),
        success: success.as_bool().ok_or_else(|| bad("success"))?,
        error: error.as_str().map(str::to_string),
        timestamp,
    })
}

#[cfg(test)]
#[path = "migration_log_test.rs"]
mod tests;
