//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Database, SqlValue};
use async_trait::async_trait;
use duckdb::types::{Value, ValueRef};
use duckdb::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(sql, [])
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    fn execute_with_params_sync(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        let conn = self.lock()?;
        let values = params.iter().map(to_duckdb_value);
        conn.execute(sql, duckdb::params_from_iter(values))
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    fn query_rows_sync(&self, sql: &str) -> DbResult<Vec<Vec<SqlValue>>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        // column_count() on an unexecuted statement is unreliable in DuckDB,
        // so read the width from each row.
        let rows = stmt
            .query_map([], |row| {
                let width = row.as_ref().column_count();
                (0..width)
                    .map(|i| row.get_ref(i).map(from_duckdb_ref))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn relation_exists_sync(&self, name: &str) -> DbResult<bool> {
        let conn = self.lock()?;

        // Handle schema-qualified names
        let (schema, table) = match name.rfind('.') {
            Some(pos) => (&name[..pos], &name[pos + 1..]),
            None => ("main", name),
        };

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
            duckdb::params![schema, table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn transaction_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::TransactionError(format!("{sql} failed: {e}")))
    }
}

fn to_duckdb_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(n) => Value::BigInt(*n),
        SqlValue::Real(x) => Value::Double(*x),
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Bool(b) => Value::Boolean(*b),
    }
}

fn from_duckdb_ref(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Boolean(b) => SqlValue::Bool(b),
        ValueRef::TinyInt(n) => SqlValue::Integer(i64::from(n)),
        ValueRef::SmallInt(n) => SqlValue::Integer(i64::from(n)),
        ValueRef::Int(n) => SqlValue::Integer(i64::from(n)),
        ValueRef::BigInt(n) => SqlValue::Integer(n),
        ValueRef::UTinyInt(n) => SqlValue::Integer(i64::from(n)),
        ValueRef::USmallInt(n) => SqlValue::Integer(i64::from(n)),
        ValueRef::UInt(n) => SqlValue::Integer(i64::from(n)),
        ValueRef::Float(x) => SqlValue::Real(f64::from(x)),
        ValueRef::Double(x) => SqlValue::Real(x),
        ValueRef::Text(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        other => SqlValue::Text(format!("{other:?}")),
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn execute_with_params(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        self.execute_with_params_sync(sql, params)
    }

    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Vec<SqlValue>>> {
        self.query_rows_sync(sql)
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.relation_exists_sync(name)
    }

    async fn begin(&self) -> DbResult<()> {
        self.transaction_sync("BEGIN TRANSACTION")
    }

    async fn commit(&self) -> DbResult<()> {
        self.transaction_sync("COMMIT")
    }

    async fn rollback(&self) -> DbResult<()> {
        self.transaction_sync("ROLLBACK")
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
