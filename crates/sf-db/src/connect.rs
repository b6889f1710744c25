//! Backend selection from configuration

use crate::duckdb::DuckDbBackend;
use crate::error::{DbError, DbResult};
use crate::sqlite::SqliteBackend;
use crate::traits::Database;
use sf_core::{DatabaseConfig, DbType};
use std::sync::Arc;

/// Open a connection for the configured backend.
///
/// MySQL is a render-only target: its DDL can be produced and inspected, but
/// there is no live driver behind it.
pub fn connect(config: &DatabaseConfig) -> DbResult<Arc<dyn Database>> {
    log::debug!("Opening {:?} database at {}", config.db_type, config.path);
    match config.db_type {
        DbType::Sqlite => Ok(Arc::new(SqliteBackend::new(&config.path)?)),
        DbType::DuckDb => Ok(Arc::new(DuckDbBackend::new(&config.path)?)),
        DbType::MySql => Err(DbError::NotImplemented {
            backend: "mysql".to_string(),
            feature: "live connections (use `sf render --dialect mysql` instead)".to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "connect_test.rs"]
mod tests;
