//! sf-sql - SQL layer for Schemaflow
//!
//! This crate maps semantic schema descriptors to dialect-specific DDL
//! (SQLite, MySQL, DuckDB), renders migration steps, and parses SQL with
//! sqlparser-rs for validation.

pub mod dialect;
pub mod error;
pub mod render;

pub use dialect::{
    dialect_for, dialect_for_id, DuckDbDialect, MySqlDialect, SqlDialect, SqliteDialect,
};
pub use error::{SqlError, SqlResult};
pub use render::RenderSql;
