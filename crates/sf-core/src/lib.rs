//! sf-core - Core library for Schemaflow
//!
//! This crate provides the schema descriptors (columns, tables, indexes),
//! the closed set of migration kinds, the ordered migration catalog, and
//! project configuration parsing shared by all Schemaflow components.

pub mod catalog;
pub mod config;
pub mod error;
pub mod migration;
pub mod migration_name;
pub mod schema;

pub use catalog::{Catalog, CatalogBuilder, MigrationStep};
pub use config::{Config, DatabaseConfig, DbType, Dialect, TransactionMode};
pub use error::{CoreError, CoreResult};
pub use migration::{AddColumn, Migration, MigrationKind, RawStatement};
pub use migration_name::MigrationName;
pub use schema::{Column, ColumnType, Index, Table};
