//! Error types for sf-core

use thiserror::Error;

/// Core error type for Schemaflow
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Invalid configuration value
    #[error("[E002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E003: Dialect identifier not known to Schemaflow
    #[error("[E003] Unsupported dialect '{name}' (expected one of: sqlite, mysql, duckdb)")]
    UnsupportedDialect { name: String },

    /// E004: Two catalog entries share a name
    #[error("[E004] Duplicate migration name: '{name}'")]
    DuplicateMigration { name: String },

    /// E005: A migration descriptor violates a schema invariant
    #[error("[E005] Invalid migration '{name}': {reason}")]
    InvalidMigration { name: String, reason: String },

    /// E006: Migration name is empty
    #[error("[E006] Migration name must not be empty (catalog position {ordinal})")]
    EmptyMigrationName { ordinal: usize },

    /// E007: Catalog directory not found
    #[error("[E007] Catalog path not found: {path}")]
    CatalogPathNotFound { path: String },

    /// E008: Catalog file could not be parsed
    #[error("[E008] Failed to parse catalog file {path}: {details}")]
    CatalogParseError { path: String, details: String },

    /// E009: IO error
    #[error("[E009] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E010: IO error with file path context
    #[error("[E010] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E011: YAML parse error
    #[error("[E011] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
