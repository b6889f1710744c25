//! Configuration types and parsing for schemaflow.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable consulted when no `--target` flag is given.
pub const TARGET_ENV_VAR: &str = "SF_TARGET";

/// Main project configuration from schemaflow.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// SQL dialect for the default database; defaults from `database.type`.
    /// Targets do not inherit it.
    #[serde(default)]
    pub dialect: Option<Dialect>,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Directories containing catalog YAML files, applied in this order
    #[serde(default = "default_catalog_paths")]
    pub catalog_paths: Vec<String>,

    /// Name of the migration log table
    #[serde(default = "default_log_table")]
    pub log_table: String,

    /// Transaction granularity for applying steps
    #[serde(default)]
    pub transactions: TransactionMode,

    /// Named target configurations (e.g., dev, staging, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

/// Target-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Database connection override
    pub database: DatabaseConfig,

    /// Dialect override
    #[serde(default)]
    pub dialect: Option<Dialect>,
}

/// Database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database type
    #[serde(rename = "type", default)]
    pub db_type: DbType,

    /// Database path (file path or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DbType::default(),
            path: default_db_path(),
        }
    }
}

/// Database backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// DuckDB
    DuckDb,
    /// MySQL
    MySql,
}

impl DbType {
    /// The dialect that matches this backend.
    pub fn dialect(self) -> Dialect {
        match self {
            DbType::Sqlite => Dialect::Sqlite,
            DbType::DuckDb => Dialect::DuckDb,
            DbType::MySql => Dialect::MySql,
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbType::Sqlite => write!(f, "sqlite"),
            DbType::DuckDb => write!(f, "duckdb"),
            DbType::MySql => write!(f, "mysql"),
        }
    }
}

/// SQL dialect identifier.
///
/// The set is closed: catalog files that key raw statements by anything else
/// are rejected when they are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// SQLite
    Sqlite,
    /// MySQL
    MySql,
    /// DuckDB
    DuckDb,
}

impl Dialect {
    /// Every dialect Schemaflow can render.
    pub const ALL: [Dialect; 3] = [Dialect::Sqlite, Dialect::MySql, Dialect::DuckDb];

    /// The dialect identifier string.
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::MySql => "mysql",
            Dialect::DuckDb => "duckdb",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "mysql" => Ok(Dialect::MySql),
            "duckdb" => Ok(Dialect::DuckDb),
            _ => Err(CoreError::UnsupportedDialect {
                name: s.to_string(),
            }),
        }
    }
}

/// How steps are grouped into transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    /// Each step's statements and its log entry commit together, where the
    /// dialect supports transactional DDL
    #[default]
    PerStep,
    /// No explicit transactions; every statement auto-commits
    None,
}

fn default_catalog_paths() -> Vec<String> {
    vec!["migrations".to_string()]
}

fn default_log_table() -> String {
    "migration_log".to_string()
}

fn default_db_path() -> String {
    ":memory:".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for schemaflow.yml or schemaflow.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("schemaflow.yml");
        let yaml_path = dir.join("schemaflow.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }
        if self.catalog_paths.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "At least one catalog_paths entry must be specified".to_string(),
            });
        }
        if self.log_table.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "log_table cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the target name from the CLI flag or the `SF_TARGET` env var.
    pub fn resolve_target(cli_target: Option<&str>) -> Option<String> {
        cli_target
            .map(str::to_string)
            .or_else(|| std::env::var(TARGET_ENV_VAR).ok())
            .filter(|t| !t.is_empty())
    }

    /// Database configuration for the given target, or the default one.
    pub fn database_for_target(&self, target: Option<&str>) -> CoreResult<&DatabaseConfig> {
        match target {
            None => Ok(&self.database),
            Some(name) => self
                .targets
                .get(name)
                .map(|t| &t.database)
                .ok_or_else(|| self.unknown_target(name)),
        }
    }

    /// Dialect for the given target.
    ///
    /// A target uses its own `dialect`, else the dialect of its database.
    /// The project-level `dialect` applies only to the default database, so
    /// a target that switches backend never inherits a mismatched dialect.
    pub fn dialect_for_target(&self, target: Option<&str>) -> CoreResult<Dialect> {
        match target {
            None => Ok(self
                .dialect
                .unwrap_or_else(|| self.database.db_type.dialect())),
            Some(name) => {
                let target = self
                    .targets
                    .get(name)
                    .ok_or_else(|| self.unknown_target(name))?;
                Ok(target
                    .dialect
                    .unwrap_or_else(|| target.database.db_type.dialect()))
            }
        }
    }

    /// Absolute catalog directories relative to the project root.
    pub fn catalog_dirs(&self, root: &Path) -> Vec<PathBuf> {
        self.catalog_paths.iter().map(|p| root.join(p)).collect()
    }

    fn unknown_target(&self, name: &str) -> CoreError {
        let mut available: Vec<&str> = self.targets.keys().map(String::as_str).collect();
        available.sort_unstable();
        CoreError::ConfigInvalid {
            message: format!(
                "Target '{}' not found. Available targets: [{}]",
                name,
                available.join(", ")
            ),
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
