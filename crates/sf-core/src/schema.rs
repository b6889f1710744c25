//! Passive schema descriptors: columns, tables, and indexes.
//!
//! These types describe the desired shape of the schema. They carry no
//! dialect knowledge; `sf-sql` turns them into DDL.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Semantic column type, independent of any backend's keyword spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// 64-bit integer
    BigInt,
    /// 32-bit integer
    Int,
    /// Variable-length text with a maximum length
    Varchar,
    /// Variable-length unicode text with a maximum length
    NVarchar,
    /// Unbounded text
    Text,
    /// Boolean flag
    Bool,
    /// Date and time without time zone
    DateTime,
}

impl ColumnType {
    /// Whether this type needs an explicit length.
    pub fn requires_length(self) -> bool {
        matches!(self, ColumnType::Varchar | ColumnType::NVarchar)
    }

    /// Whether this type can carry an auto-increment clause.
    pub fn is_integer(self) -> bool {
        matches!(self, ColumnType::BigInt | ColumnType::Int)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnType::BigInt => "bigint",
            ColumnType::Int => "int",
            ColumnType::Varchar => "varchar",
            ColumnType::NVarchar => "nvarchar",
            ColumnType::Text => "text",
            ColumnType::Bool => "bool",
            ColumnType::DateTime => "datetime",
        };
        f.write_str(s)
    }
}

/// A single column definition.
///
/// Built either as a literal struct, through the consuming builder methods,
/// or deserialized from a catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Semantic type
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Maximum length; required for `varchar`/`nvarchar`, ignored otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,

    /// Whether NULL values are allowed
    #[serde(default)]
    pub nullable: bool,

    /// Whether this column is the table's primary key
    #[serde(default)]
    pub primary_key: bool,

    /// Whether values are generated by the database
    #[serde(default)]
    pub auto_increment: bool,

    /// Default value as a literal SQL expression, emitted verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl Column {
    /// Create a NOT NULL column of the given type.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            length: None,
            nullable: false,
            primary_key: false,
            auto_increment: false,
            default: None,
        }
    }

    /// Shorthand for a `varchar(length)` column.
    pub fn varchar(name: impl Into<String>, length: u32) -> Self {
        Self::new(name, ColumnType::Varchar).length(length)
    }

    /// Shorthand for an `nvarchar(length)` column.
    pub fn nvarchar(name: impl Into<String>, length: u32) -> Self {
        Self::new(name, ColumnType::NVarchar).length(length)
    }

    /// Shorthand for the conventional `BIGINT` auto-increment primary key.
    pub fn id(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::BigInt)
            .primary_key()
            .auto_increment()
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn default_value(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    /// Check the column-level invariants, returning a reason on failure.
    pub fn check(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("column name must not be empty".to_string());
        }
        if self.column_type.requires_length() && !matches!(self.length, Some(n) if n > 0) {
            return Err(format!(
                "column '{}' of type {} requires a positive length",
                self.name, self.column_type
            ));
        }
        if self.auto_increment {
            if !self.column_type.is_integer() {
                return Err(format!(
                    "auto-increment column '{}' must be bigint or int, found {}",
                    self.name, self.column_type
                ));
            }
            if !self.primary_key {
                return Err(format!(
                    "auto-increment column '{}' must be the primary key",
                    self.name
                ));
            }
        }
        if self.primary_key && self.nullable {
            return Err(format!(
                "primary key column '{}' cannot be nullable",
                self.name
            ));
        }
        Ok(())
    }
}

/// A table definition with ordered columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Table {
    /// Table name
    pub name: String,

    /// Columns in declaration order
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// The primary key column, if the table declares one.
    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// Check the table-level invariants, returning a reason on failure.
    pub fn check(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("table name must not be empty".to_string());
        }
        if self.columns.is_empty() {
            return Err(format!("table '{}' has no columns", self.name));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            column.check()?;
            if !seen.insert(column.name.as_str()) {
                return Err(format!(
                    "duplicate column '{}' in table '{}'",
                    column.name, self.name
                ));
            }
        }

        let pk_count = self.columns.iter().filter(|c| c.primary_key).count();
        if pk_count > 1 {
            return Err(format!(
                "table '{}' declares {} primary key columns; at most one is allowed",
                self.name, pk_count
            ));
        }
        Ok(())
    }
}

/// An index over one or more columns of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Index {
    /// Explicit index name; derived from table and columns when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Indexed table
    pub table: String,

    /// Indexed columns, in key order
    pub columns: Vec<String>,

    /// Whether the index enforces uniqueness
    #[serde(default)]
    pub unique: bool,
}

impl Index {
    pub fn new<I, S>(table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The index name used in DDL.
    ///
    /// Derived names are `<table>_<col1>_<col2>...` so that the same
    /// declaration yields the same name on every run and every dialect.
    pub fn resolved_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => {
                let mut name = self.table.clone();
                for column in &self.columns {
                    name.push('_');
                    name.push_str(column);
                }
                name
            }
        }
    }

    /// Check the index invariants, returning a reason on failure.
    pub fn check(&self) -> Result<(), String> {
        if self.table.is_empty() {
            return Err("index table must not be empty".to_string());
        }
        if self.columns.is_empty() {
            return Err(format!("index on '{}' has no columns", self.table));
        }
        if matches!(&self.name, Some(n) if n.is_empty()) {
            return Err(format!("index on '{}' has an empty name", self.table));
        }
        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.is_empty() {
                return Err(format!("index on '{}' has an empty column name", self.table));
            }
            if !seen.insert(column.as_str()) {
                return Err(format!(
                    "index on '{}' lists column '{}' twice",
                    self.table, column
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
