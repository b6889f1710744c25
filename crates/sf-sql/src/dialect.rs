//! SQL dialect translation.
//!
//! Each [`SqlDialect`] maps semantic column types and constraints to the
//! backend's DDL spelling and quotes identifiers for that backend. Look one
//! up by identifier with [`dialect_for`].

use sf_core::{Column, ColumnType, Dialect as DialectId, Table};
use sqlparser::ast::Statement;
use sqlparser::dialect::{
    Dialect, DuckDbDialect as SqlParserDuckDb, MySqlDialect as SqlParserMySql,
    SQLiteDialect as SqlParserSqlite,
};
use sqlparser::parser::Parser;

use crate::error::{SqlError, SqlResult};

/// Trait for SQL dialect implementations
pub trait SqlDialect: Send + Sync {
    /// Get the underlying sqlparser dialect
    fn parser_dialect(&self) -> &dyn Dialect;

    /// Parse SQL into AST statements
    fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        Parser::parse_sql(self.parser_dialect(), sql).map_err(|e| {
            let message = e.to_string();
            let (line, column) = parse_location_from_error(&message);
            SqlError::ParseError {
                message,
                line,
                column,
            }
        })
    }

    /// Dialect identifier
    fn id(&self) -> DialectId;

    /// Get the dialect name
    fn name(&self) -> &'static str {
        self.id().as_str()
    }

    /// Quote an identifier for this dialect
    fn quote_ident(&self, ident: &str) -> String;

    /// Native type keyword for a column, with length substituted.
    fn column_type(&self, column: &Column) -> String;

    /// Full column definition as it appears inside `CREATE TABLE` or
    /// `ADD COLUMN`.
    fn column_definition(&self, table: &str, column: &Column) -> String;

    /// Statements that must run before `CREATE TABLE` for this table.
    fn create_table_prelude(&self, _table: &Table) -> Vec<String> {
        Vec::new()
    }

    /// Reject column additions the backend cannot apply.
    fn check_add_column(&self, table: &str, column: &Column) -> SqlResult<()>;

    /// Whether DDL participates in transactions (no implicit commit).
    fn supports_transactional_ddl(&self) -> bool;

    /// Type name for `CAST(expr AS <type>)` to text.
    fn text_cast_type(&self) -> &'static str;

    /// Placeholder for binding a `YYYY-MM-DD HH:MM:SS` string into a
    /// date-time column.
    fn timestamp_placeholder(&self) -> &'static str {
        "?"
    }
}

/// Look up a dialect by identifier (`"sqlite"`, `"mysql"`, `"duckdb"`).
pub fn dialect_for(name: &str) -> SqlResult<Box<dyn SqlDialect>> {
    let id: DialectId = name.parse().map_err(|_| SqlError::UnsupportedDialect {
        dialect: name.to_string(),
        reason: format!(
            "expected one of: {}",
            DialectId::ALL.map(DialectId::as_str).join(", ")
        ),
    })?;
    Ok(dialect_for_id(id))
}

/// The dialect implementation for a known identifier.
pub fn dialect_for_id(id: DialectId) -> Box<dyn SqlDialect> {
    match id {
        DialectId::Sqlite => Box::new(SqliteDialect::new()),
        DialectId::MySql => Box::new(MySqlDialect::new()),
        DialectId::DuckDb => Box::new(DuckDbDialect::new()),
    }
}

/// Parse line and column from a sqlparser error message.
///
/// sqlparser's `ParserError` is a plain string wrapper, so the location is
/// read back out of the "Line: N, Column: M" suffix. Missing or malformed
/// locations yield `(0, 0)`.
fn parse_location_from_error(msg: &str) -> (usize, usize) {
    fn number_after(msg: &str, label: &str) -> Option<usize> {
        let start = msg.find(label)? + label.len();
        let digits: String = msg[start..]
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }

    match (number_after(msg, "Line:"), number_after(msg, "Column:")) {
        (Some(line), Some(column)) => (line, column),
        _ => (0, 0),
    }
}

fn double_quoted(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Sized text type. `Column::check` guarantees a length before rendering.
fn sized(keyword: &str, column: &Column) -> String {
    debug_assert!(
        column.length.is_some(),
        "column '{}' rendered without a length",
        column.name
    );
    match column.length {
        Some(length) => format!("{keyword}({length})"),
        None => keyword.to_string(),
    }
}

fn not_null_rejection(dialect: &dyn SqlDialect, table: &str, column: &Column, reason: &str) -> SqlError {
    SqlError::UnsupportedAddColumn {
        dialect: dialect.name().to_string(),
        table: table.to_string(),
        column: column.name.clone(),
        reason: reason.to_string(),
    }
}

/// SQLite SQL dialect
pub struct SqliteDialect {
    dialect: SqlParserSqlite,
}

impl SqliteDialect {
    /// Create a new SQLite dialect
    pub fn new() -> Self {
        Self {
            dialect: SqlParserSqlite {},
        }
    }
}

impl Default for SqliteDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for SqliteDialect {
    fn parser_dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn id(&self) -> DialectId {
        DialectId::Sqlite
    }

    fn quote_ident(&self, ident: &str) -> String {
        double_quoted(ident)
    }

    fn column_type(&self, column: &Column) -> String {
        match column.column_type {
            // AUTOINCREMENT is only legal on a column declared exactly INTEGER.
            ColumnType::BigInt | ColumnType::Int => "INTEGER".to_string(),
            ColumnType::Varchar => sized("VARCHAR", column),
            ColumnType::NVarchar => sized("NVARCHAR", column),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Bool => "INTEGER".to_string(),
            ColumnType::DateTime => "DATETIME".to_string(),
        }
    }

    fn column_definition(&self, _table: &str, column: &Column) -> String {
        let mut def = format!(
            "{} {}",
            self.quote_ident(&column.name),
            self.column_type(column)
        );
        if column.primary_key {
            def.push_str(" PRIMARY KEY");
            if column.auto_increment {
                def.push_str(" AUTOINCREMENT");
            }
        }
        if !column.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            def.push_str(" DEFAULT ");
            def.push_str(default);
        }
        def
    }

    fn check_add_column(&self, table: &str, column: &Column) -> SqlResult<()> {
        if !column.nullable && column.default.is_none() {
            return Err(not_null_rejection(
                self,
                table,
                column,
                "SQLite requires a default value for NOT NULL columns added to an existing table",
            ));
        }
        Ok(())
    }

    fn supports_transactional_ddl(&self) -> bool {
        true
    }

    fn text_cast_type(&self) -> &'static str {
        "TEXT"
    }
}

/// MySQL SQL dialect
pub struct MySqlDialect {
    dialect: SqlParserMySql,
}

impl MySqlDialect {
    /// Create a new MySQL dialect
    pub fn new() -> Self {
        Self {
            dialect: SqlParserMySql {},
        }
    }
}

impl Default for MySqlDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for MySqlDialect {
    fn parser_dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn id(&self) -> DialectId {
        DialectId::MySql
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn column_type(&self, column: &Column) -> String {
        match column.column_type {
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Int => "INT".to_string(),
            ColumnType::Varchar => sized("VARCHAR", column),
            ColumnType::NVarchar => sized("NVARCHAR", column),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Bool => "TINYINT(1)".to_string(),
            ColumnType::DateTime => "DATETIME".to_string(),
        }
    }

    fn column_definition(&self, _table: &str, column: &Column) -> String {
        // MySQL wants NOT NULL and DEFAULT ahead of AUTO_INCREMENT and the key.
        let mut def = format!(
            "{} {}",
            self.quote_ident(&column.name),
            self.column_type(column)
        );
        if !column.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            def.push_str(" DEFAULT ");
            def.push_str(default);
        }
        if column.auto_increment {
            def.push_str(" AUTO_INCREMENT");
        }
        if column.primary_key {
            def.push_str(" PRIMARY KEY");
        }
        def
    }

    fn check_add_column(&self, _table: &str, _column: &Column) -> SqlResult<()> {
        // MySQL backfills existing rows with the type's implicit default.
        Ok(())
    }

    fn supports_transactional_ddl(&self) -> bool {
        false
    }

    fn text_cast_type(&self) -> &'static str {
        "CHAR"
    }
}

/// DuckDB SQL dialect
pub struct DuckDbDialect {
    dialect: SqlParserDuckDb,
}

impl DuckDbDialect {
    /// Create a new DuckDB dialect
    pub fn new() -> Self {
        Self {
            dialect: SqlParserDuckDb {},
        }
    }

    /// Sequence backing an auto-increment column.
    pub fn sequence_name(table: &str, column: &str) -> String {
        format!("{table}_{column}_seq")
    }
}

impl Default for DuckDbDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for DuckDbDialect {
    fn parser_dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn id(&self) -> DialectId {
        DialectId::DuckDb
    }

    fn quote_ident(&self, ident: &str) -> String {
        double_quoted(ident)
    }

    fn column_type(&self, column: &Column) -> String {
        match column.column_type {
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Int => "INTEGER".to_string(),
            ColumnType::Varchar | ColumnType::NVarchar => sized("VARCHAR", column),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Bool => "BOOLEAN".to_string(),
            ColumnType::DateTime => "TIMESTAMP".to_string(),
        }
    }

    fn column_definition(&self, table: &str, column: &Column) -> String {
        let mut def = format!(
            "{} {}",
            self.quote_ident(&column.name),
            self.column_type(column)
        );
        if column.primary_key {
            def.push_str(" PRIMARY KEY");
        }
        if !column.nullable {
            def.push_str(" NOT NULL");
        }
        if column.auto_increment {
            let seq = Self::sequence_name(table, &column.name);
            def.push_str(&format!(" DEFAULT nextval('{}')", seq.replace('\'', "''")));
        } else if let Some(default) = &column.default {
            def.push_str(" DEFAULT ");
            def.push_str(default);
        }
        def
    }

    fn create_table_prelude(&self, table: &Table) -> Vec<String> {
        table
            .columns
            .iter()
            .filter(|c| c.auto_increment)
            .map(|c| {
                format!(
                    "CREATE SEQUENCE {}",
                    self.quote_ident(&Self::sequence_name(&table.name, &c.name))
                )
            })
            .collect()
    }

    fn check_add_column(&self, table: &str, column: &Column) -> SqlResult<()> {
        if !column.nullable {
            return Err(not_null_rejection(
                self,
                table,
                column,
                "DuckDB cannot add a column with a NOT NULL constraint",
            ));
        }
        Ok(())
    }

    fn supports_transactional_ddl(&self) -> bool {
        true
    }

    fn text_cast_type(&self) -> &'static str {
        "VARCHAR"
    }

    fn timestamp_placeholder(&self) -> &'static str {
        "CAST(? AS TIMESTAMP)"
    }
}

#[cfg(test)]
#[path = "dialect_test.rs"]
mod tests;
