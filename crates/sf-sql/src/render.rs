//! Rendering of migration descriptors into dialect-specific SQL.

use sf_core::{AddColumn, Index, Migration, RawStatement, Table};

use crate::dialect::SqlDialect;
use crate::error::{SqlError, SqlResult};

/// Something that renders to an ordered list of SQL statements.
pub trait RenderSql {
    /// Render for `dialect`. Statements are returned without trailing
    /// semicolons and must be executed in order.
    fn render(&self, dialect: &dyn SqlDialect) -> SqlResult<Vec<String>>;
}

impl RenderSql for Migration {
    fn render(&self, dialect: &dyn SqlDialect) -> SqlResult<Vec<String>> {
        self.check().map_err(SqlError::InvalidMigration)?;
        match self {
            Migration::CreateTable(table) => Ok(render_create_table(table, dialect)),
            Migration::AddColumn(add) => render_add_column(add, dialect).map(|s| vec![s]),
            Migration::AddIndex(index) => Ok(vec![render_add_index(index, dialect)]),
            Migration::Raw(raw) => render_raw(raw, dialect).map(|s| vec![s]),
        }
    }
}

/// `CREATE TABLE` with every column in declared order, preceded by any
/// statements the dialect needs first.
pub fn render_create_table(table: &Table, dialect: &dyn SqlDialect) -> Vec<String> {
    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|c| dialect.column_definition(&table.name, c))
        .collect();

    let mut statements = dialect.create_table_prelude(table);
    statements.push(format!(
        "CREATE TABLE {} (\n  {}\n)",
        dialect.quote_ident(&table.name),
        columns.join(",\n  ")
    ));
    statements
}

pub fn render_add_column(add: &AddColumn, dialect: &dyn SqlDialect) -> SqlResult<String> {
    dialect.check_add_column(&add.table, &add.column)?;
    Ok(format!(
        "ALTER TABLE {} ADD COLUMN {}",
        dialect.quote_ident(&add.table),
        dialect.column_definition(&add.table, &add.column)
    ))
}

pub fn render_add_index(index: &Index, dialect: &dyn SqlDialect) -> String {
    let columns: Vec<String> = index
        .columns
        .iter()
        .map(|c| dialect.quote_ident(c))
        .collect();
    format!(
        "CREATE {}INDEX {} ON {} ({})",
        if index.unique { "UNIQUE " } else { "" },
        dialect.quote_ident(&index.resolved_name()),
        dialect.quote_ident(&index.table),
        columns.join(", ")
    )
}

/// The literal registered for the dialect, untouched.
pub fn render_raw(raw: &RawStatement, dialect: &dyn SqlDialect) -> SqlResult<String> {
    raw.for_dialect(dialect.id())
        .map(str::to_string)
        .ok_or_else(|| {
            let available: Vec<&str> = raw.dialects().map(|d| d.as_str()).collect();
            SqlError::UnsupportedDialect {
                dialect: dialect.name().to_string(),
                reason: format!(
                    "raw statement has no SQL for this dialect (available: {})",
                    available.join(", ")
                ),
            }
        })
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
