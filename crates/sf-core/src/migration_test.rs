use super::*;
use crate::schema::ColumnType;

#[test]
fn test_raw_statement_lookup() {
    let raw = RawStatement::new()
        .sqlite("INSERT INTO t VALUES (1)")
        .mysql("INSERT INTO `t` VALUES (1)");
    assert_eq!(raw.for_dialect(Dialect::Sqlite), Some("INSERT INTO t VALUES (1)"));
    assert_eq!(raw.for_dialect(Dialect::MySql), Some("INSERT INTO `t` VALUES (1)"));
    assert_eq!(raw.for_dialect(Dialect::DuckDb), None);
    assert_eq!(
        raw.dialects().collect::<Vec<_>>(),
        vec![Dialect::Sqlite, Dialect::MySql]
    );
}

#[test]
fn test_raw_statement_portable_covers_all_dialects() {
    let raw = RawStatement::portable("SELECT 1");
    for dialect in Dialect::ALL {
        assert_eq!(raw.for_dialect(dialect), Some("SELECT 1"));
    }
}

#[test]
fn test_raw_statement_requires_a_literal() {
    let migration = Migration::raw(RawStatement::new());
    let err = migration.check().unwrap_err();
    assert!(err.contains("no dialect literals"), "{err}");
}

#[test]
fn test_raw_statement_rejects_blank_literal() {
    let migration = Migration::raw(RawStatement::new().sqlite("   "));
    assert!(migration.check().is_err());
}

#[test]
fn test_raw_statement_deserialize_rejects_unknown_dialect() {
    let ok: RawStatement =
        serde_yaml::from_str("sqlite: SELECT 1\nmysql: SELECT 2\n").unwrap();
    assert_eq!(ok.for_dialect(Dialect::MySql), Some("SELECT 2"));

    let err = serde_yaml::from_str::<RawStatement>("oracle: SELECT 1\n");
    assert!(err.is_err());
}

#[test]
fn test_add_column_rejects_primary_key() {
    let migration = Migration::add_column("user", Column::id("id2"));
    let err = migration.check().unwrap_err();
    assert!(err.contains("primary key"), "{err}");
}

#[test]
fn test_add_column_checks_column() {
    let migration = Migration::add_column("user", Column::new("theme", ColumnType::Varchar));
    assert!(migration.check().is_err());

    let migration = Migration::add_column("user", Column::varchar("theme", 20).nullable());
    assert!(migration.check().is_ok());
}

#[test]
fn test_kind() {
    assert_eq!(
        Migration::add_index(Index::new("user", ["login"])).kind(),
        MigrationKind::AddIndex
    );
    assert_eq!(MigrationKind::CreateTable.to_string(), "create_table");
}

#[test]
fn test_migration_deserialize_variants() {
    let yaml = r#"
- create_table:
    name: star
    columns:
      - { name: id, type: bigint, primary_key: true, auto_increment: true }
      - { name: user_id, type: bigint }
- add_column:
    table: user
    column: { name: email_verified, type: bool, nullable: true }
- add_index: { table: star, columns: [user_id], unique: true }
- raw:
    sqlite: "INSERT INTO star VALUES (1, 1)"
"#;
    let migrations: Vec<Migration> = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(migrations.len(), 4);
    assert_eq!(migrations[0].kind(), MigrationKind::CreateTable);
    assert_eq!(migrations[1].kind(), MigrationKind::AddColumn);
    assert_eq!(migrations[2].kind(), MigrationKind::AddIndex);
    assert_eq!(migrations[3].kind(), MigrationKind::Raw);
    for m in &migrations {
        assert!(m.check().is_ok(), "{m:?}");
    }
}
