//! End-to-end engine runs against real SQLite and DuckDB databases.

use sf_core::{Catalog, Column, ColumnType, Index, Migration, RawStatement, Table};
use sf_db::{Database, DuckDbBackend, SqliteBackend};
use sf_migrate::{EngineState, MigrateError, Migrator};

fn scenario_catalog() -> Catalog {
    Catalog::builder()
        .step(
            "create user table",
            Migration::create_table(Table::new(
                "user",
                vec![Column::id("id"), Column::nvarchar("login", 255)],
            )),
        )
        .step(
            "add unique index user.login",
            Migration::add_index(Index::new("user", ["login"]).unique()),
        )
        .build()
        .unwrap()
}

fn monitor_catalog() -> Catalog {
    Catalog::builder()
        .step(
            "create monitor_type table",
            Migration::create_table(Table::new(
                "monitor_type",
                vec![
                    Column::id("id"),
                    Column::varchar("name", 50),
                    Column::new("created", ColumnType::DateTime),
                ],
            )),
        )
        .step(
            "insert http type",
            Migration::raw(
                RawStatement::new()
                    .sqlite("INSERT INTO monitor_type (name, created) VALUES ('HTTP', CURRENT_TIMESTAMP)")
                    .mysql("INSERT INTO `monitor_type` (`name`, `created`) VALUES ('HTTP', NOW())")
                    .duckdb("INSERT INTO monitor_type (name, created) VALUES ('HTTP', now())"),
            ),
        )
        .step(
            "Add monitor_type.enabled column",
            Migration::add_column(
                "monitor_type",
                Column::new("enabled", ColumnType::Bool).nullable(),
            ),
        )
        .build()
        .unwrap()
}

async fn count(db: &dyn Database, sql: &str) -> i64 {
    let rows = db.query_rows(sql).await.unwrap();
    rows[0][0].as_i64().unwrap()
}

#[tokio::test]
async fn test_scenario_sqlite_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.db");
    let catalog = scenario_catalog();
    let migrator = Migrator::new(&catalog, "sqlite").unwrap();

    {
        let db = SqliteBackend::from_path(&path).unwrap();
        let report = migrator.run(&db).await.unwrap();
        assert_eq!(report.state, EngineState::Completed);
        assert_eq!(
            report.applied,
            vec![
                "create migration_log table",
                "create user table",
                "add unique index user.login"
            ]
        );
    }

    // A fresh connection sees the committed schema and log.
    let db = SqliteBackend::from_path(&path).unwrap();
    assert!(db.relation_exists("user").await.unwrap());
    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'user_login'"
        )
        .await,
        1
    );

    db.execute("INSERT INTO user (login) VALUES ('ann')").await.unwrap();
    let dup = db.execute("INSERT INTO user (login) VALUES ('ann')").await;
    assert!(dup.is_err(), "unique index should reject duplicate login");

    let entries = migrator.log().entries(&db, migrator.dialect()).await.unwrap();
    let logged: Vec<(&str, bool)> = entries
        .iter()
        .map(|e| (e.migration_id.as_str(), e.success))
        .collect();
    assert_eq!(
        logged,
        vec![
            ("create migration_log table", true),
            ("create user table", true),
            ("add unique index user.login", true),
        ]
    );
    assert!(entries[1].sql.starts_with("CREATE TABLE \"user\""));

    let rerun = migrator.run(&db).await.unwrap();
    assert!(rerun.applied.is_empty());
    assert_eq!(
        migrator.log().entries(&db, migrator.dialect()).await.unwrap().len(),
        3
    );
}

#[tokio::test]
async fn test_order_preserved_in_log() {
    let db = SqliteBackend::in_memory().unwrap();
    let catalog = monitor_catalog();
    let migrator = Migrator::new(&catalog, "sqlite").unwrap();
    migrator.run(&db).await.unwrap();

    let logged: Vec<String> = migrator
        .log()
        .entries(&db, migrator.dialect())
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.success)
        .map(|e| e.migration_id)
        .collect();
    let expected: Vec<String> = migrator.plan().iter().map(|s| s.name.clone()).collect();
    assert_eq!(logged, expected);
}

#[tokio::test]
async fn test_halt_then_retry_after_fix() {
    let catalog = Catalog::builder()
        .step(
            "create account table",
            Migration::create_table(Table::new("account", vec![Column::id("id")])),
        )
        .step(
            "seed plan",
            Migration::raw(RawStatement::portable("INSERT INTO plan (id) VALUES (1)")),
        )
        .step(
            "create star table",
            Migration::create_table(Table::new("star", vec![Column::id("id")])),
        )
        .build()
        .unwrap();
    let db = SqliteBackend::in_memory().unwrap();
    let migrator = Migrator::new(&catalog, "sqlite").unwrap();

    let err = migrator.run(&db).await.unwrap_err();
    match &err {
        MigrateError::Execution { name, message } => {
            assert_eq!(name, "seed plan");
            assert!(message.contains("plan"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!db.relation_exists("star").await.unwrap());

    let entries = migrator.log().entries(&db, migrator.dialect()).await.unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2].migration_id, "seed plan");
    assert!(!entries[2].success);

    // Out-of-band fix, then the same plan retries the failed step.
    db.execute("CREATE TABLE plan (id INTEGER)").await.unwrap();
    let report = migrator.run(&db).await.unwrap();
    assert_eq!(report.applied, vec!["seed plan", "create star table"]);
    assert_eq!(
        report.skipped,
        vec!["create migration_log table", "create account table"]
    );

    let entries = migrator.log().entries(&db, migrator.dialect()).await.unwrap();
    let seed: Vec<bool> = entries
        .iter()
        .filter(|e| e.migration_id == "seed plan")
        .map(|e| e.success)
        .collect();
    assert_eq!(seed, vec![false, true]);
}

#[tokio::test]
async fn test_duckdb_run_is_idempotent() {
    let db = DuckDbBackend::in_memory().unwrap();
    let catalog = monitor_catalog();
    let migrator = Migrator::new(&catalog, "duckdb").unwrap();

    let first = migrator.run(&db).await.unwrap();
    assert_eq!(first.applied.len(), 4);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM monitor_type").await, 1);

    let second = migrator.run(&db).await.unwrap();
    assert!(second.applied.is_empty());
    assert_eq!(count(&db, "SELECT COUNT(*) FROM monitor_type").await, 1);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM migration_log").await, 4);
}

#[tokio::test]
async fn test_raw_literal_selected_for_sqlite() {
    let db = SqliteBackend::in_memory().unwrap();
    let catalog = monitor_catalog();
    let migrator = Migrator::new(&catalog, "sqlite").unwrap();
    migrator.run(&db).await.unwrap();

    let entries = migrator.log().entries(&db, migrator.dialect()).await.unwrap();
    let raw = entries
        .iter()
        .find(|e| e.migration_id == "insert http type")
        .unwrap();
    assert_eq!(
        raw.sql,
        "INSERT INTO monitor_type (name, created) VALUES ('HTTP', CURRENT_TIMESTAMP)"
    );
}

#[test]
fn test_mysql_plan_renders_without_connection() {
    let catalog = monitor_catalog();
    let migrator = Migrator::new(&catalog, "mysql").unwrap();
    let raw = &migrator.plan()[2];
    assert_eq!(
        raw.statements,
        vec!["INSERT INTO `monitor_type` (`name`, `created`) VALUES ('HTTP', NOW())"]
    );
    assert!(migrator.plan()[1].statements[0].contains("AUTO_INCREMENT PRIMARY KEY"));
}

#[test]
fn test_duplicate_names_fail_before_connecting() {
    let err = Catalog::builder()
        .step(
            "create user table",
            Migration::create_table(Table::new("user", vec![Column::id("id")])),
        )
        .step(
            "create user table",
            Migration::create_table(Table::new("user2", vec![Column::id("id")])),
        )
        .build()
        .unwrap_err();
    let err = MigrateError::from(err);
    assert!(matches!(err, MigrateError::DuplicateName { ref name } if name == "create user table"));
}
