use super::*;
use async_trait::async_trait;
use sf_core::{Column, ColumnType, Index, RawStatement, Table};
use sf_db::{DbError, DbResult, SqlValue, SqliteBackend};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Counts statements issued by step execution; log traffic goes through
/// `execute_with_params` and `query_rows` and is not counted.
struct CountingDb {
    inner: SqliteBackend,
    statements: AtomicUsize,
    fail_rollback: AtomicBool,
}

impl CountingDb {
    fn new() -> Self {
        Self {
            inner: SqliteBackend::in_memory().unwrap(),
            statements: AtomicUsize::new(0),
            fail_rollback: AtomicBool::new(false),
        }
    }

    fn failing_rollback() -> Self {
        let db = Self::new();
        db.fail_rollback.store(true, Ordering::SeqCst);
        db
    }

    fn take_count(&self) -> usize {
        self.statements.swap(0, Ordering::SeqCst)
    }
}

#[async_trait]
impl Database for CountingDb {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.inner.execute(sql).await
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.statements.fetch_add(1, Ordering::SeqCst);
        self.inner.execute_batch(sql).await
    }

    async fn execute_with_params(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        self.inner.execute_with_params(sql, params).await
    }

    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Vec<SqlValue>>> {
        self.inner.query_rows(sql).await
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.inner.relation_exists(name).await
    }

    async fn begin(&self) -> DbResult<()> {
        self.inner.begin().await
    }

    async fn commit(&self) -> DbResult<()> {
        self.inner.commit().await
    }

    async fn rollback(&self) -> DbResult<()> {
        if self.fail_rollback.load(Ordering::SeqCst) {
            return Err(DbError::TransactionError("rollback refused".to_string()));
        }
        self.inner.rollback().await
    }

    fn db_type(&self) -> &'static str {
        self.inner.db_type()
    }
}

fn user_catalog() -> Catalog {
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

fn names(plan: &[PlannedStep]) -> Vec<&str> {
    plan.iter().map(|s| s.name.as_str()).collect()
}

#[test]
fn test_plan_starts_with_log_table_step() {
    let migrator = Migrator::new(&user_catalog(), "sqlite").unwrap();
    assert_eq!(
        names(migrator.plan()),
        vec![
            "create migration_log table",
            "create user table",
            "add unique index user.login"
        ]
    );
    assert_eq!(migrator.plan()[0].kind, MigrationKind::CreateTable);
}

#[test]
fn test_log_table_name_from_options() {
    let options = MigratorOptions {
        log_table: "schema_history".to_string(),
        ..MigratorOptions::default()
    };
    let migrator = Migrator::with_options(&user_catalog(), "sqlite", options).unwrap();
    assert_eq!(migrator.plan()[0].name, "create schema_history table");
    assert!(migrator.plan()[0].statements[0].contains("\"schema_history\""));
}

#[test]
fn test_reserved_log_step_name_is_duplicate() {
    let catalog = Catalog::builder()
        .step(
            "create migration_log table",
            Migration::raw(RawStatement::portable("SELECT 1")),
        )
        .build()
        .unwrap();
    let err = Migrator::new(&catalog, "sqlite").unwrap_err();
    match err {
        MigrateError::DuplicateName { name } => assert_eq!(name, "create migration_log table"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_dialect_rejected() {
    let err = Migrator::new(&user_catalog(), "oracle").unwrap_err();
    match err {
        MigrateError::UnsupportedDialect { dialect, .. } => assert_eq!(dialect, "oracle"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_raw_without_dialect_literal_rejected_at_plan_time() {
    let catalog = Catalog::builder()
        .step(
            "insert http type",
            Migration::raw(RawStatement::new().mysql("INSERT INTO t VALUES (1)")),
        )
        .build()
        .unwrap();
    let err = Migrator::new(&catalog, "sqlite").unwrap_err();
    match err {
        MigrateError::UnsupportedDialect { dialect, reason } => {
            assert_eq!(dialect, "sqlite");
            assert!(reason.contains("insert http type"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(Migrator::new(&catalog, "mysql").is_ok());
}

#[test]
fn test_not_null_add_column_rejected_for_sqlite() {
    let catalog = Catalog::builder()
        .step(
            "add user.version",
            Migration::add_column("user", Column::new("version", ColumnType::Int)),
        )
        .build()
        .unwrap();
    let err = Migrator::new(&catalog, "sqlite").unwrap_err();
    assert!(matches!(err, MigrateError::Render { ref name, .. } if name == "add user.version"));
}

#[test]
fn test_planned_sql_joins_statements() {
    let migrator = Migrator::new(&user_catalog(), "duckdb").unwrap();
    let log_step = &migrator.plan()[0];
    assert_eq!(log_step.statements.len(), 2);
    assert_eq!(
        log_step.sql(),
        format!("{}{}{}", log_step.statements[0], SQL_SEPARATOR, log_step.statements[1])
    );
}

#[test]
fn test_into_result_for_halted_report() {
    let mut report = RunReport::new();
    report.failure = Some(StepFailure {
        name: "x".to_string(),
        error: "boom".to_string(),
    });
    report.transition(EngineState::Halted);
    assert!(!report.is_success());
    match report.into_result() {
        Err(MigrateError::Execution { name, message }) => {
            assert_eq!(name, "x");
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_summarize_success_wins() {
    let at = chrono::NaiveDateTime::parse_from_str(
        "2026-01-01 00:00:00",
        crate::migration_log::TIMESTAMP_FORMAT,
    )
    .unwrap();
    let entry = |id: i64, name: &str, success: bool| LogEntry {
        id,
        migration_id: name.to_string(),
        sql: String::new(),
        success,
        error: None,
        timestamp: at,
    };
    let entries = vec![
        entry(1, "a", false),
        entry(2, "a", true),
        entry(3, "b", false),
    ];
    let statuses = summarize(&entries);
    assert_eq!(statuses["a"], StepStatus::Applied);
    assert_eq!(statuses["b"], StepStatus::Failed);
    assert!(!statuses.contains_key("c"));
}

#[tokio::test]
async fn test_second_run_executes_nothing() {
    let db = CountingDb::new();
    let migrator = Migrator::new(&user_catalog(), "sqlite").unwrap();

    let first = migrator.run(&db).await.unwrap();
    assert_eq!(first.state, EngineState::Completed);
    assert_eq!(first.applied.len(), 3);
    assert_eq!(db.take_count(), 3);

    let second = migrator.run(&db).await.unwrap();
    assert_eq!(second.state, EngineState::Completed);
    assert!(second.applied.is_empty());
    assert_eq!(second.skipped.len(), 3);
    assert_eq!(db.take_count(), 0);
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn test_backend_mismatch() {
    let db = SqliteBackend::in_memory().unwrap();
    let migrator = Migrator::new(&user_catalog(), "duckdb").unwrap();
    let err = migrator.run(&db).await.unwrap_err();
    assert!(matches!(err, MigrateError::BackendMismatch { .. }));
    assert!(!db.relation_exists("migration_log").await.unwrap());
}

#[tokio::test]
async fn test_failure_rolls_back_and_is_logged() {
    let catalog = Catalog::builder()
        .step(
            "create a then fail",
            Migration::raw(RawStatement::portable(
                "CREATE TABLE a (id INTEGER); INSERT INTO missing VALUES (1)",
            )),
        )
        .step(
            "never runs",
            Migration::raw(RawStatement::portable("CREATE TABLE b (id INTEGER)")),
        )
        .build()
        .unwrap();
    let db = SqliteBackend::in_memory().unwrap();
    let migrator = Migrator::new(&catalog, "sqlite").unwrap();

    let report = migrator.execute(&db).await.unwrap();
    assert_eq!(report.state, EngineState::Halted);
    let failure = report.failure.unwrap();
    assert_eq!(failure.name, "create a then fail");
    assert!(failure.error.contains("missing"), "{}", failure.error);

    assert!(!db.relation_exists("a").await.unwrap());
    assert!(!db.relation_exists("b").await.unwrap());

    let entries = migrator
        .log()
        .entries(&db, migrator.dialect())
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].success);
    assert!(!entries[1].success);
    assert_eq!(entries[1].migration_id, "create a then fail");
    assert!(entries[1].error.is_some());
}

#[tokio::test]
async fn test_failed_rollback_aborts_without_failure_entry() {
    let catalog = Catalog::builder()
        .step(
            "broken insert",
            Migration::raw(RawStatement::portable("INSERT INTO missing VALUES (1)")),
        )
        .build()
        .unwrap();
    let db = CountingDb::failing_rollback();
    let migrator = Migrator::new(&catalog, "sqlite").unwrap();

    let err = migrator.execute(&db).await.unwrap_err();
    assert!(
        matches!(err, MigrateError::Db(DbError::TransactionError(_))),
        "{err:?}"
    );

    let entries = migrator
        .log()
        .entries(&db, migrator.dialect())
        .await
        .unwrap();
    assert!(entries.iter().all(|e| e.migration_id != "broken insert"));
}

#[tokio::test]
async fn test_without_transactions_partial_work_remains() {
    let catalog = Catalog::builder()
        .step(
            "create a then fail",
            Migration::raw(RawStatement::portable(
                "CREATE TABLE a (id INTEGER); INSERT INTO missing VALUES (1)",
            )),
        )
        .build()
        .unwrap();
    let options = MigratorOptions {
        transactions: TransactionMode::None,
        ..MigratorOptions::default()
    };
    let db = SqliteBackend::in_memory().unwrap();
    let migrator = Migrator::with_options(&catalog, "sqlite", options).unwrap();

    let err = migrator.run(&db).await.unwrap_err();
    assert!(matches!(err, MigrateError::Execution { .. }));
    assert!(db.relation_exists("a").await.unwrap());
}

#[tokio::test]
async fn test_log_write_failure_aborts_and_rolls_back() {
    let catalog = Catalog::builder()
        .step(
            "drop the log",
            Migration::raw(RawStatement::portable("DROP TABLE migration_log")),
        )
        .build()
        .unwrap();
    let db = SqliteBackend::in_memory().unwrap();
    let migrator = Migrator::new(&catalog, "sqlite").unwrap();

    let err = migrator.execute(&db).await.unwrap_err();
    match err {
        MigrateError::LogWrite { name, .. } => assert_eq!(name, "drop the log"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(db.relation_exists("migration_log").await.unwrap());
}

#[tokio::test]
async fn test_status_and_pending() {
    let catalog = Catalog::builder()
        .step(
            "create user table",
            Migration::create_table(Table::new("user", vec![Column::id("id")])),
        )
        .step(
            "bad insert",
            Migration::raw(RawStatement::portable("INSERT INTO nope VALUES (1)")),
        )
        .step(
            "create star table",
            Migration::create_table(Table::new("star", vec![Column::id("id")])),
        )
        .build()
        .unwrap();
    let db = SqliteBackend::in_memory().unwrap();
    let migrator = Migrator::new(&catalog, "sqlite").unwrap();

    let before = migrator.status(&db).await.unwrap();
    assert!(before.iter().all(|(_, s)| *s == StepStatus::Pending));
    assert_eq!(migrator.pending(&db).await.unwrap().len(), 4);

    migrator.execute(&db).await.unwrap();

    let after: Vec<(String, StepStatus)> = migrator
        .status(&db)
        .await
        .unwrap()
        .into_iter()
        .map(|(step, status)| (step.name.clone(), status))
        .collect();
    assert_eq!(
        after,
        vec![
            ("create migration_log table".to_string(), StepStatus::Applied),
            ("create user table".to_string(), StepStatus::Applied),
            ("bad insert".to_string(), StepStatus::Failed),
            ("create star table".to_string(), StepStatus::Pending),
        ]
    );
    let pending = migrator.pending(&db).await.unwrap();
    assert_eq!(names_of(&pending), vec!["bad insert", "create star table"]);
}

fn names_of<'a>(steps: &[&'a PlannedStep]) -> Vec<&'a str> {
    steps.iter().map(|s| s.name.as_str()).collect()
}
