use super::*;

#[tokio::test]
async fn test_in_memory() {
    let db = SqliteBackend::in_memory().unwrap();
    assert_eq!(db.db_type(), "sqlite");
}

#[tokio::test]
async fn test_relation_exists() {
    let db = SqliteBackend::in_memory().unwrap();
    assert!(!db.relation_exists("user").await.unwrap());
    db.execute("CREATE TABLE user (id INTEGER PRIMARY KEY)")
        .await
        .unwrap();
    assert!(db.relation_exists("user").await.unwrap());
}

#[tokio::test]
async fn test_relation_exists_sees_views() {
    let db = SqliteBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE t (id INTEGER); CREATE VIEW v AS SELECT id FROM t;")
        .await
        .unwrap();
    assert!(db.relation_exists("v").await.unwrap());
}

#[tokio::test]
async fn test_params_and_query_rows() {
    let db = SqliteBackend::in_memory().unwrap();
    db.execute("CREATE TABLE log (id TEXT, ok INTEGER, err TEXT, at DATETIME)")
        .await
        .unwrap();
    db.execute_with_params(
        "INSERT INTO log VALUES (?, ?, ?, ?)",
        &[
            SqlValue::from("create user table"),
            SqlValue::from(false),
            SqlValue::from(Some("no such table")),
            SqlValue::from("2026-01-02 03:04:05"),
        ],
    )
    .await
    .unwrap();

    let rows = db
        .query_rows("SELECT id, ok, err, CAST(at AS TEXT) FROM log")
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0].as_str(), Some("create user table"));
    assert_eq!(rows[0][1].as_bool(), Some(false));
    assert_eq!(rows[0][2].as_str(), Some("no such table"));
    assert_eq!(rows[0][3].as_str(), Some("2026-01-02 03:04:05"));
}

#[tokio::test]
async fn test_rollback_discards_ddl() {
    let db = SqliteBackend::in_memory().unwrap();
    db.begin().await.unwrap();
    db.execute("CREATE TABLE scratch (id INTEGER)").await.unwrap();
    db.rollback().await.unwrap();
    assert!(!db.relation_exists("scratch").await.unwrap());
}

#[tokio::test]
async fn test_nested_begin_fails() {
    let db = SqliteBackend::in_memory().unwrap();
    db.begin().await.unwrap();
    let err = db.begin().await.unwrap_err();
    assert!(matches!(err, DbError::TransactionError(_)));
    db.rollback().await.unwrap();
}

#[tokio::test]
async fn test_invalid_sql_is_execution_error() {
    let db = SqliteBackend::in_memory().unwrap();
    let err = db.execute("ALTER TABLE missing ADD COLUMN x INTEGER").await.unwrap_err();
    assert!(matches!(err, DbError::ExecutionError(_)));
    assert!(err.to_string().contains("missing"), "{err}");
}

#[tokio::test]
async fn test_file_backed_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.sqlite");
    {
        let db = SqliteBackend::new(path.to_str().unwrap()).unwrap();
        db.execute("CREATE TABLE persisted (id INTEGER)").await.unwrap();
    }
    let db = SqliteBackend::from_path(&path).unwrap();
    assert!(db.relation_exists("persisted").await.unwrap());
}

#[tokio::test]
async fn test_open_in_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no").join("such").join("dir.sqlite");
    let err = SqliteBackend::from_path(&path).err().unwrap();
    assert!(matches!(err, DbError::ConnectionError(_)));
}
