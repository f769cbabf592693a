//! Validation and execution against a real SQLite file.

use std::time::Duration;

use askdb::db::Value;
use askdb::query::ExecutorSettings;
use pretty_assertions::assert_eq;

use super::common::TestDb;

#[tokio::test]
async fn test_blocked_writes_leave_database_unmodified() {
    let db = TestDb::shop().await;
    let executor = db.executor();

    for sql in [
        "DELETE FROM orders",
        "DROP TABLE orders",
        "UPDATE orders SET total = 0",
        "INSERT INTO orders VALUES (99, 2, 1.0, NULL)",
    ] {
        let result = executor.execute(sql).await;
        assert!(!result.success, "{sql} should be rejected");
        assert!(
            result.error.as_deref().unwrap().to_lowercase().contains("blocked"),
            "unexpected error for {sql}: {:?}",
            result.error
        );
    }

    assert_eq!(db.count("orders").await, 3);
}

#[tokio::test]
async fn test_multiple_statements_rejected() {
    let db = TestDb::shop().await;
    let result = db.executor().execute("SELECT 1; SELECT 2").await;

    assert!(!result.success);
    assert!(result.error.unwrap().to_lowercase().contains("multiple"));
}

#[tokio::test]
async fn test_automatic_limit_appended() {
    let db = TestDb::shop().await;
    let executor = db.executor_with(ExecutorSettings {
        max_results: 2,
        ..ExecutorSettings::default()
    });

    let result = executor.execute("SELECT id FROM users ORDER BY id;").await;

    assert!(result.success);
    assert_eq!(result.sql, "SELECT id FROM users ORDER BY id LIMIT 2");
    assert_eq!(result.row_count, 2);
    assert_eq!(result.rows, vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
}

#[tokio::test]
async fn test_repeated_trailing_semicolons_still_run() {
    let db = TestDb::shop().await;
    let result = db.executor().execute("SELECT id FROM users ORDER BY id;;").await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.sql, "SELECT id FROM users ORDER BY id LIMIT 1000");
    assert_eq!(result.row_count, 3);
}

#[tokio::test]
async fn test_explicit_limit_preserved() {
    let db = TestDb::shop().await;
    let result = db
        .executor()
        .execute("select name from users order by id limit 1")
        .await;

    assert!(result.success);
    assert_eq!(result.sql, "select name from users order by id limit 1");
    assert_eq!(result.rows, vec![vec![Value::from("Alice")]]);
}

#[tokio::test]
async fn test_reads_are_idempotent() {
    let db = TestDb::shop().await;
    let executor = db.executor();
    let sql = "SELECT u.name, SUM(o.total) AS spent FROM users u \
               JOIN orders o ON o.user_id = u.id GROUP BY u.name ORDER BY u.name";

    let first = executor.execute(sql).await;
    let second = executor.execute(sql).await;

    assert!(first.success);
    assert_eq!(first.columns, vec!["name", "spent"]);
    assert_eq!(
        first.rows,
        vec![
            vec![Value::from("Alice"), Value::Float(24.5)],
            vec![Value::from("Carol"), Value::Float(42.0)],
        ]
    );
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_engine_error_surfaced_verbatim() {
    let db = TestDb::shop().await;
    let result = db.executor().execute("SELECT nope FROM users").await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("no such column: nope"));
}

#[tokio::test]
async fn test_nulls_and_column_order() {
    let db = TestDb::shop().await;
    let result = db
        .executor()
        .execute("SELECT email, id FROM users WHERE id = 2")
        .await;

    assert!(result.success);
    assert_eq!(result.columns, vec!["email", "id"]);
    assert_eq!(result.rows, vec![vec![Value::Null, Value::Int(2)]]);
}

#[tokio::test]
async fn test_cte_skips_automatic_limit_but_rows_stay_capped() {
    let db = TestDb::shop().await;
    let executor = db.executor_with(ExecutorSettings {
        max_results: 2,
        ..ExecutorSettings::default()
    });

    let sql = "WITH active AS (SELECT id FROM users) SELECT id FROM active";
    let result = executor.execute(sql).await;

    assert!(result.success);
    // Only statements starting with SELECT get a LIMIT appended.
    assert_eq!(result.sql, sql);
    assert_eq!(result.row_count, 2);
}

#[tokio::test]
async fn test_writes_allowed_when_read_only_disabled() {
    let db = TestDb::shop().await;
    let executor = db.executor_with(ExecutorSettings {
        read_only: false,
        timeout: Duration::from_secs(5),
        max_results: 1000,
    });

    let result = executor.execute("DELETE FROM orders WHERE id = 10").await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.row_count, 0);
    assert_eq!(db.count("orders").await, 2);
}
