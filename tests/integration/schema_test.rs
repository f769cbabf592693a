//! Schema introspection integration tests.

use askdb::db::DatabaseClient;
use askdb::llm::build_query_prompt;

use super::common::TestDb;

#[tokio::test]
async fn test_introspect_tables_sorted() {
    let db = TestDb::shop().await;
    let schema = db.client().introspect_schema().await.unwrap();

    assert_eq!(schema.table_names(), vec!["orders", "products", "users"]);

    let users = schema.table("users").unwrap();
    let columns: Vec<_> = users.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, vec!["id", "name", "email", "status"]);
    assert_eq!(users.primary_keys, vec!["id"]);
}

#[tokio::test]
async fn test_introspect_foreign_keys() {
    let db = TestDb::shop().await;
    let schema = db.client().introspect_schema().await.unwrap();

    assert_eq!(schema.foreign_keys.len(), 1);
    let fk = &schema.foreign_keys[0];
    assert_eq!(
        (
            fk.from_table.as_str(),
            fk.from_column.as_str(),
            fk.to_table.as_str(),
            fk.to_column.as_str()
        ),
        ("orders", "user_id", "users", "id")
    );
}

#[tokio::test]
async fn test_schema_prompt_round_trip() {
    let db = TestDb::shop().await;
    let schema = db.client().introspect_schema().await.unwrap();
    let text = schema.to_prompt_string();

    assert!(text.starts_with("DATABASE SCHEMA:\n"));
    for table in &schema.tables {
        assert!(text.contains(&format!("Table: {}", table.name)), "{} missing", table.name);
        for column in &table.columns {
            let line = format!("  - {} (", column.name);
            assert!(text.contains(&line), "{}.{} missing", table.name, column.name);
        }
    }
    assert!(text.contains("  - status ("));
    assert!(text.contains("  - created_at ("));
    assert!(text.contains("  - id (INTEGER, PRIMARY KEY)"));
    assert!(text.contains("  - name (TEXT, NOT NULL)"));
    assert!(text.contains("  - email (TEXT)\n"));
    assert!(text.contains("RELATIONSHIPS:\n  - orders.user_id -> users.id"));

    // Tables appear in name order.
    let orders = text.find("Table: orders").unwrap();
    let users = text.find("Table: users").unwrap();
    assert!(orders < users);

    let prompt = build_query_prompt(&text, None, None, "how many users?");
    assert!(prompt.starts_with(&text));
    assert!(prompt.ends_with("USER QUESTION: how many users?\n\nSQL:"));
}

#[tokio::test]
async fn test_introspection_is_deterministic() {
    let db = TestDb::shop().await;
    let client = db.client();

    let first = client.introspect_schema().await.unwrap();
    let second = client.introspect_schema().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.to_prompt_string(), second.to_prompt_string());
}

#[tokio::test]
async fn test_empty_database() {
    let db = TestDb::with_statements(&[]).await;
    let schema = db.client().introspect_schema().await.unwrap();

    assert!(schema.tables.is_empty());
    assert_eq!(schema.to_prompt_string(), "DATABASE SCHEMA:\n");
}
