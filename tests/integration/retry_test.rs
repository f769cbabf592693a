//! End-to-end question resolution with a scripted backend and a real database.

use std::sync::Arc;

use askdb::db::{DatabaseClient, Value};
use askdb::knowledge::{DirectoryKnowledge, KnowledgeSelector};
use askdb::llm::MockLlmClient;
use askdb::retry::{Outcome, RetryController, RetrySettings};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use super::common::TestDb;

async fn controller(
    db: &TestDb,
    llm: Arc<MockLlmClient>,
    knowledge: KnowledgeSelector,
) -> RetryController {
    let schema = db.client().introspect_schema().await.unwrap();
    RetryController::new(
        llm,
        db.executor(),
        knowledge,
        &schema,
        RetrySettings::default(),
    )
}

#[tokio::test]
async fn test_blocked_write_retried_as_select() {
    let db = TestDb::shop().await;
    let llm = Arc::new(MockLlmClient::scripted([
        "DELETE FROM users WHERE id = 1",
        "```sql\nSELECT COUNT(*) AS n FROM users\n```",
    ]));
    let controller = controller(&db, llm.clone(), KnowledgeSelector::empty()).await;

    let outcome = controller.resolve("how many users are there?").await;

    let (sql, result, attempts) = match outcome {
        Outcome::Success {
            sql,
            result,
            attempts,
        } => (sql, result, attempts),
        other => panic!("expected success, got {other:?}"),
    };
    assert_eq!(sql, "SELECT COUNT(*) AS n FROM users");
    assert_eq!(result.sql, "SELECT COUNT(*) AS n FROM users LIMIT 1000");
    assert_eq!(result.rows, vec![vec![Value::Int(3)]]);

    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].sql.as_deref(), Some("DELETE FROM users WHERE id = 1"));
    assert!(attempts[0].error.as_deref().unwrap().contains("blocked"));
    assert_eq!(attempts[1].error, None);

    let requests = llm.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(!requests[0].prompt.contains("PREVIOUS ATTEMPT FAILED"));
    assert!(requests[1]
        .prompt
        .contains("PREVIOUS ATTEMPT FAILED:\nSQL: DELETE FROM users WHERE id = 1\nError: "));

    assert_eq!(db.count("users").await, 3);
}

#[tokio::test]
async fn test_engine_error_fed_back_to_next_attempt() {
    let db = TestDb::shop().await;
    let llm = Arc::new(MockLlmClient::scripted([
        "SELECT nme FROM users",
        "SELECT name FROM users ORDER BY id",
    ]));
    let controller = controller(&db, llm.clone(), KnowledgeSelector::empty()).await;

    let outcome = controller.resolve("list user names").await;

    assert!(outcome.is_success());
    assert_eq!(outcome.attempts().len(), 2);
    let requests = llm.requests().await;
    assert!(requests[1].prompt.contains("no such column: nme"));
}

#[tokio::test]
async fn test_exhausted_after_budget() {
    let db = TestDb::shop().await;
    let llm = Arc::new(MockLlmClient::with_fallback("SELECT missing FROM users"));
    let controller = controller(&db, llm.clone(), KnowledgeSelector::empty()).await;

    let outcome = controller.resolve("show the missing column").await;

    let (last_error, last_sql, attempts) = match outcome {
        Outcome::Exhausted {
            last_error,
            last_sql,
            attempts,
        } => (last_error, last_sql, attempts),
        other => panic!("expected exhaustion, got {other:?}"),
    };
    assert_eq!(llm.call_count(), 3);
    assert_eq!(attempts.len(), 3);
    assert!(last_error.contains("no such column: missing"));
    assert_eq!(last_sql.as_deref(), Some("SELECT missing FROM users"));
}

#[tokio::test]
async fn test_fenced_reply_executes_first_time() {
    let db = TestDb::shop().await;
    let llm = Arc::new(MockLlmClient::scripted(["```sql\nSELECT 1\n```"]));
    let controller = controller(&db, llm.clone(), KnowledgeSelector::empty()).await;

    let outcome = controller.resolve("anything").await;

    let Outcome::Success { sql, result, .. } = outcome else {
        panic!("expected success");
    };
    assert_eq!(sql, "SELECT 1");
    assert_eq!(result.rows, vec![vec![Value::Int(1)]]);
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_prompt_carries_schema_and_knowledge() {
    let db = TestDb::shop().await;
    let docs = TempDir::new().unwrap();
    std::fs::write(
        docs.path().join("churn.md"),
        "Churned users have status = 'churned'.",
    )
    .unwrap();
    std::fs::write(docs.path().join("_joins.md"), "Join on the key column.").unwrap();

    let llm = Arc::new(MockLlmClient::with_fallback(
        "SELECT name FROM users WHERE status = 'churned'",
    ));
    let knowledge = KnowledgeSelector::new(Arc::new(DirectoryKnowledge::new(docs.path())));
    let controller = controller(&db, llm.clone(), knowledge).await;

    let outcome = controller.resolve("which accounts churn?").await;

    let Outcome::Success { result, .. } = outcome else {
        panic!("expected success");
    };
    assert_eq!(result.rows, vec![vec![Value::from("Bob")]]);

    let requests = llm.requests().await;
    let prompt = &requests[0].prompt;
    assert!(prompt.starts_with("DATABASE SCHEMA:\n"));
    assert!(prompt.contains("Table: users"));
    assert!(prompt.contains("DOMAIN KNOWLEDGE:"));
    assert!(prompt.contains("### churn.md\nChurned users have status = 'churned'."));
    assert!(prompt.contains("### _joins.md"));
    assert!(prompt.ends_with("USER QUESTION: which accounts churn?\n\nSQL:"));
}

#[tokio::test]
async fn test_generate_only_does_not_execute() {
    let db = TestDb::shop().await;
    let llm = Arc::new(MockLlmClient::scripted(["```sql\nDELETE FROM users\n```"]));
    let controller = controller(&db, llm.clone(), KnowledgeSelector::empty()).await;

    let sql = controller.generate_only("remove everyone").await.unwrap();

    assert_eq!(sql, "DELETE FROM users");
    assert_eq!(db.count("users").await, 3);
}

#[tokio::test]
async fn test_rejected_delete_then_limited_select() {
    let db = TestDb::shop().await;
    let llm = Arc::new(MockLlmClient::scripted([
        "DELETE FROM users",
        "SELECT * FROM users LIMIT 5",
    ]));
    let controller = controller(&db, llm.clone(), KnowledgeSelector::empty()).await;

    let outcome = controller.resolve("show all users").await;

    let Outcome::Success { result, attempts, .. } = outcome else {
        panic!("expected success");
    };
    assert_eq!(attempts.len(), 2);
    assert_eq!(result.sql, "SELECT * FROM users LIMIT 5");
    assert!(result.row_count <= 5);
    assert_eq!(result.columns, vec!["id", "name", "email", "status"]);
    assert_eq!(db.count("users").await, 3);
}

#[tokio::test]
async fn test_unsafe_statement_every_time_exhausts_with_rejection() {
    let db = TestDb::shop().await;
    let llm = Arc::new(MockLlmClient::with_fallback("DROP TABLE users"));
    let controller = controller(&db, llm.clone(), KnowledgeSelector::empty()).await;

    let outcome = controller.resolve("get rid of the users table").await;

    let (last_error, last_sql) = match outcome {
        Outcome::Exhausted {
            last_error,
            last_sql,
            ..
        } => (last_error, last_sql),
        other => panic!("expected exhaustion, got {other:?}"),
    };
    assert_eq!(llm.call_count(), 3);
    assert!(last_error.contains("blocked"), "{last_error}");
    assert_eq!(last_sql.as_deref(), Some("DROP TABLE users"));
    assert_eq!(db.count("users").await, 3);
}

#[tokio::test]
async fn test_generate_only_recovers_from_backend_failure() {
    let db = TestDb::shop().await;
    let llm = Arc::new(
        MockLlmClient::scripted(Vec::<String>::new())
            .then_fail("transient 503")
            .with_response("users", "SELECT name FROM users"),
    );
    let controller = controller(&db, llm.clone(), KnowledgeSelector::empty()).await;

    let sql = controller.generate_only("list users").await.unwrap();

    assert_eq!(sql, "SELECT name FROM users");
    assert_eq!(llm.call_count(), 2);
    let requests = llm.requests().await;
    assert!(requests[1].prompt.contains("Error: LLM error: transient 503"));
}
