//! Knowledge selection over a real documents directory.

use std::sync::Arc;

use askdb::knowledge::{DirectoryKnowledge, KnowledgeSelector, KnowledgeSource, JOINS_DOCUMENT};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn knowledge_dir(docs: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, body) in docs {
        std::fs::write(dir.path().join(name), body).unwrap();
    }
    dir
}

fn selector(dir: &TempDir) -> KnowledgeSelector {
    KnowledgeSelector::new(Arc::new(DirectoryKnowledge::new(dir.path())))
}

fn tables() -> Vec<String> {
    vec!["orders".to_string(), "users".to_string()]
}

#[test]
fn test_stem_match_and_joins_always_included() {
    let dir = knowledge_dir(&[
        ("revenue.md", "Revenue excludes refunded orders."),
        ("shipping.md", "Carriers and zones."),
        ("_joins.md", "Join through the bridge table."),
    ]);

    let selected = selector(&dir).select("What was revenue last month?", &tables());

    assert_eq!(selected, vec!["revenue.md", JOINS_DOCUMENT]);
}

#[test]
fn test_joins_matched_on_content_keeps_enumeration_order() {
    let dir = knowledge_dir(&[
        ("revenue.md", "Revenue excludes refunded orders."),
        ("_joins.md", "orders.user_id joins users.id"),
    ]);

    let selected = selector(&dir).select("What was revenue last month?", &tables());

    assert_eq!(selected, vec![JOINS_DOCUMENT, "revenue.md"]);
}

#[test]
fn test_joins_included_without_other_matches() {
    let dir = knowledge_dir(&[
        ("shipping.md", "Carriers and zones."),
        ("_joins.md", "orders.user_id joins users.id"),
    ]);

    let selected = selector(&dir).select("weather forecast", &[]);

    assert_eq!(selected, vec![JOINS_DOCUMENT]);
}

#[test]
fn test_content_match_needs_two_keywords() {
    let dir = knowledge_dir(&[
        ("churn.md", "A customer is churned when status is 'churned'."),
        ("glossary.md", "A customer is anyone with an account."),
        ("support.md", "Customer support hours."),
    ]);

    let selected = selector(&dir).select("churn rate per customer account", &[]);

    // churn.md matches by stem; glossary.md mentions "customer" and "account";
    // support.md mentions only "customer".
    assert_eq!(selected, vec!["churn.md", "glossary.md"]);
}

#[test]
fn test_table_names_act_as_keywords() {
    let dir = knowledge_dir(&[("users.md", "Soft-deleted users have status 'deleted'.")]);

    let selected = selector(&dir).select("weather forecast", &tables());

    assert_eq!(selected, vec!["users.md"]);
}

#[test]
fn test_context_renders_selected_documents() {
    let dir = knowledge_dir(&[
        ("revenue.md", "  Revenue excludes refunded orders.\n"),
        ("_joins.md", "orders.user_id joins users.id"),
    ]);

    let context = selector(&dir).context("total revenue", &[]);

    assert_eq!(
        context,
        "DOMAIN KNOWLEDGE:\n\n\
         ### revenue.md\n\
         Revenue excludes refunded orders.\n\n\
         ### _joins.md\n\
         orders.user_id joins users.id\n"
    );
}

#[test]
fn test_missing_directory_yields_nothing() {
    let dir = TempDir::new().unwrap();
    let source = DirectoryKnowledge::new(dir.path().join("absent"));
    assert!(!source.exists());

    let selector = KnowledgeSelector::new(Arc::new(source));
    assert!(selector.select("revenue", &tables()).is_empty());
    assert_eq!(selector.context("revenue", &tables()), "");
}

#[test]
fn test_documents_are_cached_after_first_read() {
    let dir = knowledge_dir(&[("revenue.md", "first version")]);
    let source = DirectoryKnowledge::new(dir.path());

    assert_eq!(source.load("revenue.md").as_deref(), Some("first version"));
    std::fs::write(dir.path().join("revenue.md"), "second version").unwrap();
    assert_eq!(source.load("revenue.md").as_deref(), Some("first version"));
}

#[test]
fn test_non_markdown_files_ignored() {
    let dir = knowledge_dir(&[("revenue.md", "x"), ("revenue.txt", "y"), ("notes", "z")]);
    let source = DirectoryKnowledge::new(dir.path());

    assert_eq!(source.list(), vec!["revenue.md"]);
}
