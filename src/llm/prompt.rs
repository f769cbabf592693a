//! Prompt construction for LLM requests.
//!
//! Combines the schema description, selected domain knowledge, the previous
//! failure (when retrying) and the user's question.

use crate::llm::types::GenerationRequest;

/// Standing instructions for SQL generation.
pub const SYSTEM_PROMPT: &str = r#"You are a SQL expert assistant. Your task is to convert natural language questions into valid SQLite SQL queries.

RULES:
1. Generate ONLY valid SQLite SQL syntax.
2. Return exactly one SQL statement with no explanations and no markdown code fences.
3. Use only tables and columns from the provided schema.
4. Do NOT generate INSERT, UPDATE, DELETE, DROP, ALTER, CREATE, TRUNCATE, or REPLACE statements.
5. Always include a LIMIT clause if the question does not imply one (default: 100).
6. Use proper JOIN syntax when crossing tables.
7. Handle NULL values with IS NULL / IS NOT NULL.
8. Use strftime() and date() for date operations.
9. Rules in DOMAIN KNOWLEDGE take precedence over generic interpretations of the question.

Return ONLY the SQL query, nothing else."#;

/// Builds the prompt body for one generation attempt.
///
/// Sections are joined with newlines: the schema, the knowledge block when
/// non-empty, the retry block when `error_context` is set, then the
/// question followed by a `SQL:` cue.
pub fn build_query_prompt(
    schema_text: &str,
    knowledge: Option<&str>,
    error_context: Option<&str>,
    question: &str,
) -> String {
    let mut parts = vec![schema_text.to_string()];

    if let Some(knowledge) = knowledge.filter(|k| !k.is_empty()) {
        parts.push(knowledge.to_string());
    }

    if let Some(context) = error_context.filter(|c| !c.is_empty()) {
        parts.push("PREVIOUS ATTEMPT FAILED:".to_string());
        parts.push(context.to_string());
        parts.push(String::new());
        parts.push("Please generate a corrected SQL query.".to_string());
        parts.push(String::new());
    }

    parts.push(format!("USER QUESTION: {question}"));
    parts.push(String::new());
    parts.push("SQL:".to_string());

    parts.join("\n")
}

/// Builds a complete request pairing the prompt with [`SYSTEM_PROMPT`].
pub fn build_request(
    schema_text: &str,
    knowledge: Option<&str>,
    error_context: Option<&str>,
    question: &str,
) -> GenerationRequest {
    GenerationRequest::new(
        SYSTEM_PROMPT,
        build_query_prompt(schema_text, knowledge, error_context, question),
    )
}

/// Describes a failed attempt for the next prompt.
pub fn build_error_context(sql: &str, error: &str) -> String {
    format!("SQL: {sql}\nError: {error}")
}
