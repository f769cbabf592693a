//! Query execution with safety validation.
//!
//! Provides isolated query execution that can be tested independently
//! of the generation loop.

use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use regex::Regex;
use tracing::{debug, warn};

use super::QueryResult;
use crate::db::DatabaseClient;
use crate::error::AskError;
use crate::safety::QueryValidator;

static LIMIT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bLIMIT\b").expect("limit pattern is valid"));

/// Execution policy for a [`QueryExecutor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorSettings {
    /// Reject mutating statements and open the database read-only.
    pub read_only: bool,

    /// Upper bound on a single statement's run time.
    pub timeout: Duration,

    /// Row cap, also used as the automatic `LIMIT`.
    pub max_results: usize,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            read_only: true,
            timeout: Duration::from_secs(30),
            max_results: 1000,
        }
    }
}

/// Query executor that validates, normalizes and runs candidate SQL.
pub struct QueryExecutor {
    db: Arc<dyn DatabaseClient>,
    settings: ExecutorSettings,
    validator: QueryValidator,
}

impl QueryExecutor {
    /// Creates a new query executor.
    pub fn new(db: Arc<dyn DatabaseClient>, settings: ExecutorSettings) -> Self {
        Self {
            db,
            validator: QueryValidator::new(settings.read_only),
            settings,
        }
    }

    /// Returns the executor's settings.
    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Validates and executes a candidate statement.
    ///
    /// Never fails: every problem is reported through
    /// [`QueryResult::error`]. Rejected statements never reach the database.
    pub async fn execute(&self, sql: &str) -> QueryResult {
        if let Err(violation) = self.validator.validate(sql) {
            debug!(%violation, "Statement rejected by validator");
            return QueryResult::failure(sql, violation.to_string());
        }

        let normalized = self.normalize(sql);
        if normalized.is_empty() {
            return QueryResult::failure(sql, "Empty SQL statement");
        }

        let start = Instant::now();
        let result = self
            .db
            .execute(&normalized, self.settings.max_results, self.settings.timeout)
            .await;
        let elapsed = start.elapsed();

        match result {
            Ok(rows) => {
                debug!(
                    rows = rows.rows.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Statement executed"
                );
                QueryResult::success(normalized, rows)
            }
            Err(AskError::Query(message)) => {
                debug!(error = %message, "Statement failed");
                QueryResult::failure(normalized, message)
            }
            Err(e) => {
                warn!(error = %e, "Unexpected failure executing statement");
                QueryResult::failure(normalized, format!("Unexpected error: {e}"))
            }
        }
    }

    /// Trims the statement, drops any trailing run of `;`, and appends the
    /// row cap as a `LIMIT` to SELECTs that have none.
    fn normalize(&self, sql: &str) -> String {
        let trimmed = sql
            .trim()
            .trim_end_matches(|c: char| c == ';' || c.is_whitespace());

        let is_select = trimmed
            .get(..6)
            .is_some_and(|head| head.eq_ignore_ascii_case("SELECT"));

        if is_select && !LIMIT_PATTERN.is_match(trimmed) {
            format!("{trimmed} LIMIT {}", self.settings.max_results)
        } else {
            trimmed.to_string()
        }
    }
}
