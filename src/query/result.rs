//! Uniform result envelope for query execution.

use crate::db::{Row, RowSet};

/// Outcome of executing one candidate statement.
///
/// `success` is true exactly when `error` is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Whether the statement ran to completion.
    pub success: bool,

    /// Column names in cursor order.
    pub columns: Vec<String>,

    /// Rows, each positionally aligned with `columns`.
    pub rows: Vec<Row>,

    /// Number of rows returned.
    pub row_count: usize,

    /// Failure reason, if any.
    pub error: Option<String>,

    /// The SQL that was executed, or the original text if it was rejected
    /// before normalization.
    pub sql: String,
}

impl QueryResult {
    /// Creates a successful result from a row set.
    pub fn success(sql: impl Into<String>, rows: RowSet) -> Self {
        Self {
            success: true,
            row_count: rows.rows.len(),
            columns: rows.columns,
            rows: rows.rows,
            error: None,
            sql: sql.into(),
        }
    }

    /// Creates a failed result carrying `error`.
    pub fn failure(sql: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: 0,
            error: Some(error.into()),
            sql: sql.into(),
        }
    }

    /// Returns true if the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
