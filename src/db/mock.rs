//! Mock database client for testing.
//!
//! Returns a canned schema and canned statement outcomes, and records every
//! statement it receives so tests can assert what reached the database.

use super::{DatabaseClient, RowSet, Schema};
use crate::error::{AskError, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// A mock database client that returns predefined results.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    schema: Schema,
    rows: RowSet,
    failure: Option<String>,
    executed: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new mock database client with the given schema.
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    /// Sets the row set returned by every successful `execute`.
    pub fn with_rows(mut self, rows: RowSet) -> Self {
        self.rows = rows;
        self
    }

    /// Makes every `execute` fail with a query error carrying `message`.
    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Returns every statement passed to `execute`, in call order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    async fn execute(&self, sql: &str, max_rows: usize, _timeout: Duration) -> Result<RowSet> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }

        if let Some(message) = &self.failure {
            return Err(AskError::query(message.clone()));
        }

        let mut rows = self.rows.clone();
        rows.rows.truncate(max_rows);
        Ok(rows)
    }
}
