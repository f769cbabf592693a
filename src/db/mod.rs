//! Database abstraction layer for askdb.
//!
//! Provides a trait-based interface for the operations the core needs from a
//! database engine: schema introspection and bounded single-statement
//! execution.

mod mock;
mod schema;
mod sqlite;
mod types;

pub use mock::MockDatabaseClient;
pub use schema::{Column, ForeignKey, Schema, Table};
pub use sqlite::SqliteClient;
pub use types::{Row, RowSet, Value};

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Trait defining the interface for database clients.
///
/// Implementations acquire a connection per call and release it before
/// returning, so there is no shared connection state between calls.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Introspects the database schema: user tables sorted by name, their
    /// columns in storage order, and outbound foreign keys.
    async fn introspect_schema(&self) -> Result<Schema>;

    /// Executes exactly one statement, returning at most `max_rows` rows.
    ///
    /// The statement is abandoned once `timeout` elapses. Engine failures are
    /// reported as [`AskError::Query`](crate::error::AskError::Query) carrying
    /// the engine's message.
    async fn execute(&self, sql: &str, max_rows: usize, timeout: Duration) -> Result<RowSet>;
}
