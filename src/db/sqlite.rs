//! SQLite database client implementation.
//!
//! Provides the `SqliteClient` struct that implements the `DatabaseClient`
//! trait using sqlx. Every call opens its own connection and closes it
//! before returning.

use crate::db::{Column, DatabaseClient, ForeignKey, Row, RowSet, Schema, Table, Value};
use crate::error::{AskError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column as _, Connection, Executor, Row as _, Statement, TypeInfo, ValueRef};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Busy timeout used for schema introspection.
const INTROSPECTION_BUSY_TIMEOUT_SECS: u64 = 5;

/// SQLite database client backed by a database file.
#[derive(Debug, Clone)]
pub struct SqliteClient {
    path: PathBuf,
    read_only: bool,
}

impl SqliteClient {
    /// Creates a read-only client for the database file at `path`.
    ///
    /// Fails with [`AskError::NotFound`] if the file does not exist; the
    /// file is never created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AskError::not_found(format!(
                "Database not found: {}",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            read_only: true,
        })
    }

    /// Sets whether connections are opened read-only at the engine level.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Returns the database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn connect(&self, busy_timeout: Duration) -> Result<SqliteConnection> {
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .read_only(self.read_only)
            .create_if_missing(false)
            .busy_timeout(busy_timeout);

        SqliteConnection::connect_with(&options)
            .await
            .map_err(|e| {
                AskError::connection(format!("Cannot open {}: {e}", self.path.display()))
            })
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        let mut conn = self
            .connect(Duration::from_secs(INTROSPECTION_BUSY_TIMEOUT_SECS))
            .await?;
        let tables = fetch_tables(&mut conn).await;
        close(conn).await;

        let tables = tables?;
        debug!(table_count = tables.len(), "Introspected SQLite schema");
        Ok(Schema::new(tables))
    }

    async fn execute(&self, sql: &str, max_rows: usize, timeout: Duration) -> Result<RowSet> {
        let mut conn = self.connect(timeout).await?;

        match tokio::time::timeout(timeout, run_statement(&mut conn, sql, max_rows)).await {
            Ok(result) => {
                close(conn).await;
                result
            }
            Err(_) => {
                warn!(?timeout, "Statement timed out, dropping connection");
                // Dropping the connection stops its worker without waiting on
                // the statement still in flight.
                drop(conn);
                Err(AskError::query(format!(
                    "Query timed out after {} seconds",
                    timeout.as_secs()
                )))
            }
        }
    }
}

/// Prepares exactly one statement and fetches at most `max_rows` rows.
async fn run_statement(conn: &mut SqliteConnection, sql: &str, max_rows: usize) -> Result<RowSet> {
    let statement = (&mut *conn).prepare(sql).await.map_err(map_query_error)?;
    let columns = statement
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    let mut stream = statement.query().fetch(&mut *conn);
    while rows.len() < max_rows {
        match stream.try_next().await.map_err(map_query_error)? {
            Some(row) => rows.push(convert_row(&row)),
            None => break,
        }
    }

    Ok(RowSet::new(columns, rows))
}

/// Lists user tables sorted by name with their columns and foreign keys.
async fn fetch_tables(conn: &mut SqliteConnection) -> Result<Vec<Table>> {
    let table_names: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT name
        FROM sqlite_master
        WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
        ORDER BY name
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| AskError::query(format!("Failed to fetch tables: {e}")))?;

    let mut tables = Vec::with_capacity(table_names.len());

    for table_name in table_names {
        let columns = fetch_columns(conn, &table_name).await?;
        let foreign_keys = fetch_foreign_keys(conn, &table_name).await?;
        tables.push(Table::new(table_name, columns, foreign_keys));
    }

    resolve_implicit_targets(&mut tables);
    Ok(tables)
}

/// Fetches columns for a specific table in storage order.
async fn fetch_columns(conn: &mut SqliteConnection, table_name: &str) -> Result<Vec<Column>> {
    let rows: Vec<(String, String, i64, i64)> = sqlx::query_as(
        r#"
        SELECT name, type, "notnull", pk
        FROM pragma_table_info(?1)
        ORDER BY cid
        "#,
    )
    .bind(table_name)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| AskError::query(format!("Failed to fetch columns for {table_name}: {e}")))?;

    Ok(rows
        .into_iter()
        .map(|(name, data_type, not_null, pk)| Column {
            name,
            data_type: if data_type.is_empty() {
                "TEXT".to_string()
            } else {
                data_type
            },
            is_primary_key: pk > 0,
            is_nullable: not_null == 0,
        })
        .collect())
}

/// Fetches outbound foreign keys for a specific table.
async fn fetch_foreign_keys(
    conn: &mut SqliteConnection,
    table_name: &str,
) -> Result<Vec<ForeignKey>> {
    let rows: Vec<(String, String, Option<String>)> = sqlx::query_as(
        r#"
        SELECT "table", "from", "to"
        FROM pragma_foreign_key_list(?1)
        ORDER BY id, seq
        "#,
    )
    .bind(table_name)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| {
        AskError::query(format!("Failed to fetch foreign keys for {table_name}: {e}"))
    })?;

    Ok(rows
        .into_iter()
        .map(|(to_table, from_column, to_column)| {
            ForeignKey::new(table_name, from_column, to_table, to_column.unwrap_or_default())
        })
        .collect())
}

/// Fills in target columns for `REFERENCES parent` clauses that name no
/// column: SQLite resolves those to the parent's primary key.
fn resolve_implicit_targets(tables: &mut [Table]) {
    let primary_keys: HashMap<String, String> = tables
        .iter()
        .map(|t| {
            let pk = t
                .primary_keys
                .first()
                .cloned()
                .unwrap_or_else(|| "rowid".to_string());
            (t.name.clone(), pk)
        })
        .collect();

    for fk in tables.iter_mut().flat_map(|t| t.foreign_keys.iter_mut()) {
        if fk.to_column.is_empty() {
            fk.to_column = primary_keys
                .get(&fk.to_table)
                .cloned()
                .unwrap_or_else(|| "rowid".to_string());
        }
    }
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.len()).map(|i| convert_value(row, i)).collect()
}

/// Converts a single value by its runtime storage class.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let type_name = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    let decoded = match type_name.as_str() {
        "INTEGER" | "BIGINT" | "INT8" | "BOOLEAN" => row.try_get::<i64, _>(index).ok().map(Value::Int),
        "REAL" => row.try_get::<f64, _>(index).ok().map(Value::Float),
        "BLOB" => row.try_get::<Vec<u8>, _>(index).ok().map(Value::Bytes),
        _ => row.try_get::<String, _>(index).ok().map(Value::String),
    };

    decoded
        .or_else(|| row.try_get::<String, _>(index).ok().map(Value::String))
        .unwrap_or(Value::Null)
}

/// Maps a sqlx error to a query error carrying the engine's own message.
fn map_query_error(error: sqlx::Error) -> AskError {
    match error.as_database_error() {
        Some(db_error) => AskError::query(db_error.message()),
        None => AskError::query(error.to_string()),
    }
}

async fn close(conn: SqliteConnection) {
    if let Err(e) = conn.close().await {
        warn!("Failed to close SQLite connection: {e}");
    }
}
