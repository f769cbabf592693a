//! Shared fixtures: a small shop database on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use askdb::db::SqliteClient;
use askdb::query::{ExecutorSettings, QueryExecutor};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use tempfile::TempDir;

const SHOP: &[&str] = &[
    "CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT,
        status TEXT NOT NULL DEFAULT 'active'
    )",
    "CREATE TABLE orders (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id),
        total REAL NOT NULL,
        created_at TEXT
    )",
    "CREATE TABLE products (id INTEGER PRIMARY KEY, title TEXT, price REAL)",
    "INSERT INTO users VALUES (1, 'Alice', 'alice@example.com', 'active')",
    "INSERT INTO users VALUES (2, 'Bob', NULL, 'churned')",
    "INSERT INTO users VALUES (3, 'Carol', 'carol@example.com', 'active')",
    "INSERT INTO orders VALUES (10, 1, 19.5, '2024-01-03')",
    "INSERT INTO orders VALUES (11, 1, 5.0, '2024-02-11')",
    "INSERT INTO orders VALUES (12, 3, 42.0, '2024-02-12')",
    "INSERT INTO products VALUES (100, 'Widget', 2.5)",
];

/// A fixture database that lives as long as the value.
pub struct TestDb {
    _dir: TempDir,
    pub path: PathBuf,
}

impl TestDb {
    /// Creates the shop database.
    pub async fn shop() -> Self {
        Self::with_statements(SHOP).await
    }

    /// Creates a database by running `statements` in order.
    pub async fn with_statements(statements: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        run_statements(&path, statements).await;
        Self { _dir: dir, path }
    }

    pub fn client(&self) -> SqliteClient {
        SqliteClient::open(&self.path).unwrap()
    }

    pub fn executor(&self) -> QueryExecutor {
        self.executor_with(ExecutorSettings::default())
    }

    pub fn executor_with(&self, settings: ExecutorSettings) -> QueryExecutor {
        let client = self.client().read_only(settings.read_only);
        QueryExecutor::new(Arc::new(client), settings)
    }

    /// Counts rows in `table` over a fresh connection, bypassing the executor.
    pub async fn count(&self, table: &str) -> i64 {
        let mut conn = connect(&self.path, false).await;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&mut conn)
            .await
            .unwrap();
        conn.close().await.unwrap();
        count
    }
}

async fn connect(path: &Path, create: bool) -> SqliteConnection {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create);
    SqliteConnection::connect_with(&options).await.unwrap()
}

async fn run_statements(path: &Path, statements: &[&str]) {
    let mut conn = connect(path, true).await;
    for statement in statements {
        sqlx::query(statement).execute(&mut conn).await.unwrap();
    }
    conn.close().await.unwrap();
}
