//! Integration tests for askdb.

pub mod common;
pub mod executor_test;
pub mod knowledge_test;
pub mod retry_test;
pub mod schema_test;
