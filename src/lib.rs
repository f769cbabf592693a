//! askdb - natural-language questions answered from a SQLite database.
//!
//! This library exposes the core modules for use by the binary and by
//! integration tests.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod logging;
pub mod output;
pub mod query;
pub mod retry;
pub mod safety;
