//! Query execution for askdb.
//!
//! This module isolates validation, normalization and bounded execution of
//! candidate SQL from the generation loop.

pub mod executor;
mod result;

pub use executor::{ExecutorSettings, QueryExecutor};
pub use result::QueryResult;
