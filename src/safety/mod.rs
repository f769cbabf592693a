//! Query safety validation module.
//!
//! Statically inspects generated SQL before it reaches the database. The
//! checks are lexical: a mutating keyword anywhere in the text (including
//! inside a string literal) is enough to reject, and statement splitting
//! counts every `;`. Both err towards rejection.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Keywords that mark a statement as mutating, in reporting order.
pub const WRITE_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "CREATE", "TRUNCATE", "REPLACE",
];

static WRITE_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    WRITE_KEYWORDS
        .iter()
        .map(|kw| {
            let pattern = Regex::new(&format!(r"\b{kw}\b")).expect("keyword pattern is valid");
            (*kw, pattern)
        })
        .collect()
});

/// Reason a candidate statement was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SafetyViolation {
    /// A mutating keyword appeared while in read-only mode.
    #[error("Write operation blocked in read-only mode: {0}")]
    WriteBlocked(String),

    /// More than one non-empty statement was supplied.
    #[error("Multiple SQL statements not allowed")]
    MultipleStatements,
}

/// Static validator for candidate SQL statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryValidator {
    read_only: bool,
}

impl Default for QueryValidator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl QueryValidator {
    /// Creates a validator; `read_only` enables the mutating-keyword check.
    pub fn new(read_only: bool) -> Self {
        Self { read_only }
    }

    /// Returns whether the validator rejects mutating keywords.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Validates a candidate statement.
    pub fn validate(&self, sql: &str) -> Result<(), SafetyViolation> {
        if self.read_only {
            let upper = sql.to_uppercase();
            if let Some((keyword, _)) = WRITE_PATTERNS
                .iter()
                .find(|(_, pattern)| pattern.is_match(&upper))
            {
                return Err(SafetyViolation::WriteBlocked(keyword.to_string()));
            }
        }

        let statements = sql.split(';').filter(|s| !s.trim().is_empty()).count();
        if statements > 1 {
            return Err(SafetyViolation::MultipleStatements);
        }

        Ok(())
    }

    /// Returns `(true, "")` for safe statements, otherwise `(false, reason)`.
    pub fn is_safe(&self, sql: &str) -> (bool, String) {
        match self.validate(sql) {
            Ok(()) => (true, String::new()),
            Err(violation) => (false, violation.to_string()),
        }
    }
}
