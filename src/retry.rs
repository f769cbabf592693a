//! Retry-driven generation loop.
//!
//! Resolves one question by alternating generation and execution. A failed
//! attempt (rejected statement, engine error, backend error or timeout) is
//! described back to the backend in the next prompt, up to a fixed budget.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::db::Schema;
use crate::error::{AskError, Result};
use crate::knowledge::KnowledgeSelector;
use crate::llm::{build_error_context, build_request, strip_code_fence, LlmClient};
use crate::query::{QueryExecutor, QueryResult};

/// Limits for one [`RetryController::resolve`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    /// Maximum generate→execute cycles per question.
    pub max_attempts: usize,

    /// Upper bound on a single backend call.
    pub generation_timeout: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            generation_timeout: Duration::from_secs(60),
        }
    }
}

/// Record of one generate→execute cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// Candidate statement, if the backend produced one.
    pub sql: Option<String>,

    /// Why the attempt failed, if it did.
    pub error: Option<String>,
}

/// Terminal result of resolving a question.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A candidate executed successfully.
    Success {
        /// The candidate statement as generated.
        sql: String,
        /// The execution result.
        result: QueryResult,
        /// Every attempt made, the last one successful.
        attempts: Vec<Attempt>,
    },

    /// The retry budget ran out.
    Exhausted {
        /// Failure reason of the final attempt.
        last_error: String,
        /// Candidate statement of the final attempt, if any.
        last_sql: Option<String>,
        /// Every attempt made.
        attempts: Vec<Attempt>,
    },
}

impl Outcome {
    /// Returns true for [`Outcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the attempt trail.
    pub fn attempts(&self) -> &[Attempt] {
        match self {
            Self::Success { attempts, .. } | Self::Exhausted { attempts, .. } => attempts,
        }
    }
}

/// States of the loop; `attempt` is zero-based.
enum RetryState {
    Generating {
        attempt: usize,
        error_context: Option<String>,
    },
    ValidatingExecuting {
        attempt: usize,
        sql: String,
    },
    Retrying {
        attempt: usize,
        error_context: String,
    },
    Exhausted {
        last_error: String,
        last_sql: Option<String>,
    },
}

/// Drives generation, validation and execution for single questions.
pub struct RetryController {
    llm: Arc<dyn LlmClient>,
    executor: QueryExecutor,
    knowledge: KnowledgeSelector,
    schema_text: String,
    table_names: Vec<String>,
    settings: RetrySettings,
}

impl RetryController {
    /// Creates a controller for one database schema.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        executor: QueryExecutor,
        knowledge: KnowledgeSelector,
        schema: &Schema,
        settings: RetrySettings,
    ) -> Self {
        Self {
            llm,
            executor,
            knowledge,
            schema_text: schema.to_prompt_string(),
            table_names: schema.table_names(),
            settings,
        }
    }

    /// Returns the schema table names used as knowledge keywords.
    pub fn table_names(&self) -> &[String] {
        &self.table_names
    }

    /// Resolves a question to an executed statement, retrying on failure.
    pub async fn resolve(&self, question: &str) -> Outcome {
        let knowledge = self.knowledge.context(question, &self.table_names);
        let budget = self.settings.max_attempts.max(1);
        let mut attempts = Vec::with_capacity(budget);

        let mut state = RetryState::Generating {
            attempt: 0,
            error_context: None,
        };

        loop {
            state = match state {
                RetryState::Generating {
                    attempt,
                    error_context,
                } => {
                    debug!(attempt = attempt + 1, budget, "Generating SQL");
                    match self
                        .generate(question, &knowledge, error_context.as_deref())
                        .await
                    {
                        Ok(sql) => RetryState::ValidatingExecuting { attempt, sql },
                        Err(e) => {
                            let reason = e.to_string();
                            warn!(attempt = attempt + 1, error = %reason, "Generation failed");
                            attempts.push(Attempt {
                                sql: None,
                                error: Some(reason.clone()),
                            });
                            let context = format!("Error: {reason}");
                            Self::after_failure(attempt, budget, None, reason, context)
                        }
                    }
                }

                RetryState::ValidatingExecuting { attempt, sql } => {
                    let result = self.executor.execute(&sql).await;

                    if result.success {
                        info!(attempt = attempt + 1, rows = result.row_count, "Query succeeded");
                        attempts.push(Attempt {
                            sql: Some(sql.clone()),
                            error: None,
                        });
                        return Outcome::Success {
                            sql,
                            result,
                            attempts,
                        };
                    }

                    let reason = result.error.unwrap_or_default();
                    warn!(attempt = attempt + 1, error = %reason, "Query failed");
                    attempts.push(Attempt {
                        sql: Some(sql.clone()),
                        error: Some(reason.clone()),
                    });
                    let context = build_error_context(&sql, &reason);
                    Self::after_failure(attempt, budget, Some(sql), reason, context)
                }

                RetryState::Retrying {
                    attempt,
                    error_context,
                } => RetryState::Generating {
                    attempt: attempt + 1,
                    error_context: Some(error_context),
                },

                RetryState::Exhausted {
                    last_error,
                    last_sql,
                } => {
                    warn!(attempts = attempts.len(), "Retry budget exhausted");
                    return Outcome::Exhausted {
                        last_error,
                        last_sql,
                        attempts,
                    };
                }
            };
        }
    }

    /// Generates a candidate statement without validating or executing it.
    ///
    /// Generation failures are retried under the same attempt budget as
    /// [`resolve`](Self::resolve); the last failure is returned once the
    /// budget runs out.
    pub async fn generate_only(&self, question: &str) -> Result<String> {
        let knowledge = self.knowledge.context(question, &self.table_names);
        let budget = self.settings.max_attempts.max(1);
        let mut error_context: Option<String> = None;
        let mut attempt = 0;

        loop {
            debug!(attempt = attempt + 1, budget, "Generating SQL only");
            match self
                .generate(question, &knowledge, error_context.as_deref())
                .await
            {
                Ok(sql) => return Ok(sql),
                Err(e) if attempt + 1 < budget => {
                    warn!(attempt = attempt + 1, error = %e, "Generation failed");
                    error_context = Some(format!("Error: {e}"));
                    attempt += 1;
                }
                Err(e) => {
                    warn!(attempts = budget, "Retry budget exhausted");
                    return Err(e);
                }
            }
        }
    }

    fn after_failure(
        attempt: usize,
        budget: usize,
        last_sql: Option<String>,
        last_error: String,
        error_context: String,
    ) -> RetryState {
        if attempt + 1 < budget {
            RetryState::Retrying {
                attempt,
                error_context,
            }
        } else {
            RetryState::Exhausted {
                last_error,
                last_sql,
            }
        }
    }

    async fn generate(
        &self,
        question: &str,
        knowledge: &str,
        error_context: Option<&str>,
    ) -> Result<String> {
        let request = build_request(&self.schema_text, Some(knowledge), error_context, question);
        let timeout = self.settings.generation_timeout;

        let response = tokio::time::timeout(timeout, self.llm.generate(&request))
            .await
            .map_err(|_| AskError::llm(format!("Generation timed out after {timeout:?}")))??;

        if let Some(usage) = response.usage {
            debug!(
                model = %response.model,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Generation complete"
            );
        }

        Ok(strip_code_fence(&response.content))
    }
}
