//! Mock LLM client for testing.
//!
//! Replies come from, in order: a scripted queue, custom pattern mappings
//! matched against the user question, a fixed fallback, and finally two
//! built-in demo replies about a `users` table, which is what `--llm mock`
//! answers with. Anything else gets a refusal.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

use crate::error::{AskError, Result};
use crate::llm::types::{GenerationRequest, GenerationResponse};
use crate::llm::LlmClient;

const MOCK_MODEL: &str = "mock";
const QUESTION_PREFIX: &str = "USER QUESTION: ";

/// Mock LLM client that returns canned responses.
///
/// Used for unit testing without making real API calls.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    script: Mutex<VecDeque<Result<String>>>,
    custom_responses: Vec<(String, String)>,
    fallback: Option<String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that answers every request with `response`.
    pub fn with_fallback(response: impl Into<String>) -> Self {
        Self {
            fallback: Some(response.into()),
            ..Self::default()
        }
    }

    /// Creates a mock that replies with `responses` in order, one per call.
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            ..Self::default()
        }
    }

    /// Queues a failure as the next scripted reply after those already queued.
    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.script.get_mut().push_back(Err(AskError::llm(message)));
        self
    }

    /// Adds a custom response mapping.
    ///
    /// When the question contains `pattern`, the mock will return `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Returns how many times `generate` has been called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns every request received, in call order.
    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }

    /// Extracts the user question from a prompt built by the prompt assembler.
    fn extract_question(prompt: &str) -> &str {
        prompt
            .lines()
            .rev()
            .find_map(|line| line.strip_prefix(QUESTION_PREFIX))
            .unwrap_or(prompt)
    }

    /// Generates a mock response based on the question.
    fn mock_response(&self, question: &str) -> String {
        let question = question.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if question.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if let Some(fallback) = &self.fallback {
            return fallback.clone();
        }

        // Demo replies for `--llm mock`.
        if question.contains("all users") || question.contains("show users") {
            return "```sql\nSELECT * FROM users;\n```".to_string();
        }

        if question.contains("count") && question.contains("users") {
            return "SELECT COUNT(*) FROM users".to_string();
        }

        "I don't understand that question. Could you please rephrase it?".to_string()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());

        let scripted = self.script.lock().await.pop_front();
        let content = match scripted {
            Some(reply) => reply?,
            None => self.mock_response(Self::extract_question(&request.prompt)),
        };

        Ok(GenerationResponse::new(content, MOCK_MODEL))
    }
}
