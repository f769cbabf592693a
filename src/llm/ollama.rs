//! Ollama LLM client implementation.
//!
//! Implements the LlmClient trait for local Ollama instances via the
//! `/api/chat` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{AskError, Result};
use crate::llm::types::{GenerationRequest, GenerationResponse};
use crate::llm::{LlmClient, LlmProvider};

/// Default timeout for API requests. Local models can be slow to load.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default Ollama API URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama client configuration.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL for the Ollama API.
    pub base_url: String,
    /// Model to use (e.g., "llama3.2", "codellama").
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum tokens to generate (`num_predict`).
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl OllamaConfig {
    /// Creates a new config with the given model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: 2000,
            temperature: 0.0,
        }
    }

    /// Sets the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new(LlmProvider::Ollama.default_model())
    }
}

/// Ollama LLM client.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    config: OllamaConfig,
    client: Client,
}

impl OllamaClient {
    /// Creates a new Ollama client with the given configuration.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AskError::llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Returns the chat API endpoint URL.
    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, request: &GenerationRequest) -> OllamaRequest {
        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(OllamaMessage {
                role: "system".to_string(),
                content: request.system.clone(),
            });
        }
        messages.push(OllamaMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        OllamaRequest {
            model: self.config.model.clone(),
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        }
    }

    fn parse_response(&self, body: &str) -> Result<GenerationResponse> {
        let response: OllamaResponse = serde_json::from_str(body)
            .map_err(|e| AskError::llm(format!("Failed to parse response: {}", e)))?;

        let model = response.model.unwrap_or_else(|| self.config.model.clone());
        let mut generated = GenerationResponse::new(response.message.content, model);
        if let (Some(input), Some(output)) = (response.prompt_eval_count, response.eval_count) {
            generated = generated.with_usage(input, output);
        }
        Ok(generated)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let body = self.build_request(request);
        debug!(model = %self.config.model, url = %self.chat_url(), "Sending Ollama request");

        let response = self
            .client
            .post(self.chat_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AskError::llm("Request timed out. Try again.")
                } else if e.is_connect() {
                    AskError::llm("Failed to connect to Ollama. Is it running? Try: ollama serve")
                } else {
                    AskError::llm(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AskError::llm(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(AskError::llm(format!(
                "Ollama API error ({}): {}",
                status, text
            )));
        }

        self.parse_response(&text)
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: Option<String>,
    message: OllamaMessage,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}
