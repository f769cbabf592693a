//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use crate::config::LlmConfig;
use crate::error::{AskError, Result};
use crate::llm::ollama::DEFAULT_OLLAMA_URL;
use crate::llm::{
    AnthropicClient, AnthropicConfig, LlmClient, LlmProvider, MockLlmClient, OllamaClient,
    OllamaConfig, OpenAiClient, OpenAiConfig,
};
use tracing::info;

/// Creates an LLM client from the `[llm]` configuration.
///
/// For providers that require an API key (OpenAI, Anthropic), the key is
/// resolved in order:
/// 1. `api_key` in the configuration
/// 2. Environment variable (`OPENAI_API_KEY` or `ANTHROPIC_API_KEY`)
///
/// Ollama's base URL comes from `OLLAMA_URL` (defaults to
/// http://localhost:11434).
pub fn create_llm_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    let provider = config.provider()?;
    let model = config.model_or_default(provider);
    info!(%provider, %model, "Creating LLM client");

    match provider {
        LlmProvider::Anthropic => {
            let key = resolve_key(config, "ANTHROPIC_API_KEY")?;
            let client_config = AnthropicConfig::new(key, model)
                .with_temperature(config.temperature)
                .with_max_tokens(config.max_tokens)
                .with_timeout(config.timeout_secs);
            Ok(Box::new(AnthropicClient::new(client_config)?))
        }
        LlmProvider::OpenAi => {
            let key = resolve_key(config, "OPENAI_API_KEY")?;
            let client_config = OpenAiConfig::new(key, model)
                .with_temperature(config.temperature)
                .with_max_tokens(config.max_tokens)
                .with_timeout(config.timeout_secs);
            Ok(Box::new(OpenAiClient::new(client_config)?))
        }
        LlmProvider::Ollama => {
            let base_url =
                std::env::var("OLLAMA_URL").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string());
            let client_config = OllamaConfig::new(model)
                .with_url(base_url)
                .with_temperature(config.temperature)
                .with_max_tokens(config.max_tokens)
                .with_timeout(config.timeout_secs);
            Ok(Box::new(OllamaClient::new(client_config)?))
        }
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}

fn resolve_key(config: &LlmConfig, env_var: &str) -> Result<String> {
    config
        .api_key
        .clone()
        .filter(|key| !key.is_empty())
        .or_else(|| std::env::var(env_var).ok())
        .ok_or_else(|| {
            AskError::llm(format!(
                "No API key configured. Set {env_var} or llm.api_key in the config file."
            ))
        })
}
