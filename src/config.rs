//! Configuration management for askdb.
//!
//! Handles loading configuration from a TOML file with `[llm]` and
//! `[safety]` sections. Every field has a default, so an empty or absent
//! file is a valid configuration.

use crate::error::{AskError, Result};
use crate::llm::LlmProvider;
use crate::query::ExecutorSettings;
use crate::retry::RetrySettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for askdb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding domain knowledge documents.
    #[serde(default = "default_knowledge_dir")]
    pub knowledge_dir: PathBuf,

    /// Generation backend configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Execution limits.
    #[serde(default)]
    pub safety: SafetyConfig,
}

fn default_knowledge_dir() -> PathBuf {
    PathBuf::from("knowledge")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            knowledge_dir: default_knowledge_dir(),
            llm: LlmConfig::default(),
            safety: SafetyConfig::default(),
        }
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider: "anthropic", "openai", "ollama" or "mock".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name. Each provider has its own default.
    #[serde(default)]
    pub model: Option<String>,

    /// API key. Takes precedence over the provider's environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sampling temperature.
    #[serde(default)]
    pub temperature: f32,

    /// Maximum tokens to generate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Upper bound on a single generation call, in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    LlmProvider::default().as_str().to_string()
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_llm_timeout() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            api_key: None,
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl LlmConfig {
    /// Parses the configured provider name.
    pub fn provider(&self) -> Result<LlmProvider> {
        self.provider.parse().map_err(AskError::config)
    }

    /// Returns the configured model, or the provider's default.
    pub fn model_or_default(&self, provider: LlmProvider) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string())
    }
}

/// Execution limits and retry budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Reject mutating statements.
    #[serde(default = "default_true")]
    pub read_only: bool,

    /// Statement timeout in seconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout: u64,

    /// Row cap and automatic `LIMIT`.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Maximum generate→execute cycles per question.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

fn default_true() -> bool {
    true
}

fn default_query_timeout() -> u64 {
    30
}

fn default_max_results() -> usize {
    1000
}

fn default_max_retries() -> usize {
    3
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            read_only: true,
            query_timeout: default_query_timeout(),
            max_results: default_max_results(),
            max_retries: default_max_retries(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("askdb")
            .join("config.toml")
    }

    /// Loads configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Loads configuration from a TOML file that must exist.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AskError::not_found(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AskError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            AskError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Returns the executor policy described by `[safety]`.
    pub fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            read_only: self.safety.read_only,
            timeout: Duration::from_secs(self.safety.query_timeout),
            max_results: self.safety.max_results,
        }
    }

    /// Returns the retry limits described by `[safety]` and `[llm]`.
    pub fn retry_settings(&self) -> RetrySettings {
        RetrySettings {
            max_attempts: self.safety.max_retries,
            generation_timeout: Duration::from_secs(self.llm.timeout_secs),
        }
    }
}
