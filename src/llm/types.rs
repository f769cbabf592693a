//! Request and response types for LLM communication.

use serde::{Deserialize, Serialize};

/// A single generation request: system instructions plus the prompt body.
///
/// The two travel on separate channels so providers can route the system
/// text to their dedicated instruction field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Standing instructions for the model.
    pub system: String,
    /// The user-facing prompt.
    pub prompt: String,
}

impl GenerationRequest {
    /// Creates a new request.
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
        }
    }
}

/// Token accounting reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the request.
    pub input_tokens: u32,
    /// Tokens generated in the response.
    pub output_tokens: u32,
}

/// Text produced by a backend for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Raw generated text.
    pub content: String,
    /// Identifier of the model that produced it.
    pub model: String,
    /// Token usage, when the provider reports it.
    pub usage: Option<Usage>,
}

impl GenerationResponse {
    /// Creates a response without usage information.
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            usage: None,
        }
    }

    /// Attaches usage information.
    pub fn with_usage(mut self, input_tokens: u32, output_tokens: u32) -> Self {
        self.usage = Some(Usage {
            input_tokens,
            output_tokens,
        });
        self
    }
}
