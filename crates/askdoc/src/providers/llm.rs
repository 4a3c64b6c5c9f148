//! LLM provider trait for free-text completion

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Options for a single completion call.
///
/// One temperature default is used across all backends; the 0.1-local /
/// 0.9-api split in earlier systems was an accident, not a contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: usize,
    /// Context window size in tokens
    pub context_window: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 2048,
            context_window: 4096,
        }
    }
}

/// Trait for LLM-backed text completion
///
/// Implementations:
/// - `OllamaLlm`: local Ollama service
/// - `OpenAiLlm`: remote chat-completions API
/// - `FallbackLlm`: ordered chain of the above
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Produce a completion for a prompt. Single blocking call, no
    /// streaming; returns the full completion or fails.
    async fn complete(&self, prompt: &str, options: &GenerateOptions) -> Result<String>;

    /// Check if the provider is reachable and usable
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// The model this provider is configured with
    fn model(&self) -> &str;
}
