//! Ordered fallback chains over embedding and LLM providers
//!
//! A chain tries each provider in sequence and returns the first success.
//! Failures of non-final providers are logged and superseded; only when the
//! final provider fails does the call return an error. Adding a provider is
//! a list append, not a branch edit.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::{GenerateOptions, LlmProvider};

/// Embedding provider chain tried in order until one succeeds
pub struct FallbackEmbedder {
    providers: Vec<Arc<dyn EmbeddingProvider>>,
}

impl FallbackEmbedder {
    /// Create a chain from an ordered, non-empty provider list.
    ///
    /// Every member must report the dimensionality of the chain head, so a
    /// mid-chain fallback cannot write incompatible vectors into the index.
    pub fn new(providers: Vec<Arc<dyn EmbeddingProvider>>) -> Result<Self> {
        if providers.is_empty() {
            return Err(Error::Config(
                "embedding fallback chain must have at least one provider".to_string(),
            ));
        }
        let dimensions = providers[0].dimensions();
        for provider in &providers[1..] {
            if provider.dimensions() != dimensions {
                return Err(Error::Config(format!(
                    "embedding provider '{}' has {} dimensions, chain expects {}",
                    provider.name(),
                    provider.dimensions(),
                    dimensions
                )));
            }
        }
        Ok(Self { providers })
    }
}

#[async_trait]
impl EmbeddingProvider for FallbackEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let last = self.providers.len() - 1;
        for (i, provider) in self.providers.iter().enumerate() {
            match provider.embed(text).await {
                Ok(vector) => return Ok(vector),
                Err(e) if i < last => {
                    tracing::warn!(
                        "embed failed on provider '{}', falling back: {}",
                        provider.name(),
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }
        unreachable!("chain is non-empty")
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let last = self.providers.len() - 1;
        for (i, provider) in self.providers.iter().enumerate() {
            match provider.embed_batch(texts).await {
                Ok(vectors) => return Ok(vectors),
                Err(e) if i < last => {
                    tracing::warn!(
                        "embed_batch failed on provider '{}', falling back: {}",
                        provider.name(),
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }
        unreachable!("chain is non-empty")
    }

    fn dimensions(&self) -> usize {
        self.providers[0].dimensions()
    }

    async fn health_check(&self) -> Result<bool> {
        for provider in &self.providers {
            if provider.health_check().await.unwrap_or(false) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn name(&self) -> &str {
        "fallback"
    }
}

/// LLM provider chain tried in order until one succeeds
pub struct FallbackLlm {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl FallbackLlm {
    /// Create a chain from an ordered, non-empty provider list
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>) -> Result<Self> {
        if providers.is_empty() {
            return Err(Error::Config(
                "LLM fallback chain must have at least one provider".to_string(),
            ));
        }
        Ok(Self { providers })
    }
}

#[async_trait]
impl LlmProvider for FallbackLlm {
    async fn complete(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        let last = self.providers.len() - 1;
        for (i, provider) in self.providers.iter().enumerate() {
            match provider.complete(prompt, options).await {
                Ok(result) => return Ok(result),
                Err(e) if i < last => {
                    tracing::warn!(
                        "complete failed on provider '{}' (model {}), falling back: {}",
                        provider.name(),
                        provider.model(),
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }
        unreachable!("chain is non-empty")
    }

    async fn health_check(&self) -> Result<bool> {
        for provider in &self.providers {
            if provider.health_check().await.unwrap_or(false) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn name(&self) -> &str {
        "fallback"
    }

    fn model(&self) -> &str {
        self.providers[0].model()
    }
}
