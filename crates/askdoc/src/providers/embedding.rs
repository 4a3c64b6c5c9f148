//! Embedding provider trait for mapping text to vectors

use async_trait::async_trait;

use crate::error::Result;

/// Trait for generating text embeddings
///
/// Implementations:
/// - `OllamaEmbedder`: local Ollama service (nomic-embed-text)
/// - `OnnxEmbedder`: in-process ONNX model (all-mpnet-base-v2)
/// - `OpenAiEmbedder`: remote API (text-embedding-3-small)
/// - `FallbackEmbedder`: ordered chain of the above
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, order-preserving.
    ///
    /// Default implementation calls `embed` sequentially; implementations
    /// with native batch support should override.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Fixed embedding dimensionality for this provider configuration
    fn dimensions(&self) -> usize;

    /// Check if the provider is reachable and usable
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
