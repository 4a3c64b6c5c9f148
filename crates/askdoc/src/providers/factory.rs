//! Provider selection from configuration
//!
//! Chains are assembled here, once, at construction time. The orchestrator
//! only ever sees `Arc<dyn EmbeddingProvider>` / `Arc<dyn LlmProvider>`.

use std::sync::Arc;

use crate::config::{Mode, RagConfig};
use crate::error::Result;

use super::embedding::EmbeddingProvider;
use super::fallback::{FallbackEmbedder, FallbackLlm};
use super::llm::LlmProvider;
use super::ollama::{OllamaEmbedder, OllamaLlm};
use super::onnx::OnnxEmbedder;
use super::openai::{OpenAiEmbedder, OpenAiLlm};

/// Build the embedding provider chain for the configured mode.
///
/// - `local`: Ollama service first, in-process ONNX model as fallback.
/// - `api` with a credential: the remote API model.
/// - `api` without a credential: silently degrade to the local chain.
///
/// Chain members are constrained to the head's dimensionality; a candidate
/// that differs is dropped with a warning rather than risking a mid-chain
/// fallback writing incompatible vectors.
pub async fn build_embedder(config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedding = &config.embedding;

    let mut providers: Vec<Arc<dyn EmbeddingProvider>> = Vec::new();

    match (embedding.mode, config.llm.api_key.clone()) {
        (Mode::Api, Some(api_key)) => {
            tracing::info!("Using API embeddings model: {}", embedding.api_model);
            // text-embedding-3-small returns 1536 dimensions.
            providers.push(Arc::new(OpenAiEmbedder::new(
                api_key,
                embedding.api_model.clone(),
                1536,
            )));
        }
        (mode, api_key) => {
            if mode == Mode::Api && api_key.is_none() {
                tracing::warn!(
                    "EMBEDDING_MODE=api but no API credential is set; using local embeddings"
                );
            }
            if config.llm.use_ollama {
                tracing::info!(
                    "Using Ollama embeddings ({}) with local-model fallback",
                    embedding.local_model
                );
                providers.push(Arc::new(OllamaEmbedder::new(
                    &config.llm,
                    embedding.local_model.clone(),
                    embedding.dimensions,
                )));
            }
            providers.push(Arc::new(OnnxEmbedder::new(embedding).await?));
        }
    }

    let head_dimensions = providers[0].dimensions();
    let (keep, dropped): (Vec<_>, Vec<_>) = providers
        .into_iter()
        .partition(|p| p.dimensions() == head_dimensions);
    for provider in dropped {
        tracing::warn!(
            "excluding embedding provider '{}' from chain: {} dimensions, chain expects {}",
            provider.name(),
            provider.dimensions(),
            head_dimensions
        );
    }

    Ok(Arc::new(FallbackEmbedder::new(keep)?))
}

/// Build the LLM provider chain for the configured mode.
///
/// - `local`: the Ollama service.
/// - `api` with a credential: the remote API model, degrading to the local
///   service if the API call fails.
/// - `api` without a credential: silently degrade to the local service.
pub fn build_llm(config: &RagConfig) -> Result<Arc<dyn LlmProvider>> {
    let llm = &config.llm;

    let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::new();

    match (llm.mode, llm.api_key.as_deref()) {
        (Mode::Api, Some(api_key)) => {
            tracing::info!("Using API LLM: {}", llm.api_model);
            providers.push(Arc::new(OpenAiLlm::new(
                api_key.to_string(),
                llm.api_model.clone(),
            )));
            if llm.use_ollama {
                providers.push(Arc::new(OllamaLlm::new(llm)));
            }
        }
        (Mode::Api, None) => {
            tracing::warn!(
                "LLM_MODE=api but no API credential is set; using local LLM: {}",
                llm.local_model
            );
            providers.push(Arc::new(OllamaLlm::new(llm)));
        }
        (Mode::Local, _) => {
            tracing::info!("Using local LLM: {}", llm.local_model);
            providers.push(Arc::new(OllamaLlm::new(llm)));
        }
    }

    Ok(Arc::new(FallbackLlm::new(providers)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RagConfig;

    #[test]
    fn test_llm_api_mode_without_credential_degrades_to_local() {
        let mut config = RagConfig::default();
        config.llm.mode = Mode::Api;
        config.llm.api_key = None;

        let llm = build_llm(&config).unwrap();
        // The degraded chain fronts the configured local model.
        assert_eq!(llm.model(), config.llm.local_model);
    }

    #[test]
    fn test_llm_api_mode_with_credential_uses_api_model() {
        let mut config = RagConfig::default();
        config.llm.mode = Mode::Api;
        config.llm.api_key = Some("sk-test".to_string());

        let llm = build_llm(&config).unwrap();
        assert_eq!(llm.model(), config.llm.api_model);
    }

    #[test]
    fn test_llm_local_mode_uses_local_model() {
        let config = RagConfig::default();
        let llm = build_llm(&config).unwrap();
        assert_eq!(llm.model(), config.llm.local_model);
    }
}
