//! Provider abstractions for embeddings and answer generation
//!
//! Trait-based so backends are swappable: an Ollama service, an in-process
//! ONNX model, or a remote API, composed into ordered fallback chains.

pub mod embedding;
pub mod factory;
pub mod fallback;
pub mod llm;
pub mod ollama;
pub mod onnx;
pub mod openai;

pub use embedding::EmbeddingProvider;
pub use factory::{build_embedder, build_llm};
pub use fallback::{FallbackEmbedder, FallbackLlm};
pub use llm::{GenerateOptions, LlmProvider};
