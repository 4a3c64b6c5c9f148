//! askdoc: retrieval-augmented document Q&A
//!
//! Ingests files and web pages, splits them into overlapping chunks, embeds
//! and stores them in a persisted vector index, and answers questions by
//! retrieving relevant chunks and conditioning an LLM on them. Embedding and
//! generation providers are ordered fallback chains (Ollama service,
//! in-process ONNX model, remote API); the vector index has snapshot and
//! segment backends selected by configuration.

pub mod config;
pub mod error;
pub mod generation;
pub mod index;
pub mod ingestion;
pub mod providers;
pub mod rag;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use rag::RagChain;
pub use types::{Chunk, ChunkMetadata, Document, FileType, QueryRequest, QueryResult};
