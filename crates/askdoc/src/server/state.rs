//! Application state for the HTTP server
//!
//! Built once at process start and injected into handlers via axum's
//! `State` extractor. There is no module-level mutable state.

use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::index::open_index;
use crate::ingestion::DocumentProcessor;
use crate::providers::{build_embedder, build_llm, GenerateOptions};
use crate::rag::RagChain;
use crate::types::Document;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// The RAG pipeline
    chain: RagChain,
    /// Registry of ingested documents
    documents: DashMap<Uuid, Document>,
    /// Directory where uploaded files are written before processing
    uploads_dir: PathBuf,
}

impl AppState {
    /// Create the application state: providers, index, and pipeline
    pub async fn new(config: RagConfig) -> Result<Self> {
        config.validate()?;

        let embedder = build_embedder(&config).await?;
        let llm = build_llm(&config)?;

        // The index dimensionality follows the selected embedding chain.
        let index = open_index(&config.vector_db, embedder.dimensions())?;
        tracing::info!(
            "Vector index ready (backend: {}, {} dimensions)",
            index.name(),
            index.dimensions()
        );

        let processor = DocumentProcessor::new(
            config.chunking.chunk_size,
            config.chunking.chunk_overlap,
        )?;

        let options = GenerateOptions {
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            context_window: config.llm.context_window,
        };

        let chain = RagChain::new(
            index,
            embedder,
            llm,
            processor,
            options,
            config.retrieval.top_k,
        );

        let uploads_dir = config
            .vector_db
            .root
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("documents");
        std::fs::create_dir_all(&uploads_dir).map_err(|e| {
            Error::Config(format!(
                "cannot create uploads directory {}: {}",
                uploads_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                chain,
                documents: DashMap::new(),
                uploads_dir,
            }),
        })
    }

    /// The loaded configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// The RAG pipeline
    pub fn chain(&self) -> &RagChain {
        &self.inner.chain
    }

    /// Directory for uploaded files
    pub fn uploads_dir(&self) -> &PathBuf {
        &self.inner.uploads_dir
    }

    /// Record ingested documents in the registry
    pub fn register_documents(&self, documents: Vec<Document>) {
        for document in documents {
            self.inner.documents.insert(document.id, document);
        }
    }

    /// List all registered documents
    pub fn list_documents(&self) -> Vec<Document> {
        self.inner
            .documents
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
