//! Configuration for the RAG pipeline

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding configuration
    pub embedding: EmbeddingConfig,
    /// LLM configuration
    pub llm: LlmConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Vector database configuration
    pub vector_db: VectorDbConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
}

/// Provider mode: local models/services or a remote API
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Local backend (Ollama service and/or in-process model)
    #[default]
    Local,
    /// Remote API backend (requires a credential)
    Api,
}

impl Mode {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "api" => Self::Api,
            _ => Self::Local,
        }
    }
}

/// Vector index backend, selected at construction time
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    /// Single serialized snapshot file, rebuilt in memory on load
    #[default]
    Snapshot,
    /// Append-only segment files, replayed in order on load
    Segments,
}

impl VectorBackend {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "segments" => Self::Segments,
            _ => Self::Snapshot,
        }
    }

    /// Sub-directory under the vector DB root for this backend
    pub fn sub_path(&self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::Segments => "segments",
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Selection mode (local or api)
    pub mode: Mode,
    /// Ollama embedding model (local service)
    pub local_model: String,
    /// In-process ONNX model (general-purpose local fallback)
    pub onnx_model: String,
    /// Remote API embedding model
    pub api_model: String,
    /// Embedding dimensions for the local chain
    pub dimensions: usize,
    /// Maximum sequence length for the ONNX tokenizer
    pub max_length: usize,
    /// Batch size for ONNX embedding generation
    pub batch_size: usize,
    /// Cache directory for downloaded models
    pub cache_dir: PathBuf,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Local,
            local_model: "nomic-embed-text".to_string(),
            // all-mpnet-base-v2 matches nomic-embed-text at 768 dimensions,
            // so a mid-chain fallback stays compatible with the index
            onnx_model: "all-mpnet-base-v2".to_string(),
            api_model: "text-embedding-3-small".to_string(),
            dimensions: 768,
            max_length: 256,
            batch_size: 32,
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("askdoc")
                .join("models"),
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Selection mode (local or api)
    pub mode: Mode,
    /// Ollama base URL
    pub base_url: String,
    /// Local generation model name
    pub local_model: String,
    /// Remote API generation model name
    pub api_model: String,
    /// Remote API credential (absent: api mode degrades to local)
    pub api_key: Option<String>,
    /// Whether the Ollama service is enabled at all
    pub use_ollama: bool,
    /// Temperature for generation (one default across backends)
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: usize,
    /// Context window size (tokens)
    pub context_window: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Local,
            base_url: "http://localhost:11434".to_string(),
            local_model: "mistral".to_string(),
            api_model: "gpt-4o-mini".to_string(),
            api_key: None,
            use_ollama: true,
            temperature: 0.2,
            max_tokens: 2048,
            context_window: 4096,
            timeout_secs: 120,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters (must be < chunk_size)
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDbConfig {
    /// Root directory for persisted indexes
    pub root: PathBuf,
    /// Backend variant
    pub backend: VectorBackend,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        let root = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("askdoc")
            .join("vectordb");

        Self {
            root,
            backend: VectorBackend::Snapshot,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks to retrieve per query
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env_var(name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl RagConfig {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Recognized variables: `HOST`, `PORT`, `EMBEDDING_MODE`,
    /// `LOCAL_EMBEDDING_MODEL`, `ONNX_EMBEDDING_MODEL`, `API_EMBEDDING_MODEL`,
    /// `EMBEDDING_DIMENSIONS`, `LLM_MODE`, `OLLAMA_BASE_URL`,
    /// `LOCAL_MODEL_NAME`, `API_MODEL_NAME`, `OPENAI_API_KEY`, `USE_OLLAMA`,
    /// `LLM_TEMPERATURE`, `VECTOR_DB_PATH`, `VECTOR_DB_BACKEND`, `CHUNK_SIZE`,
    /// `CHUNK_OVERLAP`, `TOP_K_RETRIEVAL`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = env_var("HOST") {
            config.server.host = host;
        }
        config.server.port = env_parse("PORT", config.server.port);

        if let Some(mode) = env_var("EMBEDDING_MODE") {
            config.embedding.mode = Mode::parse(&mode);
        }
        if let Some(model) = env_var("LOCAL_EMBEDDING_MODEL") {
            config.embedding.local_model = model;
        }
        if let Some(model) = env_var("ONNX_EMBEDDING_MODEL") {
            config.embedding.onnx_model = model;
        }
        if let Some(model) = env_var("API_EMBEDDING_MODEL") {
            config.embedding.api_model = model;
        }
        config.embedding.dimensions =
            env_parse("EMBEDDING_DIMENSIONS", config.embedding.dimensions);

        if let Some(mode) = env_var("LLM_MODE") {
            config.llm.mode = Mode::parse(&mode);
        }
        if let Some(url) = env_var("OLLAMA_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Some(model) = env_var("LOCAL_MODEL_NAME") {
            config.llm.local_model = model;
        }
        if let Some(model) = env_var("API_MODEL_NAME") {
            config.llm.api_model = model;
        }
        config.llm.api_key = env_var("OPENAI_API_KEY");
        if let Some(flag) = env_var("USE_OLLAMA") {
            config.llm.use_ollama = flag.to_ascii_lowercase() == "true";
        }
        config.llm.temperature = env_parse("LLM_TEMPERATURE", config.llm.temperature);

        if let Some(path) = env_var("VECTOR_DB_PATH") {
            config.vector_db.root = PathBuf::from(path);
        }
        if let Some(backend) = env_var("VECTOR_DB_BACKEND") {
            config.vector_db.backend = VectorBackend::parse(&backend);
        }

        config.chunking.chunk_size = env_parse("CHUNK_SIZE", config.chunking.chunk_size);
        config.chunking.chunk_overlap =
            env_parse("CHUNK_OVERLAP", config.chunking.chunk_overlap);
        config.retrieval.top_k = env_parse("TOP_K_RETRIEVAL", config.retrieval.top_k);

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("top_k must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.embedding.mode, Mode::Local);
        assert_eq!(config.llm.mode, Mode::Local);
        assert_eq!(config.vector_db.backend, VectorBackend::Snapshot);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(config.validate().is_err());

        config.chunking.chunk_overlap = config.chunking.chunk_size + 1;
        assert!(config.validate().is_err());

        config.chunking.chunk_overlap = config.chunking.chunk_size - 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode::parse("api"), Mode::Api);
        assert_eq!(Mode::parse("API"), Mode::Api);
        assert_eq!(Mode::parse("local"), Mode::Local);
        assert_eq!(Mode::parse("anything-else"), Mode::Local);
    }

    #[test]
    fn test_backend_sub_path() {
        assert_eq!(VectorBackend::Snapshot.sub_path(), "snapshot");
        assert_eq!(VectorBackend::Segments.sub_path(), "segments");
    }
}
