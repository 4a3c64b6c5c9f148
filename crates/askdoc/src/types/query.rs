//! Query request types

use serde::{Deserialize, Serialize};

/// A natural-language question posed to the RAG pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,
    /// Override the configured retrieval width
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl QueryRequest {
    /// Create a request with the configured retrieval width
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: None,
        }
    }
}
