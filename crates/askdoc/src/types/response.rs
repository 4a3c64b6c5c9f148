//! Response types for queries and ingestion

use serde::{Deserialize, Serialize};

use super::document::{Chunk, ChunkMetadata};

/// Maximum source snippet length before truncation
const SOURCE_CONTENT_LIMIT: usize = 500;

/// A retrieved source attached to an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    /// Chunk content, truncated to 500 characters with an ellipsis marker
    pub content: String,
    /// Chunk metadata (source, file type, document id, chunk index)
    pub metadata: ChunkMetadata,
}

impl SourceRef {
    /// Build a source reference from a retrieved chunk
    pub fn from_chunk(chunk: &Chunk) -> Self {
        Self {
            content: truncate_content(&chunk.content, SOURCE_CONTENT_LIMIT),
            metadata: chunk.metadata.clone(),
        }
    }
}

/// Truncate to `max_len` characters at a UTF-8 boundary, appending "..."
/// when anything was cut
fn truncate_content(content: &str, max_len: usize) -> String {
    if content.chars().count() <= max_len {
        return content.to_string();
    }

    let truncated: String = content.chars().take(max_len).collect();
    format!("{}...", truncated)
}

/// Result of a RAG query.
///
/// Always well-formed: on internal failure `answer` carries a descriptive
/// error string and `sources` is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Generated answer, or an error description
    pub answer: String,
    /// Retrieved sources, ordered by descending similarity
    pub sources: Vec<SourceRef>,
}

impl QueryResult {
    /// Build a result from an answer and the chunks that grounded it
    pub fn new(answer: String, chunks: &[Chunk]) -> Self {
        Self {
            answer,
            sources: chunks.iter().map(SourceRef::from_chunk).collect(),
        }
    }

    /// Build the fail-soft result for an internal error
    pub fn from_error(error: &crate::error::Error) -> Self {
        Self {
            answer: format!("Error: {}", error),
            sources: Vec::new(),
        }
    }
}

/// A per-source failure recorded during bulk ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestFailure {
    /// The file path or URL that failed
    pub source: String,
    /// What went wrong
    pub error: String,
}

/// Outcome of a bulk ingest operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    /// Total chunks successfully written to the index
    pub chunks_written: usize,
    /// Sources processed successfully
    pub sources_ingested: usize,
    /// Per-source failures (the batch continues past these)
    pub failures: Vec<IngestFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::{Document, FileType};

    fn chunk_with_content(content: String) -> Chunk {
        let doc = Document::new("notes.txt".to_string(), FileType::Txt);
        Chunk::new(&doc, content, 0)
    }

    #[test]
    fn test_long_content_is_truncated_with_marker() {
        let chunk = chunk_with_content("x".repeat(501));
        let source = SourceRef::from_chunk(&chunk);

        assert_eq!(source.content.chars().count(), 503); // 500 + "..."
        assert!(source.content.ends_with("..."));
    }

    #[test]
    fn test_short_content_is_unmodified() {
        let chunk = chunk_with_content("x".repeat(500));
        let source = SourceRef::from_chunk(&chunk);

        assert_eq!(source.content, chunk.content);
        assert!(!source.content.ends_with("..."));
    }

    #[test]
    fn test_truncation_respects_multibyte_characters() {
        let chunk = chunk_with_content("é".repeat(600));
        let source = SourceRef::from_chunk(&chunk);

        assert_eq!(source.content.chars().count(), 503);
        assert!(source.content.ends_with("..."));
    }

    #[test]
    fn test_error_result_is_well_formed() {
        let err = crate::error::Error::embedding("provider down");
        let result = QueryResult::from_error(&err);

        assert!(result.answer.starts_with("Error:"));
        assert!(result.sources.is_empty());
    }
}
