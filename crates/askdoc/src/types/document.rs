//! Document and chunk types with source tracking

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Supported source types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Legacy Microsoft Word document (.doc)
    Doc,
    /// Plain text file
    Txt,
    /// Web page fetched from a URL
    Web,
}

impl FileType {
    /// Detect file type from an extension, if supported
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::Doc),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Doc => "Word Document (.doc)",
            Self::Txt => "Text File",
            Self::Web => "Web Page",
        }
    }
}

/// A source document that has been ingested
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID, assigned once at ingestion
    pub id: Uuid,
    /// Origin file path or URL
    pub source: String,
    /// Source type
    pub file_type: FileType,
    /// Number of chunks produced from this document
    pub total_chunks: u32,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new document record
    pub fn new(source: String, file_type: FileType) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            file_type,
            total_chunks: 0,
            ingested_at: chrono::Utc::now(),
        }
    }
}

/// Metadata attached to every chunk.
///
/// `document_id` is shared by all chunks of one parent document; the chunk's
/// own `id` is the unique identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    /// Origin file path or URL
    pub source: String,
    /// Source type
    pub file_type: FileType,
    /// File name, for file sources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Parent document ID
    pub document_id: Uuid,
    /// Position of this chunk within the parent document
    pub chunk_index: u32,
}

/// A bounded-length slice of a source document's text, the unit of
/// embedding and retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Text content
    pub content: String,
    /// Source metadata
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a new chunk for a document
    pub fn new(document: &Document, content: String, chunk_index: u32) -> Self {
        let file_name = match document.file_type {
            FileType::Web => None,
            _ => std::path::Path::new(&document.source)
                .file_name()
                .map(|n| n.to_string_lossy().to_string()),
        };

        Self {
            id: Uuid::new_v4(),
            document_id: document.id,
            content,
            metadata: ChunkMetadata {
                source: document.source.clone(),
                file_type: document.file_type,
                file_name,
                document_id: document.id,
                chunk_index,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_extension() {
        assert_eq!(FileType::from_extension("pdf"), Some(FileType::Pdf));
        assert_eq!(FileType::from_extension("PDF"), Some(FileType::Pdf));
        assert_eq!(FileType::from_extension("docx"), Some(FileType::Docx));
        assert_eq!(FileType::from_extension("doc"), Some(FileType::Doc));
        assert_eq!(FileType::from_extension("txt"), Some(FileType::Txt));
        assert_eq!(FileType::from_extension("md"), None);
        assert_eq!(FileType::from_extension("xlsx"), None);
    }

    #[test]
    fn test_chunk_ids_unique_within_document() {
        let doc = Document::new("notes.txt".to_string(), FileType::Txt);
        let a = Chunk::new(&doc, "first".to_string(), 0);
        let b = Chunk::new(&doc, "second".to_string(), 1);

        assert_ne!(a.id, b.id);
        assert_eq!(a.document_id, b.document_id);
        assert_eq!(a.metadata.document_id, b.metadata.document_id);
        assert_eq!(a.metadata.file_name.as_deref(), Some("notes.txt"));
    }

    #[test]
    fn test_web_chunk_has_no_file_name() {
        let doc = Document::new("https://example.com/page".to_string(), FileType::Web);
        let chunk = Chunk::new(&doc, "body".to_string(), 0);
        assert!(chunk.metadata.file_name.is_none());
        assert_eq!(chunk.metadata.source, "https://example.com/page");
    }
}
