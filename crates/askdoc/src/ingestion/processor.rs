//! Per-source document processing: load, chunk, attach metadata

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{Chunk, Document, FileType};

use super::chunker::TextChunker;
use super::loader::{DocxLoader, PdfLoader, TxtLoader, WebLoader};

/// Turns files and URLs into chunked documents ready for embedding
pub struct DocumentProcessor {
    chunker: TextChunker,
    pdf: PdfLoader,
    docx: DocxLoader,
    txt: TxtLoader,
    web: WebLoader,
}

impl DocumentProcessor {
    /// Create a processor with the given chunking parameters
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        Ok(Self {
            chunker: TextChunker::new(chunk_size, chunk_overlap)?,
            pdf: PdfLoader,
            docx: DocxLoader,
            txt: TxtLoader,
            web: WebLoader::new(),
        })
    }

    /// Process a single file into a document record and its chunks.
    ///
    /// Extensions outside `.pdf`/`.docx`/`.doc`/`.txt` are rejected with
    /// `Error::UnsupportedSource`; a missing file or failed extraction is
    /// `Error::Load`.
    pub fn process_file(&self, path: &Path) -> Result<(Document, Vec<Chunk>)> {
        if !path.exists() {
            return Err(Error::load(path.to_string_lossy(), "file not found"));
        }

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let file_type = FileType::from_extension(&extension)
            .ok_or_else(|| Error::UnsupportedSource(extension.clone()))?;

        let text = match file_type {
            FileType::Pdf => self.pdf.load(path)?,
            FileType::Docx | FileType::Doc => self.docx.load(path)?,
            FileType::Txt => self.txt.load(path)?,
            FileType::Web => unreachable!("web sources are not files"),
        };

        let mut document = Document::new(path.to_string_lossy().to_string(), file_type);
        let chunks = self.chunk_document(&mut document, &text);
        Ok((document, chunks))
    }

    /// Process a web URL into a document record and its chunks
    pub async fn process_url(&self, url: &str) -> Result<(Document, Vec<Chunk>)> {
        let text = self.web.load(url).await?;

        let mut document = Document::new(url.to_string(), FileType::Web);
        let chunks = self.chunk_document(&mut document, &text);
        Ok((document, chunks))
    }

    /// Split raw text with the processor's chunking parameters
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.chunker.split(text)
    }

    fn chunk_document(&self, document: &mut Document, text: &str) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = self
            .chunker
            .split(text)
            .into_iter()
            .enumerate()
            .map(|(i, content)| Chunk::new(document, content, i as u32))
            .collect();

        document.total_chunks = chunks.len() as u32;
        tracing::info!(
            "Processed {}: {} chunks",
            document.source,
            document.total_chunks
        );
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn processor() -> DocumentProcessor {
        DocumentProcessor::new(100, 20).unwrap()
    }

    fn temp_txt(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_txt_file_produces_chunks_with_metadata() {
        let file = temp_txt(&"some searchable text. ".repeat(20));
        let (document, chunks) = processor().process_file(file.path()).unwrap();

        assert!(!chunks.is_empty());
        assert_eq!(document.total_chunks as usize, chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.document_id, document.id);
            assert_eq!(chunk.metadata.chunk_index, i as u32);
            assert_eq!(chunk.metadata.file_type, FileType::Txt);
            assert_eq!(chunk.metadata.source, document.source);
        }
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let err = processor().process_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedSource(ext) if ext == "xlsx"));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let err = processor()
            .process_file(Path::new("/no/such/notes.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }

    #[test]
    fn test_same_text_ingests_to_same_count_twice() {
        let content = "a page of text that will be chunked. ".repeat(30);
        let file_a = temp_txt(&content);
        let file_b = temp_txt(&content);

        let (_, chunks_a) = processor().process_file(file_a.path()).unwrap();
        let (_, chunks_b) = processor().process_file(file_b.path()).unwrap();
        assert_eq!(chunks_a.len(), chunks_b.len());
    }
}
