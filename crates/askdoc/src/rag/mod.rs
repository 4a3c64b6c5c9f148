//! The RAG orchestrator: retrieval wired to generation
//!
//! `RagChain` owns nothing global: the index, embedder, and LLM are injected
//! at construction and shared behind `Arc`. Because the index has interior
//! mutability, chunks written by `ingest` are visible to the very next
//! `search` with no retriever rebuild.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::generation::{PromptBuilder, NO_INFORMATION_ANSWER};
use crate::index::VectorIndex;
use crate::ingestion::DocumentProcessor;
use crate::providers::{EmbeddingProvider, GenerateOptions, LlmProvider};
use crate::types::{Chunk, Document, IngestFailure, IngestReport, QueryResult};

/// Retrieval-augmented generation pipeline
pub struct RagChain {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    processor: DocumentProcessor,
    options: GenerateOptions,
    top_k: usize,
}

impl RagChain {
    /// Create a chain from injected collaborators
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        processor: DocumentProcessor,
        options: GenerateOptions,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            llm,
            processor,
            options,
            top_k,
        }
    }

    /// The configured retrieval width
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Ingest a batch of files and URLs.
    ///
    /// Each source runs load → chunk → embed → add. Load, unsupported-type,
    /// and embedding failures are isolated per source: logged, recorded in
    /// the report, and the batch continues. Index write failures are fatal
    /// and propagate.
    pub async fn ingest(
        &self,
        files: &[PathBuf],
        urls: &[String],
    ) -> Result<(IngestReport, Vec<Document>)> {
        let mut report = IngestReport::default();
        let mut documents = Vec::new();

        for path in files {
            let source = path.to_string_lossy().to_string();
            let processed = self.processor.process_file(path);
            self.ingest_one(source, processed, &mut report, &mut documents)
                .await?;
        }

        for url in urls {
            let processed = self.processor.process_url(url).await;
            self.ingest_one(url.clone(), processed, &mut report, &mut documents)
                .await?;
        }

        tracing::info!(
            "Ingest complete: {} chunks from {} sources ({} failed)",
            report.chunks_written,
            report.sources_ingested,
            report.failures.len()
        );

        Ok((report, documents))
    }

    /// Fold one processed source into the report.
    ///
    /// Load and embedding failures are recorded and skipped; index write
    /// failures propagate.
    async fn ingest_one(
        &self,
        source: String,
        processed: Result<(Document, Vec<Chunk>)>,
        report: &mut IngestReport,
        documents: &mut Vec<Document>,
    ) -> Result<()> {
        let (document, chunks) = match processed {
            Ok(processed) => processed,
            Err(e) => {
                tracing::error!("Error processing {}: {}", source, e);
                report.failures.push(IngestFailure {
                    source,
                    error: e.to_string(),
                });
                return Ok(());
            }
        };

        match self.write_chunks(&chunks).await {
            Ok(written) => {
                report.chunks_written += written;
                report.sources_ingested += 1;
                documents.push(document);
                Ok(())
            }
            Err(e @ Error::Embedding(_)) => {
                tracing::error!("Error embedding {}: {}", source, e);
                report.failures.push(IngestFailure {
                    source,
                    error: e.to_string(),
                });
                Ok(())
            }
            // Index write failures are fatal for the whole batch.
            Err(e) => Err(e),
        }
    }

    /// Embed and store one document's chunks
    async fn write_chunks(&self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;

        self.index.add(chunks, &vectors).await?;
        Ok(chunks.len())
    }

    /// Answer a question from the indexed documents.
    ///
    /// Never returns an error: any internal failure is converted into a
    /// well-formed result whose answer describes the problem.
    pub async fn query(&self, question: &str) -> QueryResult {
        match self.query_inner(question, self.top_k).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Error answering \"{}\": {}", question, e);
                QueryResult::from_error(&e)
            }
        }
    }

    /// Answer with an explicit retrieval width
    pub async fn query_with_top_k(&self, question: &str, top_k: usize) -> QueryResult {
        match self.query_inner(question, top_k).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Error answering \"{}\": {}", question, e);
                QueryResult::from_error(&e)
            }
        }
    }

    async fn query_inner(&self, question: &str, top_k: usize) -> Result<QueryResult> {
        tracing::info!("Query: \"{}\"", question);

        let query_embedding = self.embedder.embed(question).await?;
        let results = self.index.search(&query_embedding, top_k).await?;

        if results.is_empty() {
            return Ok(QueryResult {
                answer: NO_INFORMATION_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        let context = PromptBuilder::build_context(&results);
        let prompt = PromptBuilder::build_rag_prompt(question, &context);
        let answer = self.llm.complete(&prompt, &self.options).await?;

        let chunks: Vec<Chunk> = results.into_iter().map(|r| r.chunk).collect();
        Ok(QueryResult::new(answer, &chunks))
    }

    /// Helper for callers that already hold extracted text: split it into
    /// chunks under a fresh document and store them
    pub async fn ingest_text(&self, source: &str, text: &str) -> Result<usize> {
        use crate::types::FileType;
        let document = Document::new(source.to_string(), FileType::Txt);
        let chunks: Vec<Chunk> = self
            .processor
            .split_text(text)
            .into_iter()
            .enumerate()
            .map(|(i, content)| Chunk::new(&document, content, i as u32))
            .collect();
        self.write_chunks(&chunks).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::index::SnapshotIndex;

    /// Deterministic embedder: hashes text into a small vector
    struct StubEmbedder {
        dimensions: usize,
    }

    fn hash_vector(text: &str, dimensions: usize) -> Vec<f32> {
        let mut vector = vec![0.0f32; dimensions];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % dimensions] += byte as f32 / 255.0;
        }
        vector
    }

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(hash_vector(text, self.dimensions))
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    /// Embedder that always fails, to exercise the fail-soft query path
    struct BrokenEmbedder;

    #[async_trait]
    impl EmbeddingProvider for BrokenEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::embedding("embedder offline"))
        }

        fn dimensions(&self) -> usize {
            8
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(false)
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    /// LLM that answers with a fixed string and records being called
    struct StubLlm {
        called: AtomicBool,
    }

    impl StubLlm {
        fn new() -> Self {
            Self {
                called: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for StubLlm {
        async fn complete(&self, _prompt: &str, _options: &GenerateOptions) -> Result<String> {
            self.called.store(true, Ordering::SeqCst);
            Ok("a grounded answer".to_string())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }
    }

    fn chain_with(
        dir: &std::path::Path,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> RagChain {
        let index = Arc::new(SnapshotIndex::open_or_create(dir.to_path_buf(), 8).unwrap());
        RagChain::new(
            index,
            embedder,
            llm,
            DocumentProcessor::new(100, 20).unwrap(),
            GenerateOptions::default(),
            5,
        )
    }

    fn temp_txt(content: &str) -> tempfile::NamedTempFile {
        use std::io::Write;
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[tokio::test]
    async fn test_ingest_then_query_returns_answer_with_sources() {
        let dir = tempfile::tempdir().unwrap();
        let chain = chain_with(
            dir.path(),
            Arc::new(StubEmbedder { dimensions: 8 }),
            Arc::new(StubLlm::new()),
        );

        let file = temp_txt(&"all about rust ownership and borrowing. ".repeat(10));
        let (report, documents) = chain.ingest(&[file.path().to_path_buf()], &[]).await.unwrap();

        assert!(report.chunks_written > 0);
        assert_eq!(report.sources_ingested, 1);
        assert_eq!(documents.len(), 1);

        let result = chain.query("what is ownership?").await;
        assert_eq!(result.answer, "a grounded answer");
        assert!(!result.sources.is_empty());
    }

    #[tokio::test]
    async fn test_query_on_empty_store_is_well_formed() {
        let dir = tempfile::tempdir().unwrap();
        let chain = chain_with(
            dir.path(),
            Arc::new(StubEmbedder { dimensions: 8 }),
            Arc::new(StubLlm::new()),
        );

        let result = chain.query("anything at all?").await;
        assert_eq!(result.answer, NO_INFORMATION_ANSWER);
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn test_query_failure_is_fail_soft() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(StubLlm::new());
        let chain = chain_with(dir.path(), Arc::new(BrokenEmbedder), llm.clone());

        // Never panics, never returns Err: the failure is in the answer.
        let result = chain.query("does this crash?").await;
        assert!(result.answer.starts_with("Error:"));
        assert!(result.sources.is_empty());
        assert!(!llm.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_bulk_ingest_isolates_bad_source() {
        let dir = tempfile::tempdir().unwrap();
        let chain = chain_with(
            dir.path(),
            Arc::new(StubEmbedder { dimensions: 8 }),
            Arc::new(StubLlm::new()),
        );

        let good_a = temp_txt(&"first document body. ".repeat(10));
        let good_b = temp_txt(&"second document body. ".repeat(10));
        let bad = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();

        let files = vec![
            good_a.path().to_path_buf(),
            bad.path().to_path_buf(),
            good_b.path().to_path_buf(),
        ];
        let (report, _) = chain.ingest(&files, &[]).await.unwrap();

        assert_eq!(report.sources_ingested, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].error.contains("Unsupported"));
        assert!(report.chunks_written > 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_skips_source_without_aborting() {
        let dir = tempfile::tempdir().unwrap();
        let chain = chain_with(dir.path(), Arc::new(BrokenEmbedder), Arc::new(StubLlm::new()));

        let file = temp_txt(&"text that will fail to embed. ".repeat(10));
        let (report, _) = chain.ingest(&[file.path().to_path_buf()], &[]).await.unwrap();

        assert_eq!(report.sources_ingested, 0);
        assert_eq!(report.chunks_written, 0);
        assert_eq!(report.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_ingested_chunks_immediately_searchable() {
        let dir = tempfile::tempdir().unwrap();
        let chain = chain_with(
            dir.path(),
            Arc::new(StubEmbedder { dimensions: 8 }),
            Arc::new(StubLlm::new()),
        );

        let before = chain.query("topic?").await;
        assert!(before.sources.is_empty());

        let file = temp_txt(&"fresh content just added. ".repeat(10));
        chain.ingest(&[file.path().to_path_buf()], &[]).await.unwrap();

        // No rebind step: the same chain sees the new chunks at once.
        let after = chain.query("topic?").await;
        assert!(!after.sources.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_same_text_twice_same_count() {
        let content = "a page of identical text for both stores. ".repeat(12);

        let dir_a = tempfile::tempdir().unwrap();
        let chain_a = chain_with(
            dir_a.path(),
            Arc::new(StubEmbedder { dimensions: 8 }),
            Arc::new(StubLlm::new()),
        );
        let dir_b = tempfile::tempdir().unwrap();
        let chain_b = chain_with(
            dir_b.path(),
            Arc::new(StubEmbedder { dimensions: 8 }),
            Arc::new(StubLlm::new()),
        );

        let file_a = temp_txt(&content);
        let file_b = temp_txt(&content);
        let (report_a, _) = chain_a.ingest(&[file_a.path().to_path_buf()], &[]).await.unwrap();
        let (report_b, _) = chain_b.ingest(&[file_b.path().to_path_buf()], &[]).await.unwrap();

        assert_eq!(report_a.chunks_written, report_b.chunks_written);
    }

    #[tokio::test]
    async fn test_long_source_content_truncated_in_result() {
        let dir = tempfile::tempdir().unwrap();
        let chain = RagChain::new(
            Arc::new(SnapshotIndex::open_or_create(dir.path().to_path_buf(), 8).unwrap()),
            Arc::new(StubEmbedder { dimensions: 8 }),
            Arc::new(StubLlm::new()),
            // Chunks up to 600 chars so a stored chunk can exceed the
            // 500-char source display limit.
            DocumentProcessor::new(600, 50).unwrap(),
            GenerateOptions::default(),
            5,
        );

        let long_word_text = "z".repeat(590);
        chain.ingest_text("inline.txt", &long_word_text).await.unwrap();

        let result = chain.query("what is z?").await;
        assert_eq!(result.sources.len(), 1);
        let content = &result.sources[0].content;
        assert!(content.ends_with("..."));
        assert_eq!(content.chars().count(), 503);
    }
}
