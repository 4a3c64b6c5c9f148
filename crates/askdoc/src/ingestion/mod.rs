//! Document ingestion: loading, chunking, and per-source processing

mod chunker;
mod loader;
mod processor;

pub use chunker::TextChunker;
pub use loader::{DocxLoader, PdfLoader, TxtLoader, WebLoader};
pub use processor::DocumentProcessor;
