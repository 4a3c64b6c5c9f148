//! Core data types for documents, chunks, queries, and responses

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, ChunkMetadata, Document, FileType};
pub use query::QueryRequest;
pub use response::{IngestFailure, IngestReport, QueryResult, SourceRef};
