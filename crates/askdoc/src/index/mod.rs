//! Pluggable vector index with two persisted backends
//!
//! Both backends satisfy the same contract: `add` persists before
//! returning, `search` is a deterministic cosine ranking, and a corrupt or
//! missing persisted index falls back to an empty one with a warning.
//! The backend is chosen at construction time from configuration.

mod segments;
mod snapshot;

pub use segments::SegmentIndex;
pub use snapshot::SnapshotIndex;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{VectorBackend, VectorDbConfig};
use crate::error::{Error, Result};
use crate::types::Chunk;

/// One stored (chunk, vector) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The chunk
    pub chunk: Chunk,
    /// Its embedding vector
    pub vector: Vec<f32>,
}

/// A retrieved chunk with its similarity score
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The matched chunk
    pub chunk: Chunk,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub score: f32,
}

/// Trait for vector storage and similarity search
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Append chunk/vector pairs and persist before returning.
    ///
    /// Rejects `chunks.len() != vectors.len()` and vectors whose length
    /// differs from the index dimensionality.
    async fn add(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()>;

    /// Return up to `k` nearest neighbors by cosine similarity, descending.
    /// Deterministic for a fixed index snapshot and query vector.
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    /// Total number of stored vectors
    async fn len(&self) -> Result<usize>;

    /// Check if the index holds no vectors
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// The fixed dimensionality this index accepts
    fn dimensions(&self) -> usize;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Open the configured backend, creating its directory if absent.
///
/// Directory creation failure is fatal; a corrupt persisted index is not.
pub fn open_index(config: &VectorDbConfig, dimensions: usize) -> Result<Arc<dyn VectorIndex>> {
    let path = config.root.join(config.backend.sub_path());

    match config.backend {
        VectorBackend::Snapshot => Ok(Arc::new(SnapshotIndex::open_or_create(path, dimensions)?)),
        VectorBackend::Segments => Ok(Arc::new(SegmentIndex::open_or_create(path, dimensions)?)),
    }
}

/// Cosine similarity between two vectors; 0.0 if either has zero magnitude
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Validate an `add` call against the index dimensionality
pub(crate) fn validate_add(
    chunks: &[Chunk],
    vectors: &[Vec<f32>],
    dimensions: usize,
) -> Result<()> {
    if chunks.len() != vectors.len() {
        return Err(Error::index(format!(
            "chunk/vector count mismatch: {} chunks, {} vectors",
            chunks.len(),
            vectors.len()
        )));
    }
    for vector in vectors {
        if vector.len() != dimensions {
            return Err(Error::index(format!(
                "vector has {} dimensions, index expects {}",
                vector.len(),
                dimensions
            )));
        }
    }
    Ok(())
}

/// Rank entries against a query vector: descending score, chunk id as the
/// deterministic tiebreak
pub(crate) fn rank(entries: &[IndexEntry], query: &[f32], k: usize) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = entries
        .iter()
        .map(|entry| ScoredChunk {
            chunk: entry.chunk.clone(),
            score: cosine_similarity(&entry.vector, query),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk.id.cmp(&b.chunk.id))
    });
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
