//! Snapshot-backed vector index: one serialized file, rebuilt on load

use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Chunk;

use super::{rank, validate_add, IndexEntry, ScoredChunk, VectorIndex};

const SNAPSHOT_FILE: &str = "index.json";

#[derive(Serialize, Deserialize)]
struct Snapshot {
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

/// Vector index persisted as a single JSON snapshot.
///
/// Every `add` rewrites the snapshot via a temp-file-and-rename replace, so
/// a crash mid-write leaves the previous snapshot intact.
pub struct SnapshotIndex {
    dir: PathBuf,
    dimensions: usize,
    entries: RwLock<Vec<IndexEntry>>,
}

impl SnapshotIndex {
    /// Load the snapshot at `dir` if present and structurally valid;
    /// otherwise start empty. Only directory creation failure is fatal.
    pub fn open_or_create(dir: PathBuf, dimensions: usize) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::index(format!("cannot create {}: {}", dir.display(), e)))?;

        let path = dir.join(SNAPSHOT_FILE);
        let entries = if path.exists() {
            match Self::load_snapshot(&path, dimensions) {
                Ok(entries) => {
                    tracing::info!(
                        "Loaded snapshot index from {} ({} vectors)",
                        path.display(),
                        entries.len()
                    );
                    entries
                }
                Err(e) => {
                    tracing::warn!(
                        "Could not load snapshot index from {}: {}; starting empty",
                        path.display(),
                        e
                    );
                    Vec::new()
                }
            }
        } else {
            tracing::info!("Creating new snapshot index at {}", path.display());
            Vec::new()
        };

        Ok(Self {
            dir,
            dimensions,
            entries: RwLock::new(entries),
        })
    }

    fn load_snapshot(path: &PathBuf, dimensions: usize) -> Result<Vec<IndexEntry>> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        if snapshot.dimensions != dimensions {
            return Err(Error::index(format!(
                "snapshot has {} dimensions, configuration expects {}",
                snapshot.dimensions, dimensions
            )));
        }
        Ok(snapshot.entries)
    }

    /// Serialize all entries and atomically replace the snapshot file
    fn persist(&self, entries: &[IndexEntry]) -> Result<()> {
        let snapshot = Snapshot {
            dimensions: self.dimensions,
            entries: entries.to_vec(),
        };
        let content = serde_json::to_string(&snapshot)?;

        let path = self.dir.join(SNAPSHOT_FILE);
        let tmp_path = self.dir.join(format!("{}.tmp", SNAPSHOT_FILE));
        std::fs::write(&tmp_path, content)
            .map_err(|e| Error::index(format!("cannot write {}: {}", tmp_path.display(), e)))?;
        std::fs::rename(&tmp_path, &path)
            .map_err(|e| Error::index(format!("cannot replace {}: {}", path.display(), e)))?;
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for SnapshotIndex {
    async fn add(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()> {
        validate_add(chunks, vectors, self.dimensions)?;

        let mut entries = self.entries.write();
        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            entries.push(IndexEntry {
                chunk: chunk.clone(),
                vector: vector.clone(),
            });
        }
        self.persist(&entries)
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let entries = self.entries.read();
        Ok(rank(&entries, query, k))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "snapshot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Document, FileType};

    fn make_chunk(content: &str) -> Chunk {
        let doc = Document::new("test.txt".to_string(), FileType::Txt);
        Chunk::new(&doc, content.to_string(), 0)
    }

    fn index_in(dir: &std::path::Path) -> SnapshotIndex {
        SnapshotIndex::open_or_create(dir.to_path_buf(), 3).unwrap()
    }

    #[tokio::test]
    async fn test_add_then_search_returns_nearest_first() {
        let dir = tempfile::tempdir().unwrap();
        let index = index_in(dir.path());

        let chunks = vec![make_chunk("about cats"), make_chunk("about engines")];
        let vectors = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
        index.add(&chunks, &vectors).await.unwrap();

        let results = index.search(&[0.9, 0.1, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "about cats");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_search_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let index = index_in(dir.path());

        let chunks: Vec<Chunk> = (0..10).map(|i| make_chunk(&format!("chunk {}", i))).collect();
        let vectors: Vec<Vec<f32>> = (0..10)
            .map(|i| vec![i as f32 * 0.1, 1.0 - i as f32 * 0.1, 0.5])
            .collect();
        index.add(&chunks, &vectors).await.unwrap();

        let query = [0.3, 0.3, 0.3];
        let first = index.search(&query, 5).await.unwrap();
        let second = index.search(&query, 5).await.unwrap();

        let first_ids: Vec<_> = first.iter().map(|r| r.chunk.id).collect();
        let second_ids: Vec<_> = second.iter().map(|r| r.chunk.id).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[tokio::test]
    async fn test_mismatched_lengths_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let index = index_in(dir.path());

        let chunks = vec![make_chunk("one"), make_chunk("two")];
        let vectors = vec![vec![1.0, 0.0, 0.0]];
        let err = index.add(&chunks, &vectors).await.unwrap_err();
        assert!(matches!(err, Error::Index(_)));
    }

    #[tokio::test]
    async fn test_wrong_dimensions_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let index = index_in(dir.path());

        let chunks = vec![make_chunk("one")];
        let vectors = vec![vec![1.0, 0.0]]; // index expects 3
        let err = index.add(&chunks, &vectors).await.unwrap_err();
        assert!(matches!(err, Error::Index(_)));
    }

    #[tokio::test]
    async fn test_entries_survive_reload() {
        let dir = tempfile::tempdir().unwrap();

        {
            let index = index_in(dir.path());
            let chunks = vec![make_chunk("persisted")];
            let vectors = vec![vec![1.0, 0.0, 0.0]];
            index.add(&chunks, &vectors).await.unwrap();
        }

        let reloaded = index_in(dir.path());
        assert_eq!(reloaded.len().await.unwrap(), 1);
        let results = reloaded.search(&[1.0, 0.0, 0.0], 1).await.unwrap();
        assert_eq!(results[0].chunk.content, "persisted");
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SNAPSHOT_FILE), "{not valid json").unwrap();

        let index = index_in(dir.path());
        assert!(index.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_on_load_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();

        {
            let index = index_in(dir.path());
            index
                .add(&[make_chunk("old")], &[vec![1.0, 0.0, 0.0]])
                .await
                .unwrap();
        }

        // Reopen with a different dimensionality: the old snapshot must not
        // poison the new configuration.
        let reopened = SnapshotIndex::open_or_create(dir.path().to_path_buf(), 4).unwrap();
        assert!(reopened.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_index_search_returns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let index = index_in(dir.path());
        let results = index.search(&[1.0, 0.0, 0.0], 5).await.unwrap();
        assert!(results.is_empty());
    }
}
