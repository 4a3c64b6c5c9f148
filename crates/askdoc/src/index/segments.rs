//! Segment-backed vector index: append-only files, incrementally persisted

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::types::Chunk;

use super::{rank, validate_add, IndexEntry, ScoredChunk, VectorIndex};

/// Vector index persisted as numbered JSON-lines segment files.
///
/// Each `add` writes one new immutable segment, so earlier writes are never
/// touched again. `open_or_create` replays segments in name order; a corrupt
/// segment is skipped with a warning rather than failing the load.
pub struct SegmentIndex {
    dir: PathBuf,
    dimensions: usize,
    entries: RwLock<Vec<IndexEntry>>,
    next_segment: RwLock<u64>,
}

impl SegmentIndex {
    /// Replay the segments at `dir`, or start empty if there are none.
    /// Only directory creation failure is fatal.
    pub fn open_or_create(dir: PathBuf, dimensions: usize) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::index(format!("cannot create {}: {}", dir.display(), e)))?;

        let mut segment_paths: Vec<PathBuf> = std::fs::read_dir(&dir)
            .map_err(|e| Error::index(format!("cannot read {}: {}", dir.display(), e)))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "jsonl"))
            .collect();
        segment_paths.sort();

        let mut entries = Vec::new();
        let mut next_segment = 0u64;
        for path in &segment_paths {
            match Self::load_segment(path, dimensions) {
                Ok(segment_entries) => entries.extend(segment_entries),
                Err(e) => {
                    tracing::warn!("Skipping corrupt segment {}: {}", path.display(), e);
                }
            }
            if let Some(number) = segment_number(path) {
                next_segment = next_segment.max(number + 1);
            }
        }

        tracing::info!(
            "Opened segment index at {} ({} segments, {} vectors)",
            dir.display(),
            segment_paths.len(),
            entries.len()
        );

        Ok(Self {
            dir,
            dimensions,
            entries: RwLock::new(entries),
            next_segment: RwLock::new(next_segment),
        })
    }

    fn load_segment(path: &Path, dimensions: usize) -> Result<Vec<IndexEntry>> {
        let content = std::fs::read_to_string(path)?;
        let mut entries = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            let entry: IndexEntry = serde_json::from_str(line)?;
            if entry.vector.len() != dimensions {
                return Err(Error::index(format!(
                    "segment entry has {} dimensions, configuration expects {}",
                    entry.vector.len(),
                    dimensions
                )));
            }
            entries.push(entry);
        }
        Ok(entries)
    }

    fn write_segment(&self, entries: &[IndexEntry]) -> Result<()> {
        let number = {
            let mut next = self.next_segment.write();
            let number = *next;
            *next += 1;
            number
        };
        let path = self.dir.join(format!("seg-{:08}.jsonl", number));

        let mut lines = String::new();
        for entry in entries {
            lines.push_str(&serde_json::to_string(entry)?);
            lines.push('\n');
        }

        std::fs::write(&path, lines)
            .map_err(|e| Error::index(format!("cannot write {}: {}", path.display(), e)))
    }
}

#[async_trait]
impl VectorIndex for SegmentIndex {
    async fn add(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()> {
        validate_add(chunks, vectors, self.dimensions)?;
        if chunks.is_empty() {
            return Ok(());
        }

        let new_entries: Vec<IndexEntry> = chunks
            .iter()
            .zip(vectors.iter())
            .map(|(chunk, vector)| IndexEntry {
                chunk: chunk.clone(),
                vector: vector.clone(),
            })
            .collect();

        // Persist first, then publish to the in-memory view.
        self.write_segment(&new_entries)?;
        self.entries.write().extend(new_entries);
        Ok(())
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
        "segments"
    }
}

fn segment_number(path: &Path) -> Option<u64> {
    path.file_stem()?
        .to_str()?
        .strip_prefix("seg-")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Document, FileType};

    fn make_chunk(content: &str) -> Chunk {
        let doc = Document::new("test.txt".to_string(), FileType::Txt);
        Chunk::new(&doc, content.to_string(), 0)
    }

    fn index_in(dir: &Path) -> SegmentIndex {
        SegmentIndex::open_or_create(dir.to_path_buf(), 3).unwrap()
    }

    fn segment_count(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "jsonl"))
            .count()
    }

    #[tokio::test]
    async fn test_each_add_appends_one_segment() {
        let dir = tempfile::tempdir().unwrap();
        let index = index_in(dir.path());

        index
            .add(&[make_chunk("first")], &[vec![1.0, 0.0, 0.0]])
            .await
            .unwrap();
        index
            .add(&[make_chunk("second")], &[vec![0.0, 1.0, 0.0]])
            .await
            .unwrap();

        assert_eq!(segment_count(dir.path()), 2);
        assert_eq!(index.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_segments_replay_on_open() {
        let dir = tempfile::tempdir().unwrap();

        {
            let index = index_in(dir.path());
            index
                .add(&[make_chunk("alpha")], &[vec![1.0, 0.0, 0.0]])
                .await
                .unwrap();
            index
                .add(&[make_chunk("beta")], &[vec![0.0, 1.0, 0.0]])
                .await
                .unwrap();
        }

        let reopened = index_in(dir.path());
        assert_eq!(reopened.len().await.unwrap(), 2);

        let results = reopened.search(&[0.0, 1.0, 0.0], 1).await.unwrap();
        assert_eq!(results[0].chunk.content, "beta");
    }

    #[tokio::test]
    async fn test_new_segments_continue_numbering_after_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let index = index_in(dir.path());
            index
                .add(&[make_chunk("one")], &[vec![1.0, 0.0, 0.0]])
                .await
                .unwrap();
        }

        let reopened = index_in(dir.path());
        reopened
            .add(&[make_chunk("two")], &[vec![0.0, 1.0, 0.0]])
            .await
            .unwrap();

        assert_eq!(segment_count(dir.path()), 2);
        assert_eq!(reopened.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_segment_skipped_with_others_loaded() {
        let dir = tempfile::tempdir().unwrap();

        {
            let index = index_in(dir.path());
            index
                .add(&[make_chunk("good")], &[vec![1.0, 0.0, 0.0]])
                .await
                .unwrap();
        }
        std::fs::write(dir.path().join("seg-99999999.jsonl"), "garbage\n").unwrap();

        let reopened = index_in(dir.path());
        assert_eq!(reopened.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mismatched_lengths_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let index = index_in(dir.path());

        let err = index
            .add(&[make_chunk("one"), make_chunk("two")], &[vec![1.0, 0.0, 0.0]])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Index(_)));
    }
}
