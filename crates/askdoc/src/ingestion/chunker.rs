//! Recursive text chunking with configurable size and overlap

use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Error, Result};

/// Boundary levels tried from coarsest to finest. A piece is only split at
/// the next level down when it still exceeds the chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Paragraph,
    Line,
    Sentence,
    Word,
    Character,
}

const BOUNDARIES: [Boundary; 5] = [
    Boundary::Paragraph,
    Boundary::Line,
    Boundary::Sentence,
    Boundary::Word,
    Boundary::Character,
];

/// Text chunker with configurable size and overlap.
///
/// `split` is a pure function of `(text, chunk_size, overlap)`: no I/O,
/// deterministic output. Every emitted chunk is at most `chunk_size`
/// characters because the final boundary level splits per character.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between adjacent chunks in characters
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker.
    ///
    /// Rejects `overlap >= chunk_size`: that configuration never advances
    /// past the first chunk and would degenerate into an unbounded split.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".to_string()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Split text into chunks of at most `chunk_size` characters, adjacent
    /// chunks sharing up to `overlap` characters of boundary-aware context.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        if text.chars().count() <= self.chunk_size {
            return vec![text.trim().to_string()];
        }

        let pieces = self.decompose(text, 0);
        self.merge(pieces)
    }

    /// Break text into pieces no larger than `chunk_size`, descending
    /// boundary levels only where a piece is still too large.
    fn decompose(&self, text: &str, level: usize) -> Vec<String> {
        let mut out = Vec::new();
        for piece in split_at(text, BOUNDARIES[level]) {
            if piece.chars().count() > self.chunk_size && level + 1 < BOUNDARIES.len() {
                out.extend(self.decompose(&piece, level + 1));
            } else {
                out.push(piece);
            }
        }
        out
    }

    /// Greedily merge pieces into chunks, carrying an overlap tail of whole
    /// pieces from each emitted chunk into the next.
    fn merge(&self, pieces: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: std::collections::VecDeque<(String, usize)> =
            std::collections::VecDeque::new();
        let mut current_len = 0usize;

        for piece in pieces {
            let piece_len = piece.chars().count();

            if current_len + piece_len > self.chunk_size && !current.is_empty() {
                let chunk = join_pieces(&current);
                if !chunk.is_empty() {
                    chunks.push(chunk);
                }

                // Drop leading pieces until what remains fits as overlap
                // and leaves room for the incoming piece.
                while current_len > self.overlap
                    || (current_len + piece_len > self.chunk_size && current_len > 0)
                {
                    if let Some((_, dropped)) = current.pop_front() {
                        current_len -= dropped;
                    } else {
                        break;
                    }
                }
            }

            current.push_back((piece, piece_len));
            current_len += piece_len;
        }

        let chunk = join_pieces(&current);
        if !chunk.is_empty() {
            chunks.push(chunk);
        }

        chunks
    }
}

fn join_pieces(pieces: &std::collections::VecDeque<(String, usize)>) -> String {
    pieces
        .iter()
        .map(|(p, _)| p.as_str())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Split text at one boundary level, keeping separators attached so the
/// concatenation of pieces reproduces the input.
fn split_at(text: &str, boundary: Boundary) -> Vec<String> {
    match boundary {
        Boundary::Paragraph => split_keep(text, "\n\n"),
        Boundary::Line => split_keep(text, "\n"),
        Boundary::Sentence => text.split_sentence_bounds().map(str::to_string).collect(),
        Boundary::Word => text.split_word_bounds().map(str::to_string).collect(),
        Boundary::Character => text.chars().map(String::from).collect(),
    }
}

fn split_keep(text: &str, sep: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(idx) = rest.find(sep) {
        let end = idx + sep.len();
        out.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        out.push(rest.to_string());
    }
    out
}
