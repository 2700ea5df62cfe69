//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`BoundaryChunker`] — prefers paragraph and sentence boundaries, falling
//!   back to fixed character windows (the default for documentation)
//! - [`WindowChunker`] — plain fixed-size character windows with overlap
//!
//! Both track the byte span of each chunk within its document, so that the
//! chunk sequence covers the document exactly once outside the overlaps.

use crate::document::{Chunk, Document};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and span offsets but no
/// embeddings; embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text. Each returned
    /// chunk has an empty embedding vector.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Walk `idx` back to the nearest UTF-8 character boundary.
fn snap_back(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn make_chunk(document: &Document, seq: usize, start: usize, end: usize) -> Chunk {
    Chunk {
        id: format!("{}#{seq}", document.source_id),
        source_id: document.source_id.clone(),
        seq,
        start,
        end,
        text: document.text[start..end].to_string(),
        embedding: Vec::new(),
    }
}

/// Shared chunking loop: `pick_end` chooses where the current chunk ends
/// given `(start, hard_end)`; the next chunk starts `overlap` bytes before
/// that end, snapped to a character boundary.
fn chunk_spans<F>(document: &Document, chunk_size: usize, overlap: usize, pick_end: F) -> Vec<Chunk>
where
    F: Fn(&str, usize, usize) -> usize,
{
    let text = &document.text;
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut seq = 0;

    while start < text.len() {
        let hard_end = snap_back(text, (start + chunk_size).min(text.len()));
        let end = if hard_end >= text.len() {
            text.len()
        } else {
            pick_end(text, start, hard_end)
        };
        // A pathological chunk_size smaller than one character: take one char.
        let end = if end <= start {
            text[start..].chars().next().map(|c| start + c.len_utf8()).unwrap_or(text.len())
        } else {
            end
        };

        chunks.push(make_chunk(document, seq, start, end));
        if end >= text.len() {
            break;
        }
        seq += 1;

        let mut next = snap_back(text, end.saturating_sub(overlap));
        if next <= start {
            // Overlap would stall the scan; continue without it.
            next = end;
        }
        start = next;
    }

    chunks
}

/// Splits text into fixed-size chunks by character count with configurable
/// overlap.
///
/// # Example
///
/// ```rust,ignore
/// use architect_rag::WindowChunker;
///
/// let chunker = WindowChunker::new(800, 120);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct WindowChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl WindowChunker {
    /// Create a new `WindowChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of bytes per chunk
    /// * `chunk_overlap` — bytes shared between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for WindowChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        chunk_spans(document, self.chunk_size, self.chunk_overlap, |_, _, hard_end| hard_end)
    }
}

/// Splits text on paragraph and sentence boundaries where possible, falling
/// back to fixed character windows.
///
/// Within each window the chunker looks backwards from the size limit for a
/// paragraph break, then a sentence break, then a word break, and only cuts
/// mid-word when no boundary lands in the second half of the window — so a
/// fact spanning a boundary still appears intact in at least one chunk.
///
/// # Example
///
/// ```rust,ignore
/// use architect_rag::BoundaryChunker;
///
/// let chunker = BoundaryChunker::new(800, 120);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct BoundaryChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl BoundaryChunker {
    /// Create a new `BoundaryChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of bytes per chunk
    /// * `chunk_overlap` — bytes shared between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

/// Find the best break position in `text[start..hard_end]`, preferring
/// paragraph, then sentence, then word boundaries. A break is only accepted
/// in the second half of the window; otherwise the hard limit wins.
fn find_break(text: &str, start: usize, hard_end: usize) -> usize {
    let window = &text[start..hard_end];
    let min_cut = window.len() / 2;

    for sep in ["\n\n", ". ", "! ", "? ", "\n", " "] {
        if let Some(pos) = window.rfind(sep) {
            let cut = pos + sep.len();
            if cut > min_cut {
                return start + cut;
            }
        }
    }

    hard_end
}

impl Chunker for BoundaryChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        chunk_spans(document, self.chunk_size, self.chunk_overlap, find_break)
    }
}
