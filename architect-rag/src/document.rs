//! Data types for documents, chunks, and search results.

use serde::{Deserialize, Serialize};

/// A source document: a stable identifier plus raw text content.
///
/// The `source_id` is whatever the ingestion boundary uses to name the
/// document (a URL, a logical path). Re-ingesting a document with the same
/// `source_id` replaces all chunks previously derived from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Stable identifier for the document source.
    pub source_id: String,
    /// Optional human-readable title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// The text content of the document.
    pub text: String,
}

impl Document {
    /// Create a new document from a source identifier and text.
    pub fn new(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { source_id: source_id.into(), title: None, text: text.into() }
    }

    /// Attach a human-readable title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A contiguous slice of a [`Document`] with its vector embedding.
///
/// `start..end` is the byte span of `text` within the parent document,
/// snapped to UTF-8 character boundaries. Consecutive chunks from the same
/// document overlap by the configured overlap; outside those overlaps the
/// spans cover the document exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier, `{source_id}#{seq}`.
    pub id: String,
    /// The parent document's source identifier.
    pub source_id: String,
    /// Position of this chunk within the document's chunk sequence.
    pub seq: usize,
    /// Byte offset of the chunk's first character in the document.
    pub start: usize,
    /// Byte offset one past the chunk's last character in the document.
    pub end: usize,
    /// The text content of the chunk.
    pub text: String,
    /// The embedding vector for this chunk's text. Empty until embedded.
    pub embedding: Vec<f32>,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query (higher is more relevant).
    pub score: f32,
}
