//! Property tests for chunk span invariants.

use architect_rag::chunking::{BoundaryChunker, Chunker, WindowChunker};
use architect_rag::document::{Chunk, Document};
use proptest::prelude::*;

fn arb_text() -> impl Strategy<Value = String> {
    // Mix of prose-like runs, newlines, and the occasional multi-byte char.
    proptest::collection::vec(
        prop_oneof![
            8 => "[a-z]{1,10}",
            2 => Just(" ".to_string()),
            1 => Just(". ".to_string()),
            1 => Just("\n".to_string()),
            1 => Just("\n\n".to_string()),
            1 => Just("é".to_string()),
        ],
        0..200,
    )
    .prop_map(|parts| parts.concat())
}

/// Assert the span invariants shared by every chunker:
/// - each chunk's text is exactly the document slice at its span
/// - no chunk exceeds `chunk_size`
/// - spans are contiguous-with-overlap and cover the whole document
/// - sequence numbers and ids are consistent
fn assert_span_invariants(document: &Document, chunks: &[Chunk], chunk_size: usize) {
    if document.text.is_empty() {
        assert!(chunks.is_empty());
        return;
    }
    assert!(!chunks.is_empty());
    assert_eq!(chunks[0].start, 0);
    assert_eq!(chunks.last().unwrap().end, document.text.len());

    let mut frontier = 0;
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.seq, i);
        assert_eq!(chunk.id, format!("{}#{i}", document.source_id));
        assert_eq!(chunk.text, &document.text[chunk.start..chunk.end]);
        assert!(chunk.end - chunk.start <= chunk_size, "chunk {i} exceeds chunk_size");
        // The next chunk may start inside the previous one (overlap) but
        // never beyond it — no gap in coverage.
        assert!(chunk.start <= frontier, "gap before chunk {i}");
        assert!(chunk.end >= frontier);
        frontier = chunk.end;
    }
}

/// Concatenating each chunk's non-overlapping suffix reconstructs the
/// original document.
fn assert_reconstruction(document: &Document, chunks: &[Chunk]) {
    let mut rebuilt = String::new();
    let mut frontier = 0;
    for chunk in chunks {
        let from = frontier.max(chunk.start);
        rebuilt.push_str(&document.text[from..chunk.end]);
        frontier = chunk.end;
    }
    assert_eq!(rebuilt, document.text);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// For any document and any valid size/overlap, the window chunker's
    /// spans cover the document exactly once outside overlaps and no chunk
    /// exceeds the configured maximum length.
    #[test]
    fn window_chunker_spans_cover_document(
        text in arb_text(),
        chunk_size in 16usize..300,
        overlap_ratio in 0usize..50,
    ) {
        let overlap = chunk_size * overlap_ratio / 100;
        let document = Document::new("doc/prop", text);
        let chunks = WindowChunker::new(chunk_size, overlap).chunk(&document);
        assert_span_invariants(&document, &chunks, chunk_size);
        assert_reconstruction(&document, &chunks);
    }

    /// Same invariants for the boundary-preferring chunker.
    #[test]
    fn boundary_chunker_spans_cover_document(
        text in arb_text(),
        chunk_size in 16usize..300,
        overlap_ratio in 0usize..50,
    ) {
        let overlap = chunk_size * overlap_ratio / 100;
        let document = Document::new("doc/prop", text);
        let chunks = BoundaryChunker::new(chunk_size, overlap).chunk(&document);
        assert_span_invariants(&document, &chunks, chunk_size);
        assert_reconstruction(&document, &chunks);
    }

    /// Chunking is deterministic: the same document always splits the same way.
    #[test]
    fn chunking_is_deterministic(text in arb_text()) {
        let document = Document::new("doc/prop", text);
        let chunker = BoundaryChunker::new(120, 24);
        prop_assert_eq!(chunker.chunk(&document), chunker.chunk(&document));
    }
}

#[test]
fn empty_document_yields_no_chunks() {
    let document = Document::new("doc/empty", "");
    assert!(BoundaryChunker::new(100, 20).chunk(&document).is_empty());
    assert!(WindowChunker::new(100, 20).chunk(&document).is_empty());
}

#[test]
fn boundary_chunker_prefers_sentence_breaks() {
    let text = "The challenge period is 7 days. Withdrawals finalize after it. \
                The batch submission frequency must be a multiple of 12.";
    let document = Document::new("doc/faq", text);
    let chunks = BoundaryChunker::new(70, 10).chunk(&document);

    assert!(chunks.len() > 1);
    // The first cut lands after a sentence, not mid-word.
    assert!(chunks[0].text.ends_with(". "), "got {:?}", chunks[0].text);
}

#[test]
fn single_chunk_document_stays_whole() {
    let text = "The challenge period is 7 days.";
    let document = Document::new("doc/faq", text);
    let chunks = BoundaryChunker::new(800, 120).chunk(&document);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, text);
    assert_eq!((chunks[0].start, chunks[0].end), (0, text.len()));
}
