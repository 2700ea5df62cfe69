//! Ranking and lifecycle tests for the vector index backends.

use architect_rag::document::Chunk;
use architect_rag::index::VectorIndex;
use architect_rag::inmemory::InMemoryVectorIndex;
use architect_rag::sqlite::SqliteVectorIndex;
use architect_rag::RagError;
use proptest::prelude::*;

fn chunk(source_id: &str, seq: usize, text: &str, embedding: Vec<f32>) -> Chunk {
    Chunk {
        id: format!("{source_id}#{seq}"),
        source_id: source_id.to_string(),
        seq,
        start: 0,
        end: text.len(),
        text: text.to_string(),
        embedding,
    }
}

/// The shared contract every backend must satisfy.
async fn ranking_follows_cosine_similarity(index: &dyn VectorIndex) {
    index
        .replace(
            "docs/a",
            &[
                chunk("docs/a", 0, "orthogonal", vec![0.0, 1.0]),
                chunk("docs/a", 1, "exact", vec![1.0, 0.0]),
                chunk("docs/a", 2, "close", vec![0.6, 0.8]),
            ],
        )
        .await
        .unwrap();

    let results = index.query(&[1.0, 0.0], 3, -1.0).await.unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.chunk.id.as_str()).collect();
    assert_eq!(ids, ["docs/a#1", "docs/a#2", "docs/a#0"]);
    assert!((results[0].score - 1.0).abs() < 1e-5);
    assert!((results[1].score - 0.6).abs() < 1e-5);
    assert!(results[2].score.abs() < 1e-5);
}

async fn min_score_filters_below_threshold(index: &dyn VectorIndex) {
    index
        .replace(
            "docs/a",
            &[
                chunk("docs/a", 0, "exact", vec![1.0, 0.0]),
                chunk("docs/a", 1, "weak", vec![0.0, 1.0]),
            ],
        )
        .await
        .unwrap();

    // k is not filled, yet the weak match stays out.
    let results = index.query(&[1.0, 0.0], 5, 0.5).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.id, "docs/a#0");
}

async fn ties_break_by_insertion_order(index: &dyn VectorIndex) {
    index
        .replace(
            "docs/a",
            &[
                chunk("docs/a", 0, "first", vec![1.0, 0.0]),
                chunk("docs/a", 1, "second", vec![1.0, 0.0]),
            ],
        )
        .await
        .unwrap();
    index.replace("docs/b", &[chunk("docs/b", 0, "third", vec![1.0, 0.0])]).await.unwrap();

    let results = index.query(&[1.0, 0.0], 3, -1.0).await.unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.chunk.id.as_str()).collect();
    assert_eq!(ids, ["docs/a#0", "docs/a#1", "docs/b#0"]);
}

async fn replace_is_atomic_and_idempotent(index: &dyn VectorIndex) {
    let chunks = [
        chunk("docs/a", 0, "one", vec![1.0, 0.0]),
        chunk("docs/a", 1, "two", vec![0.0, 1.0]),
    ];
    index.replace("docs/a", &chunks).await.unwrap();
    index.replace("docs/a", &chunks).await.unwrap();
    assert_eq!(index.count().await.unwrap(), 2);

    // Replacing with fewer chunks leaves no orphans behind.
    index.replace("docs/a", &chunks[..1]).await.unwrap();
    assert_eq!(index.count().await.unwrap(), 1);

    // An empty replace clears the source.
    index.replace("docs/a", &[]).await.unwrap();
    assert_eq!(index.count().await.unwrap(), 0);
}

async fn delete_removes_only_that_source(index: &dyn VectorIndex) {
    index.replace("docs/a", &[chunk("docs/a", 0, "a", vec![1.0, 0.0])]).await.unwrap();
    index.replace("docs/b", &[chunk("docs/b", 0, "b", vec![0.0, 1.0])]).await.unwrap();

    index.delete("docs/a").await.unwrap();
    index.delete("docs/unknown").await.unwrap();

    let results = index.query(&[0.0, 1.0], 10, -1.0).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].chunk.source_id, "docs/b");
}

async fn empty_index_returns_empty_result(index: &dyn VectorIndex) {
    let results = index.query(&[1.0, 0.0], 5, 0.0).await.unwrap();
    assert!(results.is_empty());
    assert_eq!(index.count().await.unwrap(), 0);
    assert_eq!(index.dimensions().await.unwrap(), None);
}

async fn dimension_mismatch_is_rejected(index: &dyn VectorIndex) {
    index.replace("docs/a", &[chunk("docs/a", 0, "a", vec![1.0, 0.0])]).await.unwrap();

    let err = index.query(&[1.0, 0.0, 0.0], 5, 0.0).await.unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { expected: 2, actual: 3 }));

    let err = index
        .replace("docs/b", &[chunk("docs/b", 0, "b", vec![1.0, 0.0, 0.0])])
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { expected: 2, actual: 3 }));

    // The failed replace must not have touched the index.
    assert_eq!(index.count().await.unwrap(), 1);
}

macro_rules! backend_tests {
    ($mod_name:ident, $make:expr) => {
        mod $mod_name {
            use super::*;

            #[tokio::test]
            async fn ranking() {
                ranking_follows_cosine_similarity(&$make.await).await;
            }

            #[tokio::test]
            async fn min_score() {
                min_score_filters_below_threshold(&$make.await).await;
            }

            #[tokio::test]
            async fn tie_break() {
                ties_break_by_insertion_order(&$make.await).await;
            }

            #[tokio::test]
            async fn replace() {
                replace_is_atomic_and_idempotent(&$make.await).await;
            }

            #[tokio::test]
            async fn delete() {
                delete_removes_only_that_source(&$make.await).await;
            }

            #[tokio::test]
            async fn empty() {
                empty_index_returns_empty_result(&$make.await).await;
            }

            #[tokio::test]
            async fn dimension_mismatch() {
                dimension_mismatch_is_rejected(&$make.await).await;
            }
        }
    };
}

async fn make_inmemory() -> InMemoryVectorIndex {
    InMemoryVectorIndex::new()
}

async fn make_sqlite() -> SqliteVectorIndex {
    let dir = tempfile::tempdir().unwrap();
    // Keep the tempdir alive for the test's duration by leaking it; each
    // test process cleans up with the OS temp dir.
    let path = dir.keep().join("index.db");
    SqliteVectorIndex::open(path).await.unwrap()
}

backend_tests!(inmemory, make_inmemory());
backend_tests!(sqlite, make_sqlite());

#[tokio::test]
async fn sqlite_index_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.db");

    {
        let index = SqliteVectorIndex::open(&path).await.unwrap();
        index
            .replace(
                "docs/a",
                &[
                    chunk("docs/a", 0, "exact", vec![1.0, 0.0]),
                    chunk("docs/a", 1, "close", vec![0.6, 0.8]),
                ],
            )
            .await
            .unwrap();
    }

    let reopened = SqliteVectorIndex::open(&path).await.unwrap();
    assert_eq!(reopened.count().await.unwrap(), 2);
    assert_eq!(reopened.dimensions().await.unwrap(), Some(2));

    let results = reopened.query(&[1.0, 0.0], 1, 0.0).await.unwrap();
    assert_eq!(results[0].chunk.text, "exact");
}

/// *For any* set of stored chunks, searching returns results ordered by
/// descending cosine similarity, bounded by `top_k`, with nothing below the
/// threshold.
mod prop_search_ordering {
    use super::*;

    const DIM: usize = 16;

    fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
        proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
            "non-zero embedding",
            |mut v| {
                let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm < 1e-6 {
                    return None;
                }
                for val in &mut v {
                    *val /= norm;
                }
                Some(v)
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_bounded_and_thresholded(
            embeddings in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
            min_score in -1.0f32..1.0f32,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let index = InMemoryVectorIndex::new();
                let chunks: Vec<Chunk> = embeddings
                    .iter()
                    .enumerate()
                    .map(|(i, e)| chunk("docs/prop", i, "text", e.clone()))
                    .collect();
                index.replace("docs/prop", &chunks).await.unwrap();
                index.query(&query, top_k, min_score).await.unwrap()
            });

            prop_assert!(results.len() <= top_k);
            for result in &results {
                prop_assert!(result.score >= min_score);
            }
            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }
    }
}
