//! SQLite vector index backend.
//!
//! Provides [`SqliteVectorIndex`], a durable on-disk [`VectorIndex`] using
//! [sqlx](https://docs.rs/sqlx) with the SQLite driver. The database runs in
//! WAL mode so ingestion writes and query reads interleave safely: writes
//! are serialized through transactions, readers never observe a half-written
//! replace.
//!
//! Embeddings are stored as little-endian `f32` BLOBs. An `index_meta` row
//! pins the embedding dimension on first write; similarity is computed in
//! process over the candidate rows.

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::index::{VectorIndex, cosine_similarity, rank};

/// A durable [`VectorIndex`] backed by a single SQLite database file.
///
/// # Example
///
/// ```rust,ignore
/// use architect_rag::SqliteVectorIndex;
///
/// let index = SqliteVectorIndex::open("data/index.db").await?;
/// index.replace("docs/deploy", &chunks).await?;
/// ```
pub struct SqliteVectorIndex {
    pool: SqlitePool,
}

impl SqliteVectorIndex {
    /// Open (or create) the index database at the given path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(Self::map_err)?;

        let index = Self { pool };
        index.init_schema().await?;
        Ok(index)
    }

    /// Create an index from an existing pool (tests, shared connections).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let index = Self { pool };
        index.init_schema().await?;
        Ok(index)
    }

    fn map_err(e: sqlx::Error) -> RagError {
        RagError::IndexUnavailable { backend: "sqlite".to_string(), message: e.to_string() }
    }

    fn corrupted(message: impl Into<String>) -> RagError {
        RagError::IndexUnavailable { backend: "sqlite".to_string(), message: message.into() }
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chunks (\
                id TEXT PRIMARY KEY, \
                source_id TEXT NOT NULL, \
                seq INTEGER NOT NULL, \
                start_offset INTEGER NOT NULL, \
                end_offset INTEGER NOT NULL, \
                text TEXT NOT NULL, \
                embedding BLOB NOT NULL\
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(Self::map_err)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS chunks_source_idx ON chunks(source_id)")
            .execute(&self.pool)
            .await
            .map_err(Self::map_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS index_meta (\
                key TEXT PRIMARY KEY, \
                value TEXT NOT NULL\
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(Self::map_err)?;

        Ok(())
    }

    async fn stored_dimensions(&self) -> Result<Option<usize>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM index_meta WHERE key = 'dimensions'")
                .fetch_optional(&self.pool)
                .await
                .map_err(Self::map_err)?;

        match value {
            None => Ok(None),
            Some(v) => v
                .parse::<usize>()
                .map(Some)
                .map_err(|_| Self::corrupted(format!("invalid dimension metadata: {v:?}"))),
        }
    }
}

/// Encode an embedding as a little-endian `f32` BLOB.
fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode a little-endian `f32` BLOB, checking the expected dimension.
fn decode_embedding(bytes: &[u8], dimensions: usize) -> Result<Vec<f32>> {
    if bytes.len() != dimensions * 4 {
        return Err(SqliteVectorIndex::corrupted(format!(
            "embedding blob has {} bytes, expected {}",
            bytes.len(),
            dimensions * 4
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    async fn replace(&self, source_id: &str, chunks: &[Chunk]) -> Result<()> {
        // Validate dimensions up front so the transaction never has to roll
        // back a partially validated batch.
        if let Some(first) = chunks.first() {
            let incoming = first.embedding.len();
            if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != incoming) {
                return Err(RagError::DimensionMismatch {
                    expected: incoming,
                    actual: bad.embedding.len(),
                });
            }
            if let Some(stored) = self.stored_dimensions().await? {
                if stored != incoming {
                    return Err(RagError::DimensionMismatch {
                        expected: stored,
                        actual: incoming,
                    });
                }
            }
        }

        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;

        sqlx::query("DELETE FROM chunks WHERE source_id = ?")
            .bind(source_id)
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?;

        for chunk in chunks {
            sqlx::query(
                "INSERT INTO chunks (id, source_id, seq, start_offset, end_offset, text, embedding) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&chunk.id)
            .bind(&chunk.source_id)
            .bind(chunk.seq as i64)
            .bind(chunk.start as i64)
            .bind(chunk.end as i64)
            .bind(&chunk.text)
            .bind(encode_embedding(&chunk.embedding))
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?;
        }

        if let Some(first) = chunks.first() {
            sqlx::query(
                "INSERT INTO index_meta (key, value) VALUES ('dimensions', ?) \
                 ON CONFLICT (key) DO UPDATE SET value = excluded.value",
            )
            .bind(first.embedding.len().to_string())
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?;
        }

        tx.commit().await.map_err(Self::map_err)?;

        debug!(source_id, count = chunks.len(), "replaced source chunks in sqlite index");
        Ok(())
    }

    async fn delete(&self, source_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM chunks WHERE source_id = ?")
            .bind(source_id)
            .execute(&self.pool)
            .await
            .map_err(Self::map_err)?;

        debug!(source_id, "deleted source chunks from sqlite index");
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let Some(expected) = self.stored_dimensions().await? else {
            return Ok(Vec::new());
        };
        if embedding.len() != expected {
            return Err(RagError::DimensionMismatch { expected, actual: embedding.len() });
        }

        // rowid ordering gives deterministic insertion-order tie-breaking.
        let rows = sqlx::query(
            "SELECT id, source_id, seq, start_offset, end_offset, text, embedding \
             FROM chunks ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Self::map_err)?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in rows {
            let blob: Vec<u8> = row.try_get("embedding").map_err(Self::map_err)?;
            let stored = decode_embedding(&blob, expected)?;
            let chunk = Chunk {
                id: row.try_get("id").map_err(Self::map_err)?,
                source_id: row.try_get("source_id").map_err(Self::map_err)?,
                seq: row.try_get::<i64, _>("seq").map_err(Self::map_err)? as usize,
                start: row.try_get::<i64, _>("start_offset").map_err(Self::map_err)? as usize,
                end: row.try_get::<i64, _>("end_offset").map_err(Self::map_err)? as usize,
                text: row.try_get("text").map_err(Self::map_err)?,
                embedding: stored,
            };
            let score = cosine_similarity(&chunk.embedding, embedding);
            scored.push(SearchResult { chunk, score });
        }

        Ok(rank(scored, top_k, min_score))
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(Self::map_err)?;
        Ok(count as usize)
    }

    async fn dimensions(&self) -> Result<Option<usize>> {
        self.stored_dimensions().await
    }
}
