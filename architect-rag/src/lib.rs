//! Retrieval core for Rollup Architect.
//!
//! This crate implements the retrieval half of the assistant: splitting
//! documentation into overlapping chunks, embedding them through a
//! configurable provider, storing the vectors in a durable index, and
//! answering similarity queries at serving time.
//!
//! The moving parts compose through three traits — [`Chunker`],
//! [`EmbeddingProvider`], and [`VectorIndex`] — wired together by
//! [`RagPipeline`]. The provider is selected once at process start via
//! [`EmbeddingProviderConfig`]; because stored vectors are only comparable
//! to vectors from the same provider, changing it requires re-ingestion.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod gateway;
pub mod index;
pub mod inmemory;
pub mod local;
pub mod openai;
pub mod pipeline;
pub mod sqlite;

pub use chunking::{BoundaryChunker, Chunker, WindowChunker};
pub use config::{EmbeddingProviderConfig, RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use gateway::GatewayEmbeddingProvider;
pub use index::VectorIndex;
pub use inmemory::InMemoryVectorIndex;
pub use local::LocalEmbeddingProvider;
pub use openai::OpenAiEmbeddingProvider;
pub use pipeline::{IndexStats, RagPipeline, RagPipelineBuilder, expand_query};
pub use sqlite::SqliteVectorIndex;
