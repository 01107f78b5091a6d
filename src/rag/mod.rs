//! RAG (Retrieval-Augmented Generation) module.
//!
//! This module provides:
//! - `Chunker`: splits documents into overlapping, size-bounded chunks
//! - `VectorStore` / `QdrantStore`: vector persistence and similarity search
//! - `RagEngine`: the ingest and query pipelines on top of both

pub mod chunker;
pub mod engine;
pub mod qdrant;
pub mod store;

pub use chunker::{Chunk, Chunker, ChunkerError};
pub use engine::{IngestStats, QueryResult, RagEngine};
pub use qdrant::QdrantStore;
pub use store::{SearchResult, StoreError, VectorStore};
