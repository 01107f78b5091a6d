//! VectorStore trait — abstract interface for the vector database.
//!
//! The RAG pipeline talks to storage only through this trait; the primary
//! implementation is `QdrantStore` in the `qdrant` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("network error reaching vector store: {0}")]
    Network(String),
    #[error("vector store returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed vector store response: {0}")]
    MalformedResponse(String),
}

/// A point ready for upsert. Ids are derived deterministically by the
/// caller so re-ingesting a document overwrites instead of duplicating.
#[derive(Debug, Clone, Serialize)]
pub struct StoredPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointPayload {
    pub source: String,
    pub text: String,
    pub ingested_at: String,
}

/// Retrieval output: chunk texts in score order plus the distinct source
/// ids they came from.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub contexts: Vec<String>,
    pub sources: Vec<String>,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite points.
    async fn upsert(&self, points: Vec<StoredPoint>) -> Result<(), StoreError>;

    /// Nearest-neighbor search for the `top_k` most similar chunks.
    async fn search(&self, query_vector: &[f32], top_k: usize)
        -> Result<SearchResult, StoreError>;

    /// Distinct source ids present in the collection.
    async fn list_sources(&self) -> Result<Vec<String>, StoreError>;

    /// Remove every point belonging to a source. Returns how many points
    /// were removed.
    async fn delete_source(&self, source_id: &str) -> Result<usize, StoreError>;

    /// Total number of stored points.
    async fn count(&self) -> Result<usize, StoreError>;
}
