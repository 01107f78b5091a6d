use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::{LlmProvider, OpenAiProvider};
use crate::rag::{Chunker, QdrantStore, RagEngine, VectorStore};

pub mod error;

use error::InitializationError;

/// Global application state shared across all routes.
///
/// Contains the configuration, the embedding/chat provider client, the
/// vector store connection and the RAG engine built on top of them.
pub struct AppState {
    pub config: AppConfig,
    pub provider: Arc<dyn LlmProvider>,
    pub store: Arc<dyn VectorStore>,
    pub engine: RagEngine,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// This process includes:
    /// 1. Validating chunking parameters
    /// 2. Constructing the provider client from configuration
    /// 3. Connecting to Qdrant and ensuring the collection (with the
    ///    configured retry/backoff policy)
    pub async fn initialize(config: AppConfig) -> Result<Arc<Self>, InitializationError> {
        let chunker = Chunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)
            .map_err(|e| InitializationError::Config(e.into()))?;

        let provider: Arc<dyn LlmProvider> = Arc::new(OpenAiProvider::new(&config.embedding));

        let store: Arc<dyn VectorStore> = Arc::new(
            QdrantStore::connect(&config.qdrant, config.embedding.embedding_dimension)
                .await
                .map_err(|e| InitializationError::VectorStore(e.into()))?,
        );

        let engine = RagEngine::new(
            chunker,
            provider.clone(),
            store.clone(),
            config.embedding.clone(),
            config.answer.clone(),
        );

        Ok(Arc::new(AppState {
            config,
            provider,
            store,
            engine,
        }))
    }
}
