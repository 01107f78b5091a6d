//! The ingest and query pipelines.
//!
//! Ingestion: normalize + chunk, embed every chunk, upsert (chunk text,
//! vector, source) points under deterministic ids.
//! Query: embed the question, retrieve the most similar chunks, ask the
//! chat model to synthesize an answer from them.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::chunker::Chunker;
use super::store::{PointPayload, StoredPoint, VectorStore};
use crate::config::{AnswerConfig, EmbeddingConfig};
use crate::core::errors::ApiError;
use crate::extract;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

const SYSTEM_PROMPT: &str = "You answer questions based on provided context.";

pub struct RagEngine {
    chunker: Chunker,
    provider: Arc<dyn LlmProvider>,
    store: Arc<dyn VectorStore>,
    embedding: EmbeddingConfig,
    answer: AnswerConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestStats {
    pub source_id: String,
    pub chunks: usize,
    pub ingested: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<String>,
    pub num_contexts: usize,
}

impl RagEngine {
    pub fn new(
        chunker: Chunker,
        provider: Arc<dyn LlmProvider>,
        store: Arc<dyn VectorStore>,
        embedding: EmbeddingConfig,
        answer: AnswerConfig,
    ) -> Self {
        Self {
            chunker,
            provider,
            store,
            embedding,
            answer,
        }
    }

    /// Ingest raw text under the given source id.
    ///
    /// A document that normalizes to nothing produces zero chunks and skips
    /// the embed/upsert steps entirely.
    pub async fn ingest(&self, text: &str, source_id: &str) -> Result<IngestStats, ApiError> {
        let chunks = self.chunker.split(text);
        tracing::info!(source = source_id, chunks = chunks.len(), "chunked document");

        if chunks.is_empty() {
            return Ok(IngestStats {
                source_id: source_id.to_string(),
                chunks: 0,
                ingested: 0,
            });
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self
            .provider
            .embed(&texts, &self.embedding.model_name)
            .await?;
        for vector in &vectors {
            if vector.len() != self.embedding.embedding_dimension {
                return Err(ApiError::Upstream(format!(
                    "provider returned {}-dimensional vector, expected {}",
                    vector.len(),
                    self.embedding.embedding_dimension
                )));
            }
        }

        let ingested_at = Utc::now().to_rfc3339();
        let points: Vec<StoredPoint> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| StoredPoint {
                id: point_id(source_id, chunk.index),
                vector,
                payload: PointPayload {
                    source: source_id.to_string(),
                    text: chunk.text.clone(),
                    ingested_at: ingested_at.clone(),
                },
            })
            .collect();

        let ingested = points.len();
        self.store.upsert(points).await?;
        tracing::info!(source = source_id, ingested, "embedded and upserted chunks");

        Ok(IngestStats {
            source_id: source_id.to_string(),
            chunks: chunks.len(),
            ingested,
        })
    }

    /// Extract text from a local PDF and ingest it.
    pub async fn ingest_pdf(&self, path: &str, source_id: &str) -> Result<IngestStats, ApiError> {
        let text = extract::extract_pdf_text(path).await?;
        self.ingest(&text, source_id).await
    }

    /// Answer a question from the `top_k` most similar stored chunks.
    pub async fn query(&self, question: &str, top_k: usize) -> Result<QueryResult, ApiError> {
        let query_vector = self
            .provider
            .embed(&[question.to_string()], &self.embedding.model_name)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Upstream("provider returned no query vector".to_string()))?;

        let found = self.store.search(&query_vector, top_k).await?;
        tracing::info!(
            contexts = found.contexts.len(),
            sources = found.sources.len(),
            "retrieved contexts"
        );

        let request = ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(question, &found.contexts)),
        ])
        .with_temperature(self.answer.temperature)
        .with_max_tokens(self.answer.max_tokens);

        let answer = self.provider.chat(request, &self.answer.model_name).await?;

        Ok(QueryResult {
            answer,
            num_contexts: found.contexts.len(),
            sources: found.sources,
        })
    }
}

/// Stable point id for a chunk: UUIDv5 over `{source_id}_{index}`, so
/// repeated ingestion of the same document overwrites its points.
pub fn point_id(source_id: &str, chunk_index: usize) -> String {
    let name = format!("{source_id}_{chunk_index}");
    Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes()).to_string()
}

fn build_user_prompt(question: &str, contexts: &[String]) -> String {
    let context_block = contexts
        .iter()
        .map(|c| format!("- {c}"))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "Use the following context to answer the question.\n\n\
         Context:\n{context_block}\n\n\
         Question: {question}\n\n\
         Answer concisely using the context above."
    )
}
