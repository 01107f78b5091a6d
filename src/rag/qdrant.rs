//! Qdrant-backed vector store, speaking the REST API over reqwest.
//!
//! The collection is ensured once at connection time, guarded by the
//! configured retry/backoff policy. Individual requests are single calls
//! with no retry of their own.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};

use super::store::{SearchResult, StoreError, StoredPoint, VectorStore};
use crate::config::QdrantConfig;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const SCROLL_PAGE_SIZE: usize = 256;

#[derive(Debug)]
pub struct QdrantStore {
    base_url: String,
    api_key: Option<String>,
    collection: String,
    client: Client,
}

#[derive(Deserialize)]
struct ExistsEnvelope {
    result: ExistsResult,
}

#[derive(Deserialize)]
struct ExistsResult {
    exists: bool,
}

#[derive(Deserialize)]
struct QueryEnvelope {
    result: QueryPoints,
}

#[derive(Deserialize)]
struct QueryPoints {
    points: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    #[serde(default)]
    payload: Value,
}

#[derive(Deserialize)]
struct ScrollEnvelope {
    result: ScrollResult,
}

#[derive(Deserialize)]
struct ScrollResult {
    points: Vec<ScoredPoint>,
    #[serde(default)]
    next_page_offset: Option<Value>,
}

#[derive(Deserialize)]
struct CountEnvelope {
    result: CountResult,
}

#[derive(Deserialize)]
struct CountResult {
    count: usize,
}

impl QdrantStore {
    /// Connect to Qdrant and make sure the collection exists, retrying with
    /// the configured backoff. This is the only place the retry policy
    /// applies; regular operations are single calls.
    pub async fn connect(config: &QdrantConfig, dimension: usize) -> Result<Self, StoreError> {
        let store = Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            collection: config.collection.clone(),
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| Client::new()),
        };

        let policy = &config.retry;
        let mut attempt = 0u32;
        loop {
            match store.ensure_collection(dimension).await {
                Ok(()) => return Ok(store),
                Err(err) if attempt + 1 < policy.max_attempts => {
                    let delay = policy.delay_after(attempt);
                    tracing::warn!(
                        "Qdrant connection attempt {}/{} failed: {}; retrying in {:?}",
                        attempt + 1,
                        policy.max_attempts,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<(), StoreError> {
        let url = format!("{}/exists", self.collection_url());
        let res = self.send(self.client.get(&url)).await?;
        let envelope: ExistsEnvelope = parse_json(res).await?;
        if envelope.result.exists {
            return Ok(());
        }

        tracing::info!(
            "Creating Qdrant collection `{}` (dim {}, cosine)",
            self.collection,
            dimension
        );
        let body = json!({
            "vectors": { "size": dimension, "distance": "Cosine" }
        });
        self.send(self.client.put(self.collection_url()).json(&body))
            .await?;
        Ok(())
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/collections/{}",
            self.base_url,
            urlencoding::encode(&self.collection)
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let request = match &self.api_key {
            Some(key) => request.header("api-key", key),
            None => request,
        };
        let res = request
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let message = res.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(res)
    }

    async fn count_matching(&self, filter: Option<Value>) -> Result<usize, StoreError> {
        let url = format!("{}/points/count", self.collection_url());
        let mut body = json!({ "exact": true });
        if let Some(filter) = filter {
            body["filter"] = filter;
        }
        let res = self.send(self.client.post(&url).json(&body)).await?;
        let envelope: CountEnvelope = parse_json(res).await?;
        Ok(envelope.result.count)
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn upsert(&self, points: Vec<StoredPoint>) -> Result<(), StoreError> {
        if points.is_empty() {
            return Ok(());
        }
        let url = format!("{}/points?wait=true", self.collection_url());
        let body = json!({ "points": points });
        self.send(self.client.put(&url).json(&body)).await?;
        Ok(())
    }

    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<SearchResult, StoreError> {
        let url = format!("{}/points/query", self.collection_url());
        let body = json!({
            "query": query_vector,
            "limit": top_k,
            "with_payload": true,
        });
        let res = self.send(self.client.post(&url).json(&body)).await?;
        let envelope: QueryEnvelope = parse_json(res).await?;

        let mut contexts = Vec::new();
        let mut sources = Vec::new();
        for point in envelope.result.points {
            let text = point.payload["text"].as_str().unwrap_or("");
            let source = point.payload["source"].as_str().unwrap_or("");
            if text.is_empty() {
                continue;
            }
            contexts.push(text.to_string());
            if !source.is_empty() && !sources.iter().any(|s| s == source) {
                sources.push(source.to_string());
            }
        }

        Ok(SearchResult { contexts, sources })
    }

    async fn list_sources(&self) -> Result<Vec<String>, StoreError> {
        let url = format!("{}/points/scroll", self.collection_url());
        let mut sources: Vec<String> = Vec::new();
        let mut offset: Option<Value> = None;

        loop {
            let mut body = json!({
                "limit": SCROLL_PAGE_SIZE,
                "with_payload": ["source"],
                "with_vector": false,
            });
            if let Some(offset) = &offset {
                body["offset"] = offset.clone();
            }

            let res = self.send(self.client.post(&url).json(&body)).await?;
            let envelope: ScrollEnvelope = parse_json(res).await?;

            for point in envelope.result.points {
                if let Some(source) = point.payload["source"].as_str() {
                    if !source.is_empty() && !sources.iter().any(|s| s == source) {
                        sources.push(source.to_string());
                    }
                }
            }

            match envelope.result.next_page_offset {
                Some(next) if !next.is_null() => offset = Some(next),
                _ => break,
            }
        }

        sources.sort();
        Ok(sources)
    }

    async fn delete_source(&self, source_id: &str) -> Result<usize, StoreError> {
        let filter = source_filter(source_id);
        let removed = self.count_matching(Some(filter.clone())).await?;
        if removed == 0 {
            return Ok(0);
        }

        let url = format!("{}/points/delete?wait=true", self.collection_url());
        let body = json!({ "filter": filter });
        self.send(self.client.post(&url).json(&body)).await?;
        Ok(removed)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.count_matching(None).await
    }
}

fn source_filter(source_id: &str) -> Value {
    json!({
        "must": [
            { "key": "source", "match": { "value": source_id } }
        ]
    })
}

async fn parse_json<T: serde::de::DeserializeOwned>(res: Response) -> Result<T, StoreError> {
    res.json::<T>()
        .await
        .map_err(|e| StoreError::MalformedResponse(e.to_string()))
}
