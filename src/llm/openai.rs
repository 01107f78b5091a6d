use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::{LlmProvider, ProviderError};
use super::types::ChatRequest;
use crate::config::EmbeddingConfig;

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Client for an OpenAI-compatible API (OpenAI, OpenRouter, or any gateway
/// speaking the same wire format).
///
/// Constructed once from configuration at startup and shared; holds no
/// ambient state beyond the connection pool.
#[derive(Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    client: Client,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    pub fn new(config: &EmbeddingConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
        }
    }

    async fn check_status(res: Response) -> Result<Response, ProviderError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let message = res.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Auth,
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
            _ => ProviderError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    fn transport(err: reqwest::Error) -> ProviderError {
        ProviderError::Network(err.to_string())
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let res = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await;
        match res {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn embed(
        &self,
        inputs: &[String],
        model_id: &str,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        let url = format!("{}/embeddings", self.base_url);

        let body = json!({
            "model": model_id,
            "input": inputs,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::transport)?;
        let res = Self::check_status(res).await?;

        let payload: EmbeddingsResponse = res
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let vectors: Vec<Vec<f32>> = payload.data.into_iter().map(|item| item.embedding).collect();
        if vectors.len() != inputs.len() {
            return Err(ProviderError::MalformedResponse(format!(
                "expected {} embedding vectors, got {}",
                inputs.len(),
                vectors.len()
            )));
        }

        Ok(vectors)
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = json!({
            "model": model_id,
            "messages": request.messages,
            "stream": false,
        });
        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(t) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(t));
            }
        }

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::transport)?;
        let res = Self::check_status(res).await?;

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                ProviderError::MalformedResponse("chat response has no message content".to_string())
            })?;

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ChatMessage;

    fn test_config(base_url: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            base_url: base_url.to_string(),
            api_key: "test-key".to_string(),
            model_name: "text-embedding-3-small".to_string(),
            embedding_dimension: 1536,
        }
    }

    #[test]
    fn trailing_slash_is_stripped_from_base_url() {
        let provider = OpenAiProvider::new(&test_config("https://openrouter.ai/api/v1/"));
        assert_eq!(provider.base_url, "https://openrouter.ai/api/v1");
    }

    #[tokio::test]
    async fn unreachable_provider_reports_network_error() {
        // Nothing listens on this port; the connection is refused immediately.
        let provider = OpenAiProvider::new(&test_config("http://127.0.0.1:9/v1"));
        let err = provider
            .embed(&["hello".to_string()], "text-embedding-3-small")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    #[ignore]
    async fn live_embed_and_chat_roundtrip() {
        let api_key = match std::env::var("OPENROUTER_API_KEY") {
            Ok(key) => key,
            Err(_) => panic!("OPENROUTER_API_KEY required for live test"),
        };
        let provider = OpenAiProvider::new(&EmbeddingConfig {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key,
            model_name: "openai/text-embedding-3-small".to_string(),
            embedding_dimension: 1536,
        });

        let vectors = provider
            .embed(&["hello world".to_string()], "openai/text-embedding-3-small")
            .await
            .expect("embedding call failed");
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].len(), 1536);

        let req = ChatRequest::new(vec![ChatMessage::user("Say hi")]).with_max_tokens(10);
        let answer = provider.chat(req, "gpt-4o-mini").await.expect("chat call failed");
        println!("chat answer: {answer}");
    }
}
