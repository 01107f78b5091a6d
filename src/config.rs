//! Process configuration.
//!
//! Everything is read from the environment exactly once at startup via
//! [`AppConfig::from_env`], validated, and then passed by reference to the
//! components that need it. No component reads environment variables on its
//! own after boot.

use std::env;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no embedding provider credentials: set OPENROUTER_API_KEY or OPENAI_API_KEY")]
    MissingApiKey,
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub embedding: EmbeddingConfig,
    pub answer: AnswerConfig,
    pub qdrant: QdrantConfig,
    pub chunking: ChunkingConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub port: u16,
    pub log_dir: String,
}

/// Connection details for the embedding provider (OpenAI-compatible).
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model_name: String,
    pub embedding_dimension: usize,
}

/// Chat-completion settings for answer synthesis.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerConfig {
    pub model_name: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QdrantConfig {
    pub url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub collection: String,
    pub retry: RetryPolicy,
}

/// Backoff policy applied at connection establishment only, never per
/// request. Delay before attempt `n` is `base_delay_ms * multiplier^(n-1)`.
#[derive(Debug, Clone, Serialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff_multiplier: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 500,
            backoff_multiplier: 2.0,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl AppConfig {
    /// Build the configuration from the process environment.
    ///
    /// Provider selection mirrors the deployment convention: an OpenRouter
    /// key routes everything through OpenRouter, otherwise a plain OpenAI
    /// key is used. `EMBED_BASE_URL` / `EMBED_MODEL` override either.
    pub fn from_env() -> Result<Self, ConfigError> {
        let (default_base_url, default_embed_model, api_key) =
            match env::var("OPENROUTER_API_KEY") {
                Ok(key) if !key.trim().is_empty() => (
                    "https://openrouter.ai/api/v1",
                    "openai/text-embedding-3-small",
                    key,
                ),
                _ => {
                    let key = env::var("OPENAI_API_KEY")
                        .ok()
                        .filter(|k| !k.trim().is_empty())
                        .ok_or(ConfigError::MissingApiKey)?;
                    ("https://api.openai.com/v1", "text-embedding-3-small", key)
                }
            };

        let config = Self {
            server: ServerConfig {
                port: parse_env("PORT", 8000)?,
                log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            },
            embedding: EmbeddingConfig {
                base_url: env::var("EMBED_BASE_URL")
                    .unwrap_or_else(|_| default_base_url.to_string()),
                api_key,
                model_name: env::var("EMBED_MODEL")
                    .unwrap_or_else(|_| default_embed_model.to_string()),
                embedding_dimension: parse_env("EMBED_DIM", 1536)?,
            },
            answer: AnswerConfig {
                model_name: env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                max_tokens: parse_env("ANSWER_MAX_TOKENS", 1024)?,
                temperature: parse_env("ANSWER_TEMPERATURE", 0.2)?,
            },
            qdrant: QdrantConfig {
                url: env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6333".to_string()),
                api_key: env::var("QDRANT_API_KEY").ok().filter(|k| !k.is_empty()),
                collection: env::var("QDRANT_COLLECTION").unwrap_or_else(|_| "docs".to_string()),
                retry: RetryPolicy {
                    max_attempts: parse_env("QDRANT_CONNECT_ATTEMPTS", 5)?,
                    base_delay_ms: parse_env("QDRANT_CONNECT_BASE_DELAY_MS", 500)?,
                    backoff_multiplier: parse_env("QDRANT_CONNECT_BACKOFF", 2.0)?,
                },
            },
            chunking: ChunkingConfig {
                chunk_size: parse_env("CHUNK_SIZE", 1000)?,
                chunk_overlap: parse_env("CHUNK_OVERLAP", 200)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                key: "CHUNK_SIZE",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::Invalid {
                key: "CHUNK_OVERLAP",
                reason: format!(
                    "{} must be strictly less than chunk size {}",
                    self.chunking.chunk_overlap, self.chunking.chunk_size
                ),
            });
        }
        if self.embedding.embedding_dimension == 0 {
            return Err(ConfigError::Invalid {
                key: "EMBED_DIM",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.qdrant.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "QDRANT_CONNECT_ATTEMPTS",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.qdrant.retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::Invalid {
                key: "QDRANT_CONNECT_BACKOFF",
                reason: "must be at least 1.0".to_string(),
            });
        }
        Ok(())
    }
}

impl RetryPolicy {
    /// Delay to sleep after the given 0-based failed attempt.
    pub fn delay_after(&self, attempt: u32) -> std::time::Duration {
        let ms = self.base_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        std::time::Duration::from_millis(ms as u64)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
