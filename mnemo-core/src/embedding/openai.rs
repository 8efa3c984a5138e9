//! OpenAI embeddings provider

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{MemoryError, Result};

use super::EmbeddingProvider;

const EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// Model input safeguard, in characters
const MAX_INPUT_CHARS: usize = 8191;

/// Remote provider calling the OpenAI embeddings API
///
/// Requests carry a 30 second timeout; a provider failure aborts the write
/// that needed the vector.
pub struct OpenAiEmbedding {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dim: usize,
}

impl OpenAiEmbedding {
    /// # Panics
    ///
    /// Panics only if the TLS backend cannot be initialized at startup.
    #[must_use]
    pub fn new(api_key: String, model: String, dim: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            api_key,
            model,
            dim,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn dimensions(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input: String = if text.chars().count() > MAX_INPUT_CHARS {
            text.chars().take(MAX_INPUT_CHARS).collect()
        } else {
            text.to_string()
        };

        debug!(model = %self.model, chars = input.len(), "requesting embedding");

        let response = self
            .client
            .post(EMBEDDINGS_URL)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "input": input,
            }))
            .send()
            .await
            .map_err(|e| MemoryError::Embedding(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MemoryError::Embedding(format!(
                "provider returned status {status}"
            )));
        }

        let body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| MemoryError::Embedding(format!("invalid response body: {e}")))?;

        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| MemoryError::Embedding("no embedding returned".to_string()))
    }
}

impl std::fmt::Debug for OpenAiEmbedding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedding")
            .field("model", &self.model)
            .field("dim", &self.dim)
            .finish_non_exhaustive()
    }
}
