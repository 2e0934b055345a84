//! Embeddings over HTTP.
//!
//! Talks to any endpoint speaking the OpenAI `/v1/embeddings` format:
//! Ollama (`http://localhost:11434/v1/embeddings`, model `all-minilm`),
//! OpenAI itself, LiteLLM, vLLM.

use super::traits::EmbeddingProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Some providers cap the number of inputs per request.
const BATCH_SIZE: usize = 50;

/// Client for an OpenAI-compatible embeddings endpoint. Clones share the
/// underlying connection pool.
#[derive(Clone)]
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl HttpEmbeddingProvider {
    /// `dimensions` is the vector length the model is expected to return;
    /// responses with any other length are rejected. `api_key`, when set, is
    /// sent as a bearer token.
    pub fn new(
        url: String,
        model: String,
        api_key: Option<String>,
        dimensions: usize,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url,
            model,
            api_key,
            dimensions,
        })
    }

    /// One POST for `input`; vectors come back in input order.
    async fn request_embeddings(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input,
        };
        let request = match &self.api_key {
            Some(key) => self.client.post(&self.url).bearer_auth(key),
            None => self.client.post(&self.url),
        };

        let response = request
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Embedding endpoint {} unreachable", self.url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or(text);
            anyhow::bail!("Embedding API error ({}): {}", status.as_u16(), message);
        }

        let mut data = response
            .json::<EmbeddingResponse>()
            .await
            .context("Embedding API response is not valid JSON")?
            .data;
        data.sort_by_key(|d| d.index);

        if let Some((index, bad)) = data
            .iter()
            .enumerate()
            .find(|(_, d)| d.embedding.len() != self.dimensions)
        {
            anyhow::bail!(
                "{} returned a vector with dimension mismatch at {}: {} instead of {}",
                self.model,
                index,
                bad.embedding.len(),
                self.dimensions
            );
        }

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request_embeddings(&[text.to_string()]).await?;
        vectors
            .pop()
            .context("Embedding API returned no vector")
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            let chunk_vectors = self.request_embeddings(chunk).await?;
            if chunk_vectors.len() != chunk.len() {
                anyhow::bail!(
                    "{} returned {} vectors for a chunk of {} texts",
                    self.model,
                    chunk_vectors.len(),
                    chunk.len()
                );
            }
            vectors.extend(chunk_vectors);
        }
        tracing::debug!(
            texts = texts.len(),
            requests = texts.len().div_ceil(BATCH_SIZE),
            model = %self.model,
            "Embedded batch over HTTP"
        );
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
