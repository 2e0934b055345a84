//! Caller-owned embedding cache.
//!
//! Memoizes vectors per text for a bounded time in front of any provider.
//! Only cache misses are sent to the wrapped provider, in one batch, so
//! rebuilding a correlation graph after a few notes changed re-embeds only
//! those notes.

use super::traits::EmbeddingProvider;
use crate::CacheConfig;
use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

pub struct CachedEmbeddingProvider {
    inner: Arc<dyn EmbeddingProvider>,
    cache: Cache<String, Arc<Vec<f32>>>,
}

impl CachedEmbeddingProvider {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.ttl_secs))
            .build();
        Self { inner, cache }
    }

    /// Forget every cached vector; the next request goes to the provider.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Forget the cached vector of one text.
    pub async fn invalidate(&self, text: &str) {
        self.cache.invalidate(text).await;
    }
}

#[async_trait]
impl EmbeddingProvider for CachedEmbeddingProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let mut out = self.embed_batch(&[text.to_string()]).await?;
        out.pop()
            .ok_or_else(|| anyhow::anyhow!("embedding provider returned no vector"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut slots: Vec<Option<Arc<Vec<f32>>>> = Vec::with_capacity(texts.len());
        let mut misses: Vec<String> = Vec::new();

        for text in texts {
            let hit = self.cache.get(text).await;
            if hit.is_none() && !misses.contains(text) {
                misses.push(text.clone());
            }
            slots.push(hit);
        }

        tracing::debug!(
            requested = texts.len(),
            misses = misses.len(),
            model = self.inner.model_name(),
            "Embedding cache lookup"
        );

        if !misses.is_empty() {
            let fresh = self.inner.embed_batch(&misses).await?;
            if fresh.len() != misses.len() {
                // Checked against the misses, not `texts`.
                anyhow::bail!(
                    "{} returned {} vectors for {} uncached texts",
                    self.inner.model_name(),
                    fresh.len(),
                    misses.len()
                );
            }
            for (text, embedding) in misses.into_iter().zip(fresh) {
                self.cache.insert(text, Arc::new(embedding)).await;
            }
        }

        let mut out = Vec::with_capacity(texts.len());
        for (text, slot) in texts.iter().zip(slots) {
            let embedding = match slot {
                Some(e) => e,
                None => self
                    .cache
                    .get(text)
                    .await
                    .ok_or_else(|| anyhow::anyhow!("embedding for '{}' evicted mid-batch", text))?,
            };
            out.push(embedding.as_ref().clone());
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
