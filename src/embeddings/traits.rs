//! The text → vector seam used by the correlation graph.

use anyhow::Result;
use async_trait::async_trait;

/// Maps note text to fixed-length vectors.
///
/// Shared between builders as `Arc<dyn EmbeddingProvider>`. The model is
/// fixed when the provider is constructed.
///
/// Implemented by [`FastEmbedProvider`](super::FastEmbedProvider),
/// [`HttpEmbeddingProvider`](super::HttpEmbeddingProvider),
/// [`MockEmbeddingProvider`](super::MockEmbeddingProvider) and the
/// [`CachedEmbeddingProvider`](super::CachedEmbeddingProvider) wrapper.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;

    /// One vector per text, in input order.
    ///
    /// A failure anywhere fails the whole batch. Callers still check the
    /// returned count, since remote endpoints have been seen to drop inputs.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Length of every vector this provider returns.
    fn dimensions(&self) -> usize;

    /// Model identifier, used in logs and error messages.
    fn model_name(&self) -> &str;
}
