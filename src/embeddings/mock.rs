//! Deterministic embedding provider for tests.
//!
//! Vectors are derived from a hash of the text, so equal texts embed equally
//! and no model is needed. Texts can be pinned to hand-written vectors when a
//! test needs exact similarities, and the provider can be told to fail or to
//! drop vectors from a batch.

use super::traits::EmbeddingProvider;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Hash-based provider with pinning and failure injection.
///
/// # Example
///
/// ```rust
/// use notes_graph::embeddings::{EmbeddingProvider, MockEmbeddingProvider};
///
/// # tokio_test::block_on(async {
/// let provider = MockEmbeddingProvider::new(384);
/// let embedding = provider.embed_text("hello world").await.unwrap();
/// assert_eq!(embedding.len(), 384);
///
/// let embedding2 = provider.embed_text("hello world").await.unwrap();
/// assert_eq!(embedding, embedding2);
/// # });
/// ```
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
    pinned: HashMap<String, Vec<f32>>,
    drop_last: usize,
    surplus: usize,
    fail_with: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl MockEmbeddingProvider {
    /// Create a new mock provider with the given embedding dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            pinned: HashMap::new(),
            drop_last: 0,
            surplus: 0,
            fail_with: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Return `embedding` verbatim whenever `text` is requested.
    pub fn with_pinned(mut self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.pinned.insert(text.into(), embedding);
        self
    }

    /// Drop the last `n` vectors of every batch response.
    pub fn dropping_last(mut self, n: usize) -> Self {
        self.drop_last = n;
        self
    }

    /// Append `n` unrequested vectors to every non-empty batch response.
    pub fn with_surplus(mut self, n: usize) -> Self {
        self.surplus = n;
        self
    }

    /// Fail every call with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Number of provider calls served (single or batch), shared across clones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Unit-length vector seeded from the text's hash, each component
    /// chained from the previous hash. Stable within a build.
    fn hash_to_embedding(&self, text: &str) -> Vec<f32> {
        let mut state = {
            let mut h = DefaultHasher::new();
            text.hash(&mut h);
            h.finish()
        };

        let mut v: Vec<f32> = (0..self.dimensions)
            .map(|_| {
                let component = (state as f64 / u64::MAX as f64) * 2.0 - 1.0;
                let mut h = DefaultHasher::new();
                state.hash(&mut h);
                state = h.finish();
                component as f32
            })
            .collect();

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }

    fn embedding_for(&self, text: &str) -> Vec<f32> {
        self.pinned
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.hash_to_embedding(text))
    }

    fn check_failure(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(message) => anyhow::bail!("{}", message),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        self.check_failure()?;
        Ok(self.embedding_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.check_failure()?;
        let keep = texts.len().saturating_sub(self.drop_last);
        let mut out: Vec<Vec<f32>> = texts[..keep].iter().map(|t| self.embedding_for(t)).collect();
        if !texts.is_empty() {
            let extra = self.hash_to_embedding("surplus");
            out.extend(std::iter::repeat(extra).take(self.surplus));
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "mock-hash-embedding"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_note_text_same_vector() {
        let provider = MockEmbeddingProvider::new(32);
        let first = provider.embed_text("Weekly reviewPlan the week").await.unwrap();
        let again = provider.embed_text("Weekly reviewPlan the week").await.unwrap();
        let other = provider.embed_text("GroceriesMilk and eggs").await.unwrap();
        assert_eq!(first, again);
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn test_vectors_have_unit_norm() {
        let provider = MockEmbeddingProvider::new(384);
        let v = provider.embed_text("any note").await.unwrap();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm = {}", norm);
    }

    #[tokio::test]
    async fn test_batch_matches_single_calls() {
        let provider = MockEmbeddingProvider::new(16);
        let texts: Vec<String> = ["one", "two", "three"].iter().map(|s| s.to_string()).collect();
        let batch = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(batch.len(), texts.len());
        for (text, vector) in texts.iter().zip(&batch) {
            assert_eq!(&provider.embed_text(text).await.unwrap(), vector);
        }
        assert_eq!(provider.call_count(), 4);
    }

    #[tokio::test]
    async fn test_pinned_embedding_wins() {
        let provider = MockEmbeddingProvider::new(3).with_pinned("a", vec![1.0, 0.0, 0.0]);
        assert_eq!(provider.embed_text("a").await.unwrap(), vec![1.0, 0.0, 0.0]);
        assert_eq!(provider.embed_text("b").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_dropping_last() {
        let provider = MockEmbeddingProvider::new(8).dropping_last(1);
        let texts = vec!["a".to_string(), "b".to_string()];
        assert_eq!(provider.embed_batch(&texts).await.unwrap().len(), 1);
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_with_surplus() {
        let provider = MockEmbeddingProvider::new(8).with_surplus(2);
        let texts = vec!["a".to_string()];
        assert_eq!(provider.embed_batch(&texts).await.unwrap().len(), 3);
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing() {
        let provider = MockEmbeddingProvider::new(8).failing("model offline");
        let err = provider.embed_text("x").await.unwrap_err();
        assert_eq!(err.to_string(), "model offline");
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn test_model_name_and_dimensions() {
        let provider = MockEmbeddingProvider::new(512);
        assert_eq!(provider.model_name(), "mock-hash-embedding");
        assert_eq!(provider.dimensions(), 512);
    }
}
