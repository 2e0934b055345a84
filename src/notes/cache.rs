//! Caller-owned cache of note batches.
//!
//! Wraps any [`NoteSource`] and memoizes batches per selector for a bounded
//! time. The cache belongs to whoever constructs it; nothing is shared
//! process-wide, and [`CachedNoteSource::refresh`] forces a refetch.

use super::models::NoteBatch;
use super::source::NoteSource;
use crate::error::FetchError;
use crate::CacheConfig;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

pub struct CachedNoteSource {
    inner: Arc<dyn NoteSource>,
    cache: Cache<String, NoteBatch>,
}

impl CachedNoteSource {
    pub fn new(inner: Arc<dyn NoteSource>, config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.ttl_secs))
            .build();
        Self { inner, cache }
    }

    /// Drop the cached batch for `selector` and fetch it again.
    pub async fn refresh(&self, selector: &str) -> Result<NoteBatch, FetchError> {
        self.cache.invalidate(selector).await;
        self.fetch_batch(selector).await
    }

    /// Drop every cached batch.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

#[async_trait]
impl NoteSource for CachedNoteSource {
    async fn fetch_batch(&self, selector: &str) -> Result<NoteBatch, FetchError> {
        if let Some(batch) = self.cache.get(selector).await {
            tracing::debug!(selector, notes = batch.len(), "Note batch cache hit");
            return Ok(batch);
        }

        // Failures are not cached.
        let batch = self.inner.fetch_batch(selector).await?;
        self.cache
            .insert(selector.to_string(), batch.clone())
            .await;
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::{MockNoteSource, NoteRecord};

    fn config() -> CacheConfig {
        CacheConfig {
            ttl_secs: 600,
            max_capacity: 16,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let inner = Arc::new(MockNoteSource::with_batch(
            "db",
            vec![NoteRecord::new("id1", "Title1")],
        ));
        let cached = CachedNoteSource::new(inner.clone(), &config());

        let first = cached.fetch_batch("db").await.unwrap();
        let second = cached.fetch_batch("db").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(inner.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_refresh_refetches() {
        let inner = Arc::new(MockNoteSource::with_batch(
            "db",
            vec![NoteRecord::new("id1", "Title1")],
        ));
        let cached = CachedNoteSource::new(inner.clone(), &config());

        cached.fetch_batch("db").await.unwrap();
        inner
            .set_batch("db", vec![NoteRecord::new("id1", "Renamed")])
            .await;

        // Stale until refreshed
        let stale = cached.fetch_batch("db").await.unwrap();
        assert_eq!(stale.id_to_title.get("id1"), Some("Title1"));

        let fresh = cached.refresh("db").await.unwrap();
        assert_eq!(fresh.id_to_title.get("id1"), Some("Renamed"));
        assert_eq!(inner.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let inner = Arc::new(MockNoteSource::new());
        let cached = CachedNoteSource::new(inner.clone(), &config());

        assert!(cached.fetch_batch("missing").await.is_err());
        assert!(cached.fetch_batch("missing").await.is_err());
        assert_eq!(inner.fetch_count(), 2);
    }
}
