//! In-memory note source for tests.

use super::models::{NoteBatch, NoteRecord};
use super::source::NoteSource;
use crate::error::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Mock implementation of `NoteSource`.
///
/// Serves pre-seeded batches keyed by selector and counts fetches, so cache
/// tests can tell hits from misses.
#[derive(Default)]
pub struct MockNoteSource {
    pub batches: RwLock<HashMap<String, NoteBatch>>,
    fetches: AtomicUsize,
}

impl MockNoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source serving a single batch under `selector`.
    pub fn with_batch(selector: &str, notes: Vec<NoteRecord>) -> Self {
        let mut batches = HashMap::new();
        batches.insert(selector.to_string(), NoteBatch::new(notes));
        Self {
            batches: RwLock::new(batches),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Replace (or add) the batch served under `selector`.
    pub async fn set_batch(&self, selector: &str, notes: Vec<NoteRecord>) {
        self.batches
            .write()
            .await
            .insert(selector.to_string(), NoteBatch::new(notes));
    }

    /// Number of `fetch_batch` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NoteSource for MockNoteSource {
    async fn fetch_batch(&self, selector: &str) -> Result<NoteBatch, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.batches
            .read()
            .await
            .get(selector)
            .cloned()
            .ok_or_else(|| FetchError::DatabaseNotFound(selector.to_string()))
    }
}
