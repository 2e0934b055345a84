//! NoteSource trait definition
//!
//! Abstract interface over whatever upstream system supplies note records.
//! Same shape as the embedding provider: async trait + Send + Sync so it can
//! be shared as `Arc<dyn NoteSource>`.

use super::models::NoteBatch;
use crate::error::FetchError;
use async_trait::async_trait;

/// Supplies a batch of note records for a collection selector (a database
/// name or id, depending on the implementation).
///
/// # Implementations
///
/// - [`NotionSource`](super::NotionSource): Notion database query API
/// - [`MockNoteSource`](super::MockNoteSource): in-memory batches for tests
/// - [`CachedNoteSource`](super::CachedNoteSource): TTL cache around any source
#[async_trait]
pub trait NoteSource: Send + Sync {
    /// Fetch every note of the selected collection, with its id → title lookup.
    ///
    /// Records that cannot be mapped (missing id or title) are dropped, not
    /// reported as errors.
    async fn fetch_batch(&self, selector: &str) -> Result<NoteBatch, FetchError>;
}
