//! Note records and the sources that supply them.
//!
//! Architecture follows the project pattern (trait + impl + mock):
//! - [`NoteSource`] trait: async interface returning a [`NoteBatch`]
//! - [`NotionSource`]: Notion database query API
//! - [`MockNoteSource`]: in-memory batches for tests
//! - [`CachedNoteSource`]: caller-owned TTL cache around any source

pub mod cache;
pub mod mock;
pub mod models;
pub mod notion;
pub mod source;

pub use cache::CachedNoteSource;
pub use mock::MockNoteSource;
pub use models::{IdTitleMap, NoteBatch, NoteRecord};
pub use notion::{DatabaseInfo, NotionConfig, NotionSource};
pub use source::NoteSource;
