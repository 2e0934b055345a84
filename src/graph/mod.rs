//! Notes graph construction.
//!
//! Turns a batch of notes into one of two graphs:
//!
//! ```text
//! NoteBatch ──► RelationGraphBuilder ────► RelationGraph (directed, child links)
//!          └──► CorrelationGraphBuilder ─► CorrelationGraph (undirected, similarity > cutoff)
//!                     │
//!              EmbeddingProvider ──► SimilarityMatrix ──► stack ──► filter_links
//! ```
//!
//! ## Modules
//!
//! - [`models`] — `NoteGraph`, `NoteEdge`, `GraphKind`
//! - [`builder`] — the `GraphBuilder` trait shared by both builders
//! - [`relation`] — `RelationGraphBuilder`
//! - [`similarity`] — cosine similarity, `SimilarityMatrix`, `filter_links`
//! - [`correlation`] — `CorrelationGraphBuilder`
//! - [`engine`] — `NotesGraphEngine`, fetch → build → render

pub mod builder;
pub mod correlation;
pub mod engine;
pub mod models;
pub mod relation;
pub mod similarity;

pub use builder::GraphBuilder;
pub use correlation::{CorrelationGraphBuilder, CorrelationOptions};
pub use engine::{DrawSummary, NotesGraphEngine};
pub use models::{CorrelationGraph, GraphKind, NoteEdge, NoteGraph, RelationGraph};
pub use relation::{RelationGraphBuilder, RelationOptions};
pub use similarity::{cosine_similarity, filter_links, EdgeCandidate, SimilarityMatrix};
