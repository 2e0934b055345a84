//! Error taxonomy for graph construction and rendering.
//!
//! Each collaborator boundary has its own error type:
//!
//! - [`DataShapeError`] — malformed records from a note source. Tolerated by
//!   omission: sources log and drop the record, builders never see it.
//! - [`EmbeddingError`] — embedding provider failure or inconsistent output.
//!   Fatal for `build_graph`.
//! - [`LayoutError`] — the layout engine rejected its options, diverged, or
//!   returned the wrong number of positions.
//! - [`RenderError`] — the artifact could not be written. No partial file is
//!   left at the destination.
//! - [`FetchError`] — the note source could not deliver a batch.
//!
//! [`Error`] wraps all of them for APIs that span several stages.

use std::path::PathBuf;
use thiserror::Error;

/// A note record that cannot be turned into a [`NoteRecord`](crate::notes::NoteRecord).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataShapeError {
    #[error("record has no id")]
    MissingId,

    #[error("record {id} has no title")]
    MissingTitle { id: String },
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider '{model}' failed")]
    Provider {
        model: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("embedding provider returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },

    #[error("embedding {index} has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("invalid layout option {name} = {value}")]
    InvalidOption { name: &'static str, value: f64 },

    #[error("layout diverged at iteration {iteration}")]
    Diverged { iteration: usize },

    #[error("layout produced {actual} positions for {expected} nodes")]
    PositionCount { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("destination directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("failed to write graph artifact to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move graph artifact into place at {}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("note source request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("note source returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode note source response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("database not found: {0}")]
    DatabaseNotFound(String),
}

/// Crate-level error spanning every stage of the pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

pub type Result<T> = std::result::Result<T, Error>;
