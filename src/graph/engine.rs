//! Notes graph engine: orchestrates the full pipeline.
//!
//! ```text
//! NoteSource ──► NoteBatch ──► RelationGraphBuilder ───┐
//!                        └───► CorrelationGraphBuilder ─┴──► HtmlRenderer ──► file
//!                                     │
//!                             EmbeddingProvider
//! ```
//!
//! The engine owns its collaborators as trait objects so tests can swap in
//! [`MockNoteSource`](crate::notes::MockNoteSource) and
//! [`MockEmbeddingProvider`](crate::embeddings::MockEmbeddingProvider).

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::builder::GraphBuilder;
use super::correlation::{CorrelationGraphBuilder, CorrelationOptions};
use super::models::{CorrelationGraph, GraphKind, NoteGraph, RelationGraph};
use super::relation::{RelationGraphBuilder, RelationOptions};
use crate::embeddings::{self, CachedEmbeddingProvider, EmbeddingProvider};
use crate::error::Result;
use crate::notes::{CachedNoteSource, NoteBatch, NoteSource, NotionSource};
use crate::render::LayoutOptions;
use crate::Config;

// ============================================================================
// Output type
// ============================================================================

/// What a [`NotesGraphEngine::draw`] call produced.
#[derive(Debug, Clone, Serialize)]
pub struct DrawSummary {
    pub kind: GraphKind,
    pub notes: usize,
    pub nodes: usize,
    pub edges: usize,
    /// Where the HTML artifact was written
    pub path: PathBuf,
    pub computed_at: DateTime<Utc>,
}

// ============================================================================
// Engine
// ============================================================================

pub struct NotesGraphEngine {
    source: Arc<dyn NoteSource>,
    embedder: Arc<dyn EmbeddingProvider>,
    correlation: CorrelationOptions,
    layout: LayoutOptions,
}

impl NotesGraphEngine {
    /// Create an engine with default correlation and layout options.
    pub fn new(source: Arc<dyn NoteSource>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            source,
            embedder,
            correlation: CorrelationOptions::default(),
            layout: LayoutOptions::default(),
        }
    }

    pub fn with_correlation(mut self, options: CorrelationOptions) -> Self {
        self.correlation = options;
        self
    }

    pub fn with_layout(mut self, options: LayoutOptions) -> Self {
        self.layout = options;
        self
    }

    /// Wire up a Notion source and the configured embedding provider, both
    /// behind caches when `config.cache.enabled` is set.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let source: Arc<dyn NoteSource> = Arc::new(NotionSource::new(config.notion.clone())?);
        let embedder = embeddings::from_config(&config.embedding)?;

        let (source, embedder): (Arc<dyn NoteSource>, Arc<dyn EmbeddingProvider>) =
            if config.cache.enabled {
                (
                    Arc::new(CachedNoteSource::new(source, &config.cache)),
                    Arc::new(CachedEmbeddingProvider::new(embedder, &config.cache)),
                )
            } else {
                (source, embedder)
            };

        Ok(Self::new(source, embedder)
            .with_correlation(config.correlation)
            .with_layout(config.layout))
    }

    pub fn correlation_options(&self) -> &CorrelationOptions {
        &self.correlation
    }

    pub fn layout_options(&self) -> &LayoutOptions {
        &self.layout
    }

    async fn fetch(&self, selector: &str) -> Result<NoteBatch> {
        let batch = self.source.fetch_batch(selector).await?;
        tracing::info!(
            selector,
            notes = batch.len(),
            "Fetched note batch"
        );
        Ok(batch)
    }

    /// Fetch `selector` and build its relation graph.
    pub async fn relation_graph(&self, selector: &str) -> Result<RelationGraph> {
        let builder = RelationGraphBuilder::from_batch(self.fetch(selector).await?);
        builder.build_graph(&RelationOptions).await
    }

    /// Fetch `selector` and build its correlation graph.
    pub async fn correlation_graph(&self, selector: &str) -> Result<CorrelationGraph> {
        let builder =
            CorrelationGraphBuilder::from_batch(self.fetch(selector).await?, self.embedder.clone());
        builder.build_graph(&self.correlation).await
    }

    /// Fetch, build and render one graph.
    ///
    /// Nothing is written unless every stage succeeds.
    pub async fn draw(
        &self,
        kind: GraphKind,
        selector: &str,
        destination: &Path,
    ) -> Result<DrawSummary> {
        let batch = self.fetch(selector).await?;
        let notes = batch.len();

        let (nodes, edges) = match kind {
            GraphKind::Relations => {
                let builder = RelationGraphBuilder::from_batch(batch);
                self.build_and_render(&builder, &RelationOptions, destination)
                    .await?
            }
            GraphKind::Correlations => {
                let builder = CorrelationGraphBuilder::from_batch(batch, self.embedder.clone());
                self.build_and_render(&builder, &self.correlation, destination)
                    .await?
            }
        };

        tracing::info!(
            %kind,
            selector,
            notes,
            nodes,
            edges,
            path = %destination.display(),
            "Notes graph drawn"
        );

        Ok(DrawSummary {
            kind,
            notes,
            nodes,
            edges,
            path: destination.to_path_buf(),
            computed_at: Utc::now(),
        })
    }

    /// Draw every [`GraphKind`] into `dir` under its default file name.
    pub async fn draw_all(&self, selector: &str, dir: &Path) -> Result<Vec<DrawSummary>> {
        let mut summaries = Vec::with_capacity(GraphKind::ALL.len());
        for kind in GraphKind::ALL {
            let path = dir.join(kind.default_file_name());
            summaries.push(self.draw(kind, selector, &path).await?);
        }
        Ok(summaries)
    }

    async fn build_and_render<B: GraphBuilder>(
        &self,
        builder: &B,
        options: &B::Options,
        destination: &Path,
    ) -> Result<(usize, usize)> {
        let graph: NoteGraph<B::Kind> = builder.build_graph(options).await?;
        builder.render(&graph, destination, &self.layout)?;
        Ok((graph.node_count(), graph.edge_count()))
    }
}

// ============================================================================
// Tests
// ============================================================================
