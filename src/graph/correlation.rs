//! Correlation graph: connects notes whose content is similar.
//!
//! Pipeline, run sequentially on every `build_graph` call:
//!
//! ```text
//! notes ──► embed(title + summary) ──► SimilarityMatrix ──► stack ──► filter(cutoff) ──► graph
//! ```

use async_trait::async_trait;
use petgraph::Undirected;
use serde::Deserialize;
use std::sync::Arc;

use super::builder::GraphBuilder;
use super::models::{CorrelationGraph, NoteEdge};
use super::similarity::{filter_links, EdgeCandidate, SimilarityMatrix};
use crate::embeddings::EmbeddingProvider;
use crate::error::{EmbeddingError, Result};
use crate::notes::{IdTitleMap, NoteBatch, NoteRecord};

pub const DEFAULT_CUTOFF: f64 = 0.5;

/// Options for [`CorrelationGraphBuilder::build_graph`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CorrelationOptions {
    /// Minimum similarity, exclusive. Not range-checked: values above 1 give
    /// an empty graph, values below -1 connect every pair of distinct titles.
    pub cutoff: f64,
}

impl Default for CorrelationOptions {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
        }
    }
}

impl CorrelationOptions {
    pub fn with_cutoff(cutoff: f64) -> Self {
        Self { cutoff }
    }
}

/// Builds an undirected graph linking notes whose embedded text has cosine
/// similarity strictly above the cutoff.
///
/// Nodes are titles. Notes sharing a title collapse into one node and are
/// never linked to each other. Notes with no similar partner are omitted.
pub struct CorrelationGraphBuilder {
    notes: Vec<NoteRecord>,
    id_to_title: IdTitleMap,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl CorrelationGraphBuilder {
    pub fn new(
        notes: Vec<NoteRecord>,
        id_to_title: IdTitleMap,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            notes,
            id_to_title,
            embedder,
        }
    }

    pub fn from_batch(batch: NoteBatch, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::new(batch.notes, batch.id_to_title, embedder)
    }

    /// One vector per note, in note order.
    ///
    /// Fails if the provider fails, returns a different number of vectors
    /// than notes, or returns vectors of differing lengths.
    pub async fn embeddings(&self) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        let texts: Vec<String> = self.notes.iter().map(NoteRecord::embedding_text).collect();

        let embeddings =
            self.embedder
                .embed_batch(&texts)
                .await
                .map_err(|source| EmbeddingError::Provider {
                    model: self.embedder.model_name().to_string(),
                    source,
                })?;

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }

        if let Some(first) = embeddings.first() {
            let expected = first.len();
            if let Some((index, e)) = embeddings
                .iter()
                .enumerate()
                .find(|(_, e)| e.len() != expected)
            {
                return Err(EmbeddingError::DimensionMismatch {
                    index,
                    expected,
                    actual: e.len(),
                });
            }
        }

        Ok(embeddings)
    }

    /// Full pairwise similarity matrix, labelled by title.
    pub async fn correlation_matrix(
        &self,
    ) -> std::result::Result<SimilarityMatrix, EmbeddingError> {
        let embeddings = self.embeddings().await?;
        let titles = self.notes.iter().map(|n| n.title.clone()).collect();
        Ok(SimilarityMatrix::from_embeddings(titles, &embeddings))
    }

    /// Every cell of the similarity matrix as a candidate edge.
    pub async fn links(&self) -> std::result::Result<Vec<EdgeCandidate>, EmbeddingError> {
        Ok(self.correlation_matrix().await?.stack())
    }

    /// Assemble the graph from already filtered candidates.
    pub fn assemble(links: &[EdgeCandidate]) -> CorrelationGraph {
        let mut graph = CorrelationGraph::with_capacity(links.len(), links.len());
        for link in links {
            let edge = link.value.map(NoteEdge::weighted).unwrap_or_default();
            graph.add_edge(&link.var1, &link.var2, edge);
        }
        graph
    }
}

#[async_trait]
impl GraphBuilder for CorrelationGraphBuilder {
    type Kind = Undirected;
    type Options = CorrelationOptions;

    const NAME: &'static str = "correlations_graph";

    fn notes(&self) -> &[NoteRecord] {
        &self.notes
    }

    fn id_to_title(&self) -> &IdTitleMap {
        &self.id_to_title
    }

    async fn build_graph(&self, options: &CorrelationOptions) -> Result<CorrelationGraph> {
        let links = self.links().await?;
        let candidates = links.len();
        let kept = filter_links(links, options.cutoff);
        let graph = Self::assemble(&kept);

        tracing::debug!(
            notes = self.notes.len(),
            candidates,
            kept = kept.len(),
            cutoff = options.cutoff,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            model = self.embedder.model_name(),
            "Correlation graph built"
        );
        Ok(graph)
    }
}
