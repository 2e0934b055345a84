//! Relation graph: follows explicit parent → child links.

use async_trait::async_trait;
use petgraph::Directed;
use serde::{Deserialize, Serialize};

use super::builder::GraphBuilder;
use super::models::{NoteEdge, RelationGraph};
use crate::error::Result;
use crate::notes::{IdTitleMap, NoteBatch, NoteRecord};

/// The relation graph has no tuning knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationOptions;

/// Builds a directed graph with an edge `title(parent) → title(child)` for
/// every child link whose both ends are known.
///
/// - Links to ids missing from the lookup are dropped silently.
/// - Notes that take part in no kept link do not appear as nodes.
/// - A note listing itself as a child yields a self-loop.
#[derive(Debug, Clone)]
pub struct RelationGraphBuilder {
    notes: Vec<NoteRecord>,
    id_to_title: IdTitleMap,
}

impl RelationGraphBuilder {
    pub fn new(notes: Vec<NoteRecord>, id_to_title: IdTitleMap) -> Self {
        Self { notes, id_to_title }
    }

    pub fn from_batch(batch: NoteBatch) -> Self {
        Self::new(batch.notes, batch.id_to_title)
    }

    /// Title pairs for every child link with both ends present in the lookup.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.notes
            .iter()
            .filter_map(|note| {
                self.id_to_title
                    .get(&note.id)
                    .map(|parent| (parent, &note.children))
            })
            .flat_map(|(parent, children)| {
                children
                    .iter()
                    .filter_map(move |child| self.id_to_title.get(child).map(|c| (parent, c)))
            })
            .collect()
    }

    /// Synchronous core of [`GraphBuilder::build_graph`].
    pub fn build(&self) -> RelationGraph {
        let edges = self.edges();
        let mut graph = RelationGraph::with_capacity(edges.len(), edges.len());
        for (parent, child) in &edges {
            graph.add_edge(parent, child, NoteEdge::unweighted());
        }

        let links: usize = self.notes.iter().map(|n| n.children.len()).sum();
        tracing::debug!(
            notes = self.notes.len(),
            links,
            dropped = links - edges.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Relation graph built"
        );
        graph
    }
}

#[async_trait]
impl GraphBuilder for RelationGraphBuilder {
    type Kind = Directed;
    type Options = RelationOptions;

    const NAME: &'static str = "relations_graph";

    fn notes(&self) -> &[NoteRecord] {
        &self.notes
    }

    fn id_to_title(&self) -> &IdTitleMap {
        &self.id_to_title
    }

    async fn build_graph(&self, _options: &RelationOptions) -> Result<RelationGraph> {
        Ok(self.build())
    }
}
