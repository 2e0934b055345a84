//! Shared graph builder contract.
//!
//! Both builders are constructed from a batch of notes plus its id → title
//! lookup, expose `build_graph` with their own options type, and share one
//! rendering path.

use async_trait::async_trait;
use petgraph::EdgeType;
use std::path::Path;

use super::models::NoteGraph;
use crate::error::Result;
use crate::notes::{IdTitleMap, NoteRecord};
use crate::render::{self, LayoutOptions};

/// A way of turning a batch of notes into a graph.
///
/// `build_graph` is a pure function of the builder's stored notes and the
/// given options: it never mutates them and returns a fresh graph on every
/// call.
#[async_trait]
pub trait GraphBuilder: Send + Sync {
    /// Directedness of the produced graph
    type Kind: EdgeType + Send + Sync + 'static;
    /// Tuning knobs accepted by `build_graph`
    type Options: Send + Sync;

    /// Short identifier (`relations_graph`, `correlations_graph`).
    const NAME: &'static str;

    fn notes(&self) -> &[NoteRecord];

    fn id_to_title(&self) -> &IdTitleMap;

    async fn build_graph(&self, options: &Self::Options) -> Result<NoteGraph<Self::Kind>>;

    /// Lay out `graph` and write it as a self-contained HTML document to
    /// `destination`.
    ///
    /// Nothing is left at `destination` if layout or writing fails.
    fn render(
        &self,
        graph: &NoteGraph<Self::Kind>,
        destination: &Path,
        layout: &LayoutOptions,
    ) -> Result<()> {
        render::render_graph(graph, destination, layout)
    }
}
