//! Graph rendering.
//!
//! - [`layout`] — `LayoutEngine` trait and the built-in ForceAtlas2-style layout
//! - [`html`] — `HtmlRenderer`, self-contained interactive HTML output

pub mod html;
pub mod layout;

pub use html::{escape_html, write_atomic, HtmlRenderer};
pub use layout::{ForceAtlas2Layout, LayoutEngine, LayoutInput, LayoutOptions, Position};

use petgraph::EdgeType;
use std::path::Path;

use crate::error::Result;
use crate::graph::NoteGraph;

/// Render `graph` to `destination` with the default layout engine.
pub fn render_graph<Ty: EdgeType>(
    graph: &NoteGraph<Ty>,
    destination: &Path,
    options: &LayoutOptions,
) -> Result<()> {
    HtmlRenderer::default().render(graph, destination, options)
}
