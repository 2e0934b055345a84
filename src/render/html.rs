//! Self-contained interactive HTML output.
//!
//! The document embeds everything it needs: an inline SVG scene, a small
//! stylesheet and a script for pan, zoom, node drag and neighbour
//! highlighting. It loads nothing from the network.

use petgraph::visit::EdgeRef;
use petgraph::EdgeType;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use super::layout::{ForceAtlas2Layout, LayoutEngine, LayoutInput, LayoutOptions, Position};
use crate::error::{LayoutError, RenderError, Result};
use crate::graph::NoteGraph;

const NODE_RADIUS: f64 = 10.0;
const PADDING: f64 = 80.0;

const STYLE: &str = r#"
html, body { margin: 0; height: 100%; background: #fafafa; font-family: sans-serif; }
#graph { width: 100%; height: 100%; cursor: grab; }
#graph-info { position: fixed; top: 8px; left: 12px; color: #555; font-size: 13px; }
.edge { stroke: #9aa5b1; stroke-width: 1.5; fill: none; }
.node circle { fill: #4f7cac; stroke: #fff; stroke-width: 2; cursor: pointer; }
.node text { font-size: 12px; fill: #222; text-anchor: middle; pointer-events: none; }
.dimmed { opacity: 0.15; }
.highlight circle { fill: #e07a5f; }
"#;

const SCRIPT: &str = r#"
(function () {
  const svg = document.getElementById('graph');
  const viewport = document.getElementById('viewport');
  const nodes = new Map();
  svg.querySelectorAll('.node').forEach(function (el) { nodes.set(el.dataset.id, el); });
  const edges = Array.from(svg.querySelectorAll('.edge'));
  let scale = 1, tx = 0, ty = 0, panning = null, dragging = null, selected = null;

  function apply() {
    viewport.setAttribute('transform', 'translate(' + tx + ',' + ty + ') scale(' + scale + ')');
  }
  function svgPoint(evt) {
    const p = svg.createSVGPoint();
    p.x = evt.clientX; p.y = evt.clientY;
    return p.matrixTransform(svg.getScreenCTM().inverse());
  }
  function localPoint(evt) {
    const p = svgPoint(evt);
    return { x: (p.x - tx) / scale, y: (p.y - ty) / scale };
  }
  function moveEdges(id) {
    edges.forEach(function (edge) {
      const s = nodes.get(edge.dataset.source), t = nodes.get(edge.dataset.target);
      if (edge.dataset.source !== id && edge.dataset.target !== id) return;
      if (edge.tagName === 'circle') {
        edge.setAttribute('cx', s.dataset.x);
        edge.setAttribute('cy', s.dataset.y - edge.getAttribute('r'));
      } else {
        edge.setAttribute('x1', s.dataset.x); edge.setAttribute('y1', s.dataset.y);
        edge.setAttribute('x2', t.dataset.x); edge.setAttribute('y2', t.dataset.y);
      }
    });
  }
  function highlight(id) {
    const keep = new Set([id]);
    edges.forEach(function (edge) {
      const touches = edge.dataset.source === id || edge.dataset.target === id;
      if (touches) { keep.add(edge.dataset.source); keep.add(edge.dataset.target); }
      edge.classList.toggle('dimmed', id !== null && !touches);
    });
    nodes.forEach(function (el, key) {
      el.classList.toggle('dimmed', id !== null && !keep.has(key));
      el.classList.toggle('highlight', key === id);
    });
  }

  svg.addEventListener('wheel', function (evt) {
    evt.preventDefault();
    const f = evt.deltaY < 0 ? 1.1 : 1 / 1.1;
    const p = svgPoint(evt);
    tx = p.x - (p.x - tx) * f;
    ty = p.y - (p.y - ty) * f;
    scale *= f;
    apply();
  }, { passive: false });

  svg.addEventListener('mousedown', function (evt) {
    const node = evt.target.closest('.node');
    if (node) {
      dragging = { el: node, moved: false };
    } else {
      const p = svgPoint(evt);
      panning = { x: p.x - tx, y: p.y - ty };
    }
  });
  window.addEventListener('mousemove', function (evt) {
    if (dragging) {
      const p = localPoint(evt);
      dragging.moved = true;
      dragging.el.dataset.x = p.x; dragging.el.dataset.y = p.y;
      dragging.el.setAttribute('transform', 'translate(' + p.x + ',' + p.y + ')');
      moveEdges(dragging.el.dataset.id);
    } else if (panning) {
      const p = svgPoint(evt);
      tx = p.x - panning.x; ty = p.y - panning.y;
      apply();
    }
  });
  window.addEventListener('mouseup', function () {
    if (dragging && !dragging.moved) {
      const id = dragging.el.dataset.id;
      selected = selected === id ? null : id;
      highlight(selected);
    }
    dragging = null; panning = null;
  });
})();
"#;

/// Lays out a [`NoteGraph`] and serializes it as one HTML document.
pub struct HtmlRenderer {
    layout: Box<dyn LayoutEngine>,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new(ForceAtlas2Layout)
    }
}

impl HtmlRenderer {
    pub fn new(layout: impl LayoutEngine + 'static) -> Self {
        Self {
            layout: Box::new(layout),
        }
    }

    /// Build the document in memory.
    pub fn to_html<Ty: EdgeType>(
        &self,
        graph: &NoteGraph<Ty>,
        title: &str,
        options: &LayoutOptions,
    ) -> std::result::Result<String, LayoutError> {
        let positions = self.layout.layout(&LayoutInput::from_graph(graph), options)?;
        if positions.len() != graph.node_count() {
            return Err(LayoutError::PositionCount {
                expected: graph.node_count(),
                actual: positions.len(),
            });
        }
        Ok(document(graph, title, &positions))
    }

    /// Lay out `graph` and write it atomically to `destination`.
    ///
    /// The parent directory must exist. On any failure no file is created at
    /// `destination`, and an existing file there is left as it was.
    pub fn render<Ty: EdgeType>(
        &self,
        graph: &NoteGraph<Ty>,
        destination: &Path,
        options: &LayoutOptions,
    ) -> Result<()> {
        let dir = parent_dir(destination);
        if !dir.is_dir() {
            return Err(RenderError::MissingDirectory(dir.to_path_buf()).into());
        }

        let title = destination
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "notes graph".to_string());
        let html = self.to_html(graph, &title, options)?;
        write_atomic(destination, html.as_bytes())?;

        tracing::info!(
            path = %destination.display(),
            layout = self.layout.name(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            bytes = html.len(),
            "Graph rendered"
        );
        Ok(())
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Write `contents` to a temporary file next to `destination`, then rename
/// it into place. The temporary file is removed if anything fails.
pub fn write_atomic(destination: &Path, contents: &[u8]) -> std::result::Result<(), RenderError> {
    let write_err = |source| RenderError::Write {
        path: destination.to_path_buf(),
        source,
    };

    let mut file = NamedTempFile::new_in(parent_dir(destination)).map_err(write_err)?;
    file.write_all(contents).map_err(write_err)?;
    file.flush().map_err(write_err)?;

    file.persist(destination)
        .map_err(|e| RenderError::Persist {
            path: destination.to_path_buf(),
            source: e.error,
        })?;
    Ok(())
}

/// Escape text for use in HTML content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn view_box(positions: &[Position]) -> String {
    if positions.is_empty() {
        return "-100 -100 200 200".to_string();
    }
    let (min_x, max_x, min_y, max_y) = positions.iter().fold(
        (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
        |(min_x, max_x, min_y, max_y), p| {
            (min_x.min(p.x), max_x.max(p.x), min_y.min(p.y), max_y.max(p.y))
        },
    );
    format!(
        "{:.2} {:.2} {:.2} {:.2}",
        min_x - PADDING,
        min_y - PADDING,
        max_x - min_x + 2.0 * PADDING,
        max_y - min_y + 2.0 * PADDING
    )
}

fn document<Ty: EdgeType>(graph: &NoteGraph<Ty>, title: &str, positions: &[Position]) -> String {
    let g = &graph.graph;
    let directed = Ty::is_directed();
    let arrow = if directed { "→" } else { "↔" };

    let mut edges = String::new();
    for e in g.edge_references() {
        let (s, t) = (e.source().index(), e.target().index());
        let label = format!("{} {} {}", g[e.source()], arrow, g[e.target()]);
        let tooltip = match e.weight().weight {
            Some(w) => format!("{}: {:.3}", label, w),
            None => label,
        };
        let marker = if directed {
            r#" marker-end="url(#arrow)""#
        } else {
            ""
        };
        if s == t {
            let loop_r = NODE_RADIUS * 1.5;
            edges.push_str(&format!(
                "<circle class=\"edge loop\" data-source=\"{s}\" data-target=\"{t}\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"{loop_r}\"><title>{}</title></circle>\n",
                positions[s].x,
                positions[s].y - loop_r,
                escape_html(&tooltip),
            ));
        } else {
            edges.push_str(&format!(
                "<line class=\"edge\" data-source=\"{s}\" data-target=\"{t}\" x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\"{marker}><title>{}</title></line>\n",
                positions[s].x,
                positions[s].y,
                positions[t].x,
                positions[t].y,
                escape_html(&tooltip),
            ));
        }
    }

    let mut nodes = String::new();
    for idx in g.node_indices() {
        let i = idx.index();
        let (x, y) = (positions[i].x, positions[i].y);
        let name = escape_html(&g[idx]);
        nodes.push_str(&format!(
            "<g class=\"node\" data-id=\"{i}\" data-x=\"{x:.2}\" data-y=\"{y:.2}\" transform=\"translate({x:.2},{y:.2})\"><circle r=\"{NODE_RADIUS}\"/><text dy=\"-14\">{name}</text><title>{name}</title></g>\n"
        ));
    }

    let defs = if directed {
        format!(
            "<defs><marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"{}\" refY=\"5\" markerWidth=\"10\" markerHeight=\"10\" markerUnits=\"userSpaceOnUse\" orient=\"auto\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"#9aa5b1\"/></marker></defs>\n",
            NODE_RADIUS + 10.0
        )
    } else {
        String::new()
    };

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
<div id=\"graph-info\">{title}: {nodes_n} nodes, {edges_n} edges</div>\n\
<svg id=\"graph\" xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{view_box}\" preserveAspectRatio=\"xMidYMid meet\">\n\
{defs}<g id=\"viewport\">\n<g class=\"edges\">\n{edges}</g>\n<g class=\"nodes\">\n{nodes}</g>\n</g>\n</svg>\n\
<script>{SCRIPT}</script>\n</body>\n</html>\n",
        title = escape_html(title),
        nodes_n = graph.node_count(),
        edges_n = graph.edge_count(),
        view_box = view_box(positions),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::graph::{CorrelationGraph, NoteEdge, RelationGraph};

    fn relation_graph() -> RelationGraph {
        let mut g = RelationGraph::new();
        g.add_edge("Parent", "Child", NoteEdge::unweighted());
        g.add_edge("Parent", "Parent", NoteEdge::unweighted());
        g
    }

    fn correlation_graph() -> CorrelationGraph {
        let mut g = CorrelationGraph::new();
        g.add_edge("Rust & <Go>", "Zig", NoteEdge::weighted(0.8123));
        g
    }

    fn fast() -> LayoutOptions {
        LayoutOptions::default().with_iterations(20)
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_directed_graph_has_arrows() {
        let html = HtmlRenderer::default()
            .to_html(&relation_graph(), "relations", &fast())
            .unwrap();
        assert!(html.contains("<marker id=\"arrow\""));
        assert!(html.contains("marker-end=\"url(#arrow)\""));
        assert!(html.contains("Parent → Child"));
        assert!(html.contains("class=\"edge loop\""));
        assert!(html.contains("relations: 2 nodes, 2 edges"));
    }

    #[test]
    fn test_undirected_graph_has_weights_and_no_arrows() {
        let html = HtmlRenderer::default()
            .to_html(&correlation_graph(), "correlations", &fast())
            .unwrap();
        assert!(!html.contains("marker-end"));
        assert!(html.contains("0.812"));
        assert!(html.contains("Rust &amp; &lt;Go&gt;"));
        assert!(!html.contains("<Go>"));
    }

    #[test]
    fn test_document_is_self_contained() {
        let html = HtmlRenderer::default()
            .to_html(&correlation_graph(), "correlations", &fast())
            .unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(!html.contains("<script src"));
        assert!(!html.contains("<link"));
        assert!(html.contains("addEventListener('wheel'"));
    }

    #[test]
    fn test_render_writes_only_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("graph_from_relations.html");
        HtmlRenderer::default()
            .render(&relation_graph(), &dest, &fast())
            .unwrap();

        let content = std::fs::read_to_string(&dest).unwrap();
        assert!(content.contains("<title>graph_from_relations</title>"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_render_empty_graph() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("empty.html");
        HtmlRenderer::default()
            .render(&CorrelationGraph::new(), &dest, &fast())
            .unwrap();
        assert!(std::fs::read_to_string(&dest)
            .unwrap()
            .contains("0 nodes, 0 edges"));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nope").join("graph.html");
        let err = HtmlRenderer::default()
            .render(&relation_graph(), &dest, &fast())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Render(RenderError::MissingDirectory(_))
        ));
        assert!(!dest.exists());
    }

    #[test]
    fn test_layout_failure_leaves_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("graph.html");
        let options = LayoutOptions {
            damping: 2.0,
            ..Default::default()
        };
        let err = HtmlRenderer::default()
            .render(&relation_graph(), &dest, &options)
            .unwrap_err();
        assert!(matches!(err, Error::Layout(LayoutError::InvalidOption { .. })));
        assert!(!dest.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    /// Places only the first node.
    struct FirstNodeOnly;

    impl LayoutEngine for FirstNodeOnly {
        fn name(&self) -> &str {
            "first-node-only"
        }

        fn layout(
            &self,
            input: &LayoutInput,
            _options: &LayoutOptions,
        ) -> std::result::Result<Vec<Position>, LayoutError> {
            Ok(vec![Position { x: 0.0, y: 0.0 }; input.node_count.min(1)])
        }
    }

    #[test]
    fn test_short_layout_is_a_layout_error() {
        let renderer = HtmlRenderer::new(FirstNodeOnly);
        let err = renderer
            .to_html(&relation_graph(), "relations", &fast())
            .unwrap_err();
        assert_eq!(
            err,
            LayoutError::PositionCount {
                expected: 2,
                actual: 1
            }
        );

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("graph.html");
        let err = renderer
            .render(&relation_graph(), &dest, &fast())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Layout(LayoutError::PositionCount { .. })
        ));
        assert!(!dest.exists());
    }

    #[test]
    fn test_persist_failure_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        // A directory occupies the destination, so the rename must fail.
        let dest = dir.path().join("graph.html");
        std::fs::create_dir(&dest).unwrap();

        let err = write_atomic(&dest, b"<html></html>").unwrap_err();
        assert!(matches!(err, RenderError::Persist { .. }));
        assert!(dest.is_dir());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_overwrites_existing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("graph.html");
        std::fs::write(&dest, "stale").unwrap();
        write_atomic(&dest, b"fresh").unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "fresh");
    }
}
