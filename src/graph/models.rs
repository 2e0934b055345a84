//! Graph data models.
//!
//! - [`NoteGraph`] — petgraph wrapper keyed by note title, generic over
//!   directedness ([`RelationGraph`] is directed, [`CorrelationGraph`] is not)
//! - [`NoteEdge`] — edge payload, optionally weighted
//! - [`GraphKind`] — the two graph flavours, by name

use petgraph::graph::{EdgeIndex, Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, EdgeType, Undirected};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

// ============================================================================
// Edge payload
// ============================================================================

/// Edge payload. `weight` is the similarity score in correlation graphs and
/// `None` for explicit relations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NoteEdge {
    pub weight: Option<f64>,
}

impl NoteEdge {
    pub fn unweighted() -> Self {
        Self { weight: None }
    }

    pub fn weighted(weight: f64) -> Self {
        Self {
            weight: Some(weight),
        }
    }
}

// ============================================================================
// NoteGraph — petgraph wrapper with title mapping
// ============================================================================

/// A graph whose nodes are note titles.
///
/// Titles are unique: adding a title twice returns the existing node. Adding
/// an edge that already exists replaces its payload instead of creating a
/// parallel edge; in an undirected graph `(a, b)` and `(b, a)` are the same
/// edge.
#[derive(Debug, Clone)]
pub struct NoteGraph<Ty: EdgeType> {
    pub graph: Graph<String, NoteEdge, Ty>,
    pub title_to_index: HashMap<String, NodeIndex>,
}

/// Directed graph of explicit parent → child links.
pub type RelationGraph = NoteGraph<Directed>;

/// Undirected graph of sufficiently similar notes.
pub type CorrelationGraph = NoteGraph<Undirected>;

impl<Ty: EdgeType> NoteGraph<Ty> {
    pub fn new() -> Self {
        Self {
            graph: Graph::default(),
            title_to_index: HashMap::new(),
        }
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            graph: Graph::with_capacity(nodes, edges),
            title_to_index: HashMap::with_capacity(nodes),
        }
    }

    /// Add a node, or return the index of the existing node with that title.
    pub fn add_node(&mut self, title: &str) -> NodeIndex {
        if let Some(&idx) = self.title_to_index.get(title) {
            return idx;
        }
        let idx = self.graph.add_node(title.to_string());
        self.title_to_index.insert(title.to_string(), idx);
        idx
    }

    /// Add an edge between two titles, creating missing endpoints.
    pub fn add_edge(&mut self, from: &str, to: &str, edge: NoteEdge) -> EdgeIndex {
        let a = self.add_node(from);
        let b = self.add_node(to);
        self.graph.update_edge(a, b, edge)
    }

    pub fn get_index(&self, title: &str) -> Option<NodeIndex> {
        self.title_to_index.get(title).copied()
    }

    pub fn contains_node(&self, title: &str) -> bool {
        self.title_to_index.contains_key(title)
    }

    /// Whether an edge `from → to` exists (either orientation when undirected).
    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        match (self.get_index(from), self.get_index(to)) {
            (Some(a), Some(b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// Payload of the edge `from → to`, if present.
    pub fn edge(&self, from: &str, to: &str) -> Option<&NoteEdge> {
        let a = self.get_index(from)?;
        let b = self.get_index(to)?;
        self.graph
            .find_edge(a, b)
            .and_then(|e| self.graph.edge_weight(e))
    }

    /// All node titles, sorted.
    pub fn titles(&self) -> BTreeSet<String> {
        self.graph.node_weights().cloned().collect()
    }

    /// All edges as `(source, target, weight)` in insertion order.
    pub fn edges(&self) -> Vec<(String, String, Option<f64>)> {
        self.graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].clone(),
                    self.graph[e.target()].clone(),
                    e.weight().weight,
                )
            })
            .collect()
    }

    /// Edge endpoints as a set. Undirected endpoints are ordered so that the
    /// same edge always yields the same pair.
    pub fn edge_set(&self) -> BTreeSet<(String, String)> {
        self.edges()
            .into_iter()
            .map(|(a, b, _)| {
                if !Ty::is_directed() && b < a {
                    (b, a)
                } else {
                    (a, b)
                }
            })
            .collect()
    }

    pub fn is_directed(&self) -> bool {
        Ty::is_directed()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

impl<Ty: EdgeType> Default for NoteGraph<Ty> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// GraphKind
// ============================================================================

/// The two ways of drawing a notes graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphKind {
    /// Follow explicit child links
    Relations,
    /// Connect notes with similar content
    Correlations,
}

impl GraphKind {
    pub const ALL: [GraphKind; 2] = [GraphKind::Relations, GraphKind::Correlations];

    /// Default artifact file name for this kind.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Self::Relations => "graph_from_relations.html",
            Self::Correlations => "graph_from_correlations.html",
        }
    }
}

impl std::fmt::Display for GraphKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Relations => write!(f, "relations"),
            Self::Correlations => write!(f, "correlations"),
        }
    }
}

impl std::str::FromStr for GraphKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relations" | "relations_graph" => Ok(Self::Relations),
            "correlations" | "correlations_graph" => Ok(Self::Correlations),
            other => Err(format!(
                "unknown graph kind '{}', expected one of: relations, correlations",
                other
            )),
        }
    }
}
