//! Force-directed node placement.
//!
//! [`ForceAtlas2Layout`] runs a fixed number of physics steps over a
//! [`LayoutInput`] and returns one [`Position`] per node. The model follows
//! ForceAtlas2-style physics:
//!
//! - every pair of nodes repels with strength `overlap * (deg_i + 1) * (deg_j + 1) / d²`
//!   (a negative `overlap` means repulsion)
//! - every edge is a linear spring of rest length `spring_length`
//! - every node is pulled toward the origin in proportion to its degree
//! - velocities are damped and capped at `max_velocity`
//!
//! Seeding is deterministic, so the same graph and options always produce
//! the same positions.

use petgraph::visit::EdgeRef;
use petgraph::EdgeType;
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::graph::NoteGraph;

const TIME_STEP: f64 = 0.5;
const MIN_DISTANCE: f64 = 0.1;

// ============================================================================
// Options
// ============================================================================

/// Physics parameters for [`ForceAtlas2Layout`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Node repulsion. Negative values push nodes apart.
    pub overlap: f64,
    pub central_gravity: f64,
    /// Rest length of an edge spring
    pub spring_length: f64,
    pub spring_strength: f64,
    /// Fraction of velocity lost per step, in `[0, 1)`
    pub damping: f64,
    pub iterations: usize,
    pub max_velocity: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            overlap: -1000.0,
            central_gravity: 0.01,
            spring_length: 100.0,
            spring_strength: 0.08,
            damping: 0.4,
            iterations: 300,
            max_velocity: 50.0,
        }
    }
}

impl LayoutOptions {
    pub fn with_overlap(mut self, overlap: f64) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Reject parameters the simulation cannot run with.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let finite = [
            ("overlap", self.overlap),
            ("central_gravity", self.central_gravity),
            ("spring_length", self.spring_length),
            ("spring_strength", self.spring_strength),
            ("damping", self.damping),
            ("max_velocity", self.max_velocity),
        ];
        if let Some((name, value)) = finite.into_iter().find(|(_, v)| !v.is_finite()) {
            return Err(LayoutError::InvalidOption { name, value });
        }
        if !(0.0..1.0).contains(&self.damping) {
            return Err(LayoutError::InvalidOption {
                name: "damping",
                value: self.damping,
            });
        }
        if self.max_velocity <= 0.0 {
            return Err(LayoutError::InvalidOption {
                name: "max_velocity",
                value: self.max_velocity,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Input / output
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Topology handed to a layout engine: nodes are `0..node_count`, edges
/// index into them. Direction is irrelevant to placement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutInput {
    pub node_count: usize,
    pub edges: Vec<(usize, usize)>,
}

impl LayoutInput {
    /// Node `i` of the input is `NodeIndex::new(i)` of the graph.
    pub fn from_graph<Ty: EdgeType>(graph: &NoteGraph<Ty>) -> Self {
        Self {
            node_count: graph.graph.node_count(),
            edges: graph
                .graph
                .edge_references()
                .map(|e| (e.source().index(), e.target().index()))
                .collect(),
        }
    }

    /// Number of edges touching each node; a self-loop counts once.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.node_count];
        for &(a, b) in &self.edges {
            degrees[a] += 1;
            if a != b {
                degrees[b] += 1;
            }
        }
        degrees
    }
}

/// Places nodes in the plane.
pub trait LayoutEngine: Send + Sync {
    fn name(&self) -> &str;

    /// One position per node, in node order.
    fn layout(
        &self,
        input: &LayoutInput,
        options: &LayoutOptions,
    ) -> Result<Vec<Position>, LayoutError>;
}

// ============================================================================
// ForceAtlas2
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct ForceAtlas2Layout;

impl ForceAtlas2Layout {
    /// Nodes evenly spaced on a circle whose radius grows with `sqrt(n)`.
    fn seed(n: usize, options: &LayoutOptions) -> Vec<Position> {
        let radius = options.spring_length.abs().max(1.0) * (n as f64).sqrt();
        (0..n)
            .map(|i| {
                let angle = std::f64::consts::TAU * i as f64 / n as f64;
                Position {
                    x: radius * angle.cos(),
                    y: radius * angle.sin(),
                }
            })
            .collect()
    }

    fn step(
        positions: &mut [Position],
        velocities: &mut [Position],
        input: &LayoutInput,
        masses: &[f64],
        options: &LayoutOptions,
    ) {
        let n = positions.len();
        let mut forces = vec![Position::default(); n];

        for i in 0..n {
            for j in (i + 1)..n {
                let dx = positions[i].x - positions[j].x;
                let dy = positions[i].y - positions[j].y;
                let d = (dx * dx + dy * dy).sqrt();
                if d == 0.0 {
                    continue;
                }
                let de = d.max(MIN_DISTANCE);
                let f = -options.overlap * masses[i] * masses[j] / (de * de);
                let (fx, fy) = (f * dx / d, f * dy / d);
                forces[i].x += fx;
                forces[i].y += fy;
                forces[j].x -= fx;
                forces[j].y -= fy;
            }
        }

        for &(a, b) in &input.edges {
            if a == b {
                continue;
            }
            let dx = positions[b].x - positions[a].x;
            let dy = positions[b].y - positions[a].y;
            let d = (dx * dx + dy * dy).sqrt();
            if d == 0.0 {
                continue;
            }
            let f = options.spring_strength * (d - options.spring_length);
            let (fx, fy) = (f * dx / d, f * dy / d);
            forces[a].x += fx;
            forces[a].y += fy;
            forces[b].x -= fx;
            forces[b].y -= fy;
        }

        for i in 0..n {
            forces[i].x -= positions[i].x * options.central_gravity * masses[i];
            forces[i].y -= positions[i].y * options.central_gravity * masses[i];

            let v = &mut velocities[i];
            v.x = (v.x + forces[i].x * TIME_STEP) * (1.0 - options.damping);
            v.y = (v.y + forces[i].y * TIME_STEP) * (1.0 - options.damping);

            let speed = (v.x * v.x + v.y * v.y).sqrt();
            if speed > options.max_velocity {
                v.x *= options.max_velocity / speed;
                v.y *= options.max_velocity / speed;
            }

            positions[i].x += v.x * TIME_STEP;
            positions[i].y += v.y * TIME_STEP;
        }
    }
}

impl LayoutEngine for ForceAtlas2Layout {
    fn name(&self) -> &str {
        "forceatlas2"
    }

    fn layout(
        &self,
        input: &LayoutInput,
        options: &LayoutOptions,
    ) -> Result<Vec<Position>, LayoutError> {
        options.validate()?;

        let n = input.node_count;
        let masses: Vec<f64> = input.degrees().iter().map(|d| (*d + 1) as f64).collect();
        let mut positions = Self::seed(n, options);
        let mut velocities = vec![Position::default(); n];

        for iteration in 0..options.iterations {
            Self::step(&mut positions, &mut velocities, input, &masses, options);
            if positions.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
                tracing::warn!(iteration, nodes = n, "Layout diverged");
                return Err(LayoutError::Diverged { iteration });
            }
        }

        Ok(positions)
    }
}
