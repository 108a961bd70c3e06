//! Transposed view of a graph.

use crate::utils::graph::{GraphBase, Predecessors, Successors};

/// A borrowed view of a graph with every edge reversed.
///
/// Successors of the view are the predecessors of the underlying graph and vice versa.
/// Backward dataflow analyses are run by handing the solver a `Transposed` graph; the
/// solver itself only knows one direction.
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::{FlowEdge, FlowEdgeKind};
/// use flowscope::utils::graph::{FlowGraph, Successors, Transposed};
///
/// let mut graph: FlowGraph<usize, FlowEdge<usize>> = FlowGraph::new();
/// graph.add_vertex(0);
/// graph.add_vertex(1);
/// graph.add_edge(FlowEdge::new(0, 1, FlowEdgeKind::Immediate))?;
///
/// let reversed = Transposed::new(&graph);
/// assert_eq!(reversed.successors(1).collect::<Vec<_>>(), vec![0]);
/// # Ok::<(), flowscope::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Transposed<'g, G> {
    graph: &'g G,
}

impl<'g, G> Transposed<'g, G> {
    /// Creates a transposed view over `graph`.
    #[must_use]
    pub const fn new(graph: &'g G) -> Self {
        Self { graph }
    }

    /// Returns the underlying graph.
    #[must_use]
    pub const fn inner(&self) -> &'g G {
        self.graph
    }
}

impl<G: GraphBase> GraphBase for Transposed<'_, G> {
    type Vertex = G::Vertex;

    fn vertex_count(&self) -> usize {
        self.graph.vertex_count()
    }

    fn vertices(&self) -> impl Iterator<Item = Self::Vertex> {
        self.graph.vertices()
    }
}

impl<G: Predecessors> Successors for Transposed<'_, G> {
    fn successors(&self, vertex: Self::Vertex) -> impl Iterator<Item = Self::Vertex> {
        self.graph.predecessors(vertex)
    }
}

impl<G: Successors> Predecessors for Transposed<'_, G> {
    fn predecessors(&self, vertex: Self::Vertex) -> impl Iterator<Item = Self::Vertex> {
        self.graph.successors(vertex)
    }
}
