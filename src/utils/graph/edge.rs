//! Edge abstraction for [`FlowGraph`](super::FlowGraph).
//!
//! Edges are plain values that carry their own endpoints. The graph stores each edge twice
//! (in the source's outgoing list and the destination's incoming list) and identifies edges
//! by value equality, so two edges with the same endpoints but different kinds coexist as
//! parallel edges.

use std::fmt::Debug;

use crate::{utils::graph::Vertex, Result};

/// A directed, typed edge between two vertices.
///
/// Besides exposing its endpoints, an edge knows how to produce a retargeted copy of itself
/// (used when duplicating or splicing vertices) and how to produce its structural inverse.
/// Edge kinds that have no meaningful inverse, or cannot be retargeted at all, fail with
/// [`Error::UnsupportedOperation`](crate::Error::UnsupportedOperation).
pub trait GraphEdge: Clone + PartialEq + Debug {
    /// The vertex type this edge connects.
    type Vertex: Vertex;

    /// Returns the source vertex.
    fn src(&self) -> Self::Vertex;

    /// Returns the destination vertex.
    fn dst(&self) -> Self::Vertex;

    /// Returns a copy of this edge, with the same kind, between `src` and `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`](crate::Error::UnsupportedOperation) for edge
    /// kinds that must not be duplicated.
    fn with_endpoints(&self, src: Self::Vertex, dst: Self::Vertex) -> Result<Self>;

    /// Returns the structural inverse of this edge.
    ///
    /// The default swaps the endpoints and keeps the kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`](crate::Error::UnsupportedOperation) for edge
    /// kinds that are not invertible.
    fn inverted(&self) -> Result<Self> {
        self.with_endpoints(self.dst(), self.src())
    }

    /// Returns `true` if control transfers along this edge only when an exception is raised.
    fn is_exceptional(&self) -> bool {
        false
    }
}
