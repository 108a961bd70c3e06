//! Trait definitions for graph abstractions.
//!
//! Algorithms in this crate are written against these traits rather than a concrete graph,
//! so the same traversal or solver runs over a [`FlowGraph`](super::FlowGraph), the
//! [`ClassTree`](crate::analysis::ClassTree), or a [`Transposed`](super::Transposed) view.
//!
//! - [`GraphBase`] - Vertex count and vertex iteration
//! - [`Successors`] - Forward traversal
//! - [`Predecessors`] - Backward traversal
//! - [`MutableGraph`] - Structural mutation, including the splice primitives

use crate::{
    utils::graph::{GraphEdge, Vertex},
    Result,
};

/// Base trait providing core graph properties.
pub trait GraphBase {
    /// The vertex type of this graph.
    type Vertex: Vertex;

    /// Returns the number of vertices in the graph.
    fn vertex_count(&self) -> usize;

    /// Returns an iterator over all vertices of the graph.
    ///
    /// Iteration follows insertion order, but callers must not attach meaning to it.
    fn vertices(&self) -> impl Iterator<Item = Self::Vertex>;
}

/// Trait for graphs that support forward edge traversal.
pub trait Successors: GraphBase {
    /// Returns an iterator over the successors of `vertex`.
    ///
    /// A successor is reported once per outgoing edge, so parallel edges yield the same
    /// vertex more than once. Unknown vertices have no successors.
    fn successors(&self, vertex: Self::Vertex) -> impl Iterator<Item = Self::Vertex>;
}

/// Trait for graphs that support backward edge traversal.
pub trait Predecessors: GraphBase {
    /// Returns an iterator over the predecessors of `vertex`.
    ///
    /// A predecessor is reported once per incoming edge. Unknown vertices have no
    /// predecessors.
    fn predecessors(&self, vertex: Self::Vertex) -> impl Iterator<Item = Self::Vertex>;
}

/// Structural mutation of a graph.
///
/// Every graph specialization implements the full contract, but not every operation is
/// meaningful for every specialization. The type hierarchy, for example, rejects splicing,
/// copying and edge retargeting with
/// [`Error::UnsupportedOperation`](crate::Error::UnsupportedOperation) instead of silently
/// doing nothing.
pub trait MutableGraph: GraphBase {
    /// The edge type stored by this graph.
    type Edge: GraphEdge<Vertex = Self::Vertex>;

    /// Adds a vertex, returning `false` if it was already present.
    ///
    /// # Errors
    ///
    /// Specializations that synthesize edges for new vertices may fail while doing so.
    fn add_vertex(&mut self, vertex: Self::Vertex) -> Result<bool>;

    /// Removes a vertex and every edge incident to it, returning `false` if it was absent.
    fn remove_vertex(&mut self, vertex: Self::Vertex) -> bool;

    /// Adds an edge, returning `false` if an identical edge already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint is missing or the edge breaks a structural invariant
    /// of the specialization.
    fn add_edge(&mut self, edge: Self::Edge) -> Result<bool>;

    /// Removes an edge from both adjacency directions, returning `false` if it was absent.
    fn remove_edge(&mut self, edge: &Self::Edge) -> bool;

    /// Removes `vertex`, reconnecting each of its predecessors to each of its successors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`](crate::Error::UnsupportedOperation) where
    /// splicing is undefined.
    fn excavate(&mut self, vertex: Self::Vertex) -> Result<bool>;

    /// Inserts `vertex` on every edge from `pred` to `succ`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`](crate::Error::UnsupportedOperation) where
    /// splicing is undefined.
    fn jam(&mut self, pred: Self::Vertex, succ: Self::Vertex, vertex: Self::Vertex)
        -> Result<bool>;

    /// Returns a copy of `edge` with every endpoint equal to `old` replaced by `new`.
    ///
    /// # Errors
    ///
    /// Fails where edges cannot be retargeted.
    fn clone_edge(
        &self,
        edge: &Self::Edge,
        old: Self::Vertex,
        new: Self::Vertex,
    ) -> Result<Self::Edge>;

    /// Returns the structural inverse of `edge`.
    ///
    /// # Errors
    ///
    /// Fails for non-invertible edge kinds.
    fn invert_edge(&self, edge: &Self::Edge) -> Result<Self::Edge>;

    /// Returns a deep copy with equal structure and independent storage.
    ///
    /// # Errors
    ///
    /// Fails where copying is undefined for the specialization.
    fn copy(&self) -> Result<Self>
    where
        Self: Sized;
}
