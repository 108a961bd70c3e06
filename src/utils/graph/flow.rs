//! Mutable directed multigraph with forward and reverse adjacency.

use std::collections::HashMap;

use crate::{
    utils::graph::{GraphBase, GraphEdge, MutableGraph, Predecessors, Successors, Vertex},
    Error, Result,
};

/// Adjacency lists of a single vertex.
#[derive(Debug, Clone)]
struct Adjacency<E> {
    /// Edges whose source is this vertex, in insertion order.
    outgoing: Vec<E>,
    /// Edges whose destination is this vertex, in insertion order.
    incoming: Vec<E>,
}

impl<E> Adjacency<E> {
    fn new() -> Self {
        Self {
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }
}

/// A mutable directed multigraph over handle vertices.
///
/// `FlowGraph` stores, for every vertex, the list of outgoing edges and the list of
/// incoming edges. Both lists are updated together by every mutation so the reverse
/// adjacency is always the exact transpose of the forward adjacency.
///
/// Edges are identified by value. Adding an edge equal to an existing one is a no-op that
/// returns `false`; edges that differ only in kind are kept as parallel edges.
///
/// # Type Parameters
///
/// * `V` - Vertex handle type
/// * `E` - Edge type connecting vertices of type `V`
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::{FlowEdge, FlowEdgeKind};
/// use flowscope::utils::graph::FlowGraph;
///
/// let mut graph: FlowGraph<usize, FlowEdge<usize>> = FlowGraph::new();
/// graph.add_vertex(0);
/// graph.add_vertex(1);
///
/// let edge = FlowEdge::new(0, 1, FlowEdgeKind::ConditionalJump);
/// assert!(graph.add_edge(edge.clone())?);
/// assert!(!graph.add_edge(edge.clone())?);
/// assert_eq!(graph.reverse_edges(1), &[edge.clone()]);
///
/// assert!(graph.remove_edge(&edge));
/// assert!(graph.edges(0).is_empty());
/// assert!(graph.reverse_edges(1).is_empty());
/// # Ok::<(), flowscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct FlowGraph<V, E> {
    /// Vertices in insertion order.
    order: Vec<V>,
    /// Per-vertex adjacency.
    adjacency: HashMap<V, Adjacency<E>>,
}

impl<V: Vertex, E: GraphEdge<Vertex = V>> Default for FlowGraph<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Vertex, E: GraphEdge<Vertex = V>> FlowGraph<V, E> {
    /// Creates a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            adjacency: HashMap::new(),
        }
    }

    /// Adds a vertex, returning `false` if it was already present.
    pub fn add_vertex(&mut self, vertex: V) -> bool {
        if self.adjacency.contains_key(&vertex) {
            return false;
        }
        self.adjacency.insert(vertex, Adjacency::new());
        self.order.push(vertex);
        true
    }

    /// Returns `true` if `vertex` is part of this graph.
    #[must_use]
    pub fn contains_vertex(&self, vertex: V) -> bool {
        self.adjacency.contains_key(&vertex)
    }

    /// Removes `vertex` together with every incident edge.
    ///
    /// Returns `false` if the vertex was not present.
    pub fn remove_vertex(&mut self, vertex: V) -> bool {
        let Some(adjacency) = self.adjacency.remove(&vertex) else {
            return false;
        };

        for edge in &adjacency.outgoing {
            if let Some(dst) = self.adjacency.get_mut(&edge.dst()) {
                remove_first(&mut dst.incoming, edge);
            }
        }
        for edge in &adjacency.incoming {
            if let Some(src) = self.adjacency.get_mut(&edge.src()) {
                remove_first(&mut src.outgoing, edge);
            }
        }

        self.order.retain(|v| *v != vertex);
        true
    }

    /// Adds an edge to both adjacency directions.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the edge was added, `Ok(false)` if an equal edge already exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] if either endpoint is not a vertex of this graph.
    pub fn add_edge(&mut self, edge: E) -> Result<bool> {
        let (src, dst) = (edge.src(), edge.dst());
        if !self.contains_vertex(src) {
            return Err(Error::GraphError(format!(
                "Source vertex {:?} does not exist in graph",
                src
            )));
        }
        if !self.contains_vertex(dst) {
            return Err(Error::GraphError(format!(
                "Target vertex {:?} does not exist in graph",
                dst
            )));
        }

        if self.edges(src).contains(&edge) {
            return Ok(false);
        }

        if let Some(adjacency) = self.adjacency.get_mut(&dst) {
            adjacency.incoming.push(edge.clone());
        }
        if let Some(adjacency) = self.adjacency.get_mut(&src) {
            adjacency.outgoing.push(edge);
        }
        Ok(true)
    }

    /// Removes an edge from both adjacency directions.
    ///
    /// Returns `false` if the edge was not present.
    pub fn remove_edge(&mut self, edge: &E) -> bool {
        let removed = match self.adjacency.get_mut(&edge.src()) {
            Some(adjacency) => remove_first(&mut adjacency.outgoing, edge),
            None => false,
        };
        if removed {
            if let Some(adjacency) = self.adjacency.get_mut(&edge.dst()) {
                remove_first(&mut adjacency.incoming, edge);
            }
        }
        removed
    }

    /// Returns the outgoing edges of `vertex`, or an empty slice for unknown vertices.
    #[must_use]
    pub fn edges(&self, vertex: V) -> &[E] {
        self.adjacency
            .get(&vertex)
            .map_or(&[], |adjacency| adjacency.outgoing.as_slice())
    }

    /// Returns the incoming edges of `vertex`, or an empty slice for unknown vertices.
    #[must_use]
    pub fn reverse_edges(&self, vertex: V) -> &[E] {
        self.adjacency
            .get(&vertex)
            .map_or(&[], |adjacency| adjacency.incoming.as_slice())
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.order.len()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(|a| a.outgoing.len()).sum()
    }

    /// Returns `true` if the graph has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns an iterator over all vertices.
    pub fn vertices(&self) -> impl Iterator<Item = V> + '_ {
        self.order.iter().copied()
    }

    /// Returns an iterator over every edge of the graph, grouped by source vertex.
    pub fn all_edges(&self) -> impl Iterator<Item = &E> + '_ {
        self.order.iter().flat_map(move |v| self.edges(*v).iter())
    }

    /// Returns a deep copy of this graph.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Returns a copy of `edge` with each endpoint equal to `old` replaced by `new`.
    ///
    /// # Errors
    ///
    /// Propagates the failure of [`GraphEdge::with_endpoints`].
    pub fn clone_edge(&self, edge: &E, old: V, new: V) -> Result<E> {
        let src = if edge.src() == old { new } else { edge.src() };
        let dst = if edge.dst() == old { new } else { edge.dst() };
        edge.with_endpoints(src, dst)
    }

    /// Returns the structural inverse of `edge`.
    ///
    /// # Errors
    ///
    /// Propagates the failure of [`GraphEdge::inverted`].
    pub fn invert_edge(&self, edge: &E) -> Result<E> {
        edge.inverted()
    }

    /// Splices `vertex` out of the graph.
    ///
    /// Every incoming edge `p -> vertex` is retargeted (keeping its kind) to every successor
    /// `s` of `vertex`, then the vertex and its edges are removed. Self-loops on `vertex` are
    /// dropped.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if `vertex` is not part of the graph.
    ///
    /// # Errors
    ///
    /// Fails if a predecessor edge cannot be retargeted.
    pub fn excavate(&mut self, vertex: V) -> Result<bool> {
        if !self.contains_vertex(vertex) {
            return Ok(false);
        }

        let successors: Vec<V> = self
            .edges(vertex)
            .iter()
            .map(GraphEdge::dst)
            .filter(|dst| *dst != vertex)
            .collect();
        let incoming: Vec<E> = self
            .reverse_edges(vertex)
            .iter()
            .filter(|edge| edge.src() != vertex)
            .cloned()
            .collect();

        let mut spliced = Vec::with_capacity(successors.len() * incoming.len());
        for edge in &incoming {
            for succ in &successors {
                spliced.push(edge.with_endpoints(edge.src(), *succ)?);
            }
        }

        self.remove_vertex(vertex);
        for edge in spliced {
            self.add_edge(edge)?;
        }
        Ok(true)
    }

    /// Splices `vertex` in between `pred` and `succ`.
    ///
    /// Each edge `pred -> succ` is replaced by `pred -> vertex` and `vertex -> succ`, both
    /// with the kind of the replaced edge. `vertex` is added if it is not present yet.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if either endpoint is missing or no edge connects them.
    ///
    /// # Errors
    ///
    /// Fails if an edge cannot be retargeted.
    pub fn jam(&mut self, pred: V, succ: V, vertex: V) -> Result<bool> {
        if !self.contains_vertex(pred) || !self.contains_vertex(succ) {
            return Ok(false);
        }

        let connecting: Vec<E> = self
            .edges(pred)
            .iter()
            .filter(|edge| edge.dst() == succ)
            .cloned()
            .collect();
        if connecting.is_empty() {
            return Ok(false);
        }

        self.add_vertex(vertex);
        for edge in connecting {
            let head = edge.with_endpoints(pred, vertex)?;
            let tail = edge.with_endpoints(vertex, succ)?;
            self.remove_edge(&edge);
            self.add_edge(head)?;
            self.add_edge(tail)?;
        }
        Ok(true)
    }
}

/// Removes the first element equal to `item`, returning whether one was found.
fn remove_first<E: PartialEq>(list: &mut Vec<E>, item: &E) -> bool {
    match list.iter().position(|e| e == item) {
        Some(index) => {
            list.remove(index);
            true
        }
        None => false,
    }
}

impl<V: Vertex, E: GraphEdge<Vertex = V>> GraphBase for FlowGraph<V, E> {
    type Vertex = V;

    fn vertex_count(&self) -> usize {
        self.order.len()
    }

    fn vertices(&self) -> impl Iterator<Item = V> {
        self.order.iter().copied()
    }
}

impl<V: Vertex, E: GraphEdge<Vertex = V>> Successors for FlowGraph<V, E> {
    fn successors(&self, vertex: V) -> impl Iterator<Item = V> {
        self.edges(vertex).iter().map(GraphEdge::dst)
    }
}

impl<V: Vertex, E: GraphEdge<Vertex = V>> Predecessors for FlowGraph<V, E> {
    fn predecessors(&self, vertex: V) -> impl Iterator<Item = V> {
        self.reverse_edges(vertex).iter().map(GraphEdge::src)
    }
}

impl<V: Vertex, E: GraphEdge<Vertex = V>> MutableGraph for FlowGraph<V, E> {
    type Edge = E;

    fn add_vertex(&mut self, vertex: V) -> Result<bool> {
        Ok(FlowGraph::add_vertex(self, vertex))
    }

    fn remove_vertex(&mut self, vertex: V) -> bool {
        FlowGraph::remove_vertex(self, vertex)
    }

    fn add_edge(&mut self, edge: E) -> Result<bool> {
        FlowGraph::add_edge(self, edge)
    }

    fn remove_edge(&mut self, edge: &E) -> bool {
        FlowGraph::remove_edge(self, edge)
    }

    fn excavate(&mut self, vertex: V) -> Result<bool> {
        FlowGraph::excavate(self, vertex)
    }

    fn jam(&mut self, pred: V, succ: V, vertex: V) -> Result<bool> {
        FlowGraph::jam(self, pred, succ, vertex)
    }

    fn clone_edge(&self, edge: &E, old: V, new: V) -> Result<E> {
        FlowGraph::clone_edge(self, edge, old, new)
    }

    fn invert_edge(&self, edge: &E) -> Result<E> {
        FlowGraph::invert_edge(self, edge)
    }

    fn copy(&self) -> Result<Self> {
        Ok(FlowGraph::copy(self))
    }
}
