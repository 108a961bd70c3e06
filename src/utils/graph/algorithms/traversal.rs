//! Iterative depth-first traversal.
//!
//! [`SimpleDfs`] walks a graph from one entry vertex using an explicit stack of enter and
//! exit frames. Entering a vertex records it in preorder; the matching exit frame sits
//! below the frames of its successors, so popping it records the vertex in postorder after
//! every descendant has finished.

use std::collections::HashSet;

use bitflags::bitflags;

use crate::utils::graph::{Successors, Vertex};

bitflags! {
    /// Orders a [`SimpleDfs`] should record.
    ///
    /// An empty set still performs the walk and fills the visited set, which is enough to
    /// answer reachability queries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DfsOrder: u8 {
        /// Record discovery order.
        const PRE = 0b01;
        /// Record finish order.
        const POST = 0b10;
    }
}

/// Result of a depth-first traversal from a single entry vertex.
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::{FlowEdge, FlowEdgeKind};
/// use flowscope::utils::graph::{algorithms::{DfsOrder, SimpleDfs}, FlowGraph};
///
/// let mut graph: FlowGraph<usize, FlowEdge<usize>> = FlowGraph::new();
/// for v in 0..4 {
///     graph.add_vertex(v);
/// }
/// graph.add_edge(FlowEdge::new(0, 1, FlowEdgeKind::Immediate))?;
/// graph.add_edge(FlowEdge::new(0, 2, FlowEdgeKind::ConditionalJump))?;
///
/// let dfs = SimpleDfs::new(&graph, 0, DfsOrder::PRE);
/// assert_eq!(dfs.preorder(), Some(&[0, 1, 2][..]));
/// assert_eq!(dfs.postorder(), None);
/// assert!(!dfs.is_reachable(3));
/// # Ok::<(), flowscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct SimpleDfs<V> {
    visited: HashSet<V>,
    preorder: Option<Vec<V>>,
    postorder: Option<Vec<V>>,
}

/// A frame of the explicit traversal stack.
#[derive(Clone, Copy)]
enum Frame<V> {
    Enter(V),
    Exit(V),
}

impl<V: Vertex> SimpleDfs<V> {
    /// Traverses `graph` from `entry`, recording the orders selected by `order`.
    ///
    /// The entry vertex is always visited, even if the graph does not contain it.
    /// Successors are explored in the order the graph reports them.
    pub fn new<G>(graph: &G, entry: V, order: DfsOrder) -> Self
    where
        G: Successors<Vertex = V>,
    {
        let mut visited = HashSet::new();
        let mut preorder = order.contains(DfsOrder::PRE).then(Vec::new);
        let mut postorder = order.contains(DfsOrder::POST).then(Vec::new);

        let mut stack = vec![Frame::Enter(entry)];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(vertex) => {
                    if !visited.insert(vertex) {
                        continue;
                    }
                    if let Some(pre) = preorder.as_mut() {
                        pre.push(vertex);
                    }
                    stack.push(Frame::Exit(vertex));

                    let successors: Vec<V> = graph.successors(vertex).collect();
                    for succ in successors.into_iter().rev() {
                        if !visited.contains(&succ) {
                            stack.push(Frame::Enter(succ));
                        }
                    }
                }
                Frame::Exit(vertex) => {
                    if let Some(post) = postorder.as_mut() {
                        post.push(vertex);
                    }
                }
            }
        }

        Self {
            visited,
            preorder,
            postorder,
        }
    }

    /// Returns the discovery order, if it was requested.
    #[must_use]
    pub fn preorder(&self) -> Option<&[V]> {
        self.preorder.as_deref()
    }

    /// Returns the finish order, if it was requested.
    #[must_use]
    pub fn postorder(&self) -> Option<&[V]> {
        self.postorder.as_deref()
    }

    /// Returns every vertex reached by the traversal.
    #[must_use]
    pub fn visited(&self) -> &HashSet<V> {
        &self.visited
    }

    /// Returns `true` if `vertex` is reachable from the entry.
    #[must_use]
    pub fn is_reachable(&self, vertex: V) -> bool {
        self.visited.contains(&vertex)
    }
}

/// Returns the vertices reachable from `entry` in discovery order.
pub fn preorder<G: Successors>(graph: &G, entry: G::Vertex) -> Vec<G::Vertex> {
    SimpleDfs::new(graph, entry, DfsOrder::PRE)
        .preorder
        .unwrap_or_default()
}

/// Returns the vertices reachable from `entry` in finish order.
pub fn postorder<G: Successors>(graph: &G, entry: G::Vertex) -> Vec<G::Vertex> {
    SimpleDfs::new(graph, entry, DfsOrder::POST)
        .postorder
        .unwrap_or_default()
}

/// Returns the vertices reachable from `entry` in reverse finish order.
///
/// In an acyclic graph every vertex appears before all of its successors.
pub fn reverse_postorder<G: Successors>(graph: &G, entry: G::Vertex) -> Vec<G::Vertex> {
    let mut order = postorder(graph, entry);
    order.reverse();
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::{FlowEdge, FlowEdgeKind},
        utils::graph::{FlowGraph, Transposed},
    };

    type Graph = FlowGraph<usize, FlowEdge<usize>>;

    fn build(vertices: usize, edges: &[(usize, usize)]) -> Graph {
        let mut graph = Graph::new();
        for v in 0..vertices {
            graph.add_vertex(v);
        }
        for &(src, dst) in edges {
            graph
                .add_edge(FlowEdge::new(src, dst, FlowEdgeKind::ConditionalJump))
                .unwrap();
        }
        graph
    }

    #[test]
    fn test_diamond_orders() {
        // 0 -> 1 -> 3, 0 -> 2 -> 3
        let graph = build(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let dfs = SimpleDfs::new(&graph, 0, DfsOrder::PRE | DfsOrder::POST);

        assert_eq!(dfs.preorder().unwrap(), &[0, 1, 3, 2]);
        assert_eq!(dfs.postorder().unwrap(), &[3, 1, 2, 0]);
        assert_eq!(reverse_postorder(&graph, 0), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_cycle_visits_each_vertex_once() {
        // 0 -> 1 -> 2 -> 1, 2 -> 0
        let graph = build(3, &[(0, 1), (1, 2), (2, 1), (2, 0)]);
        let dfs = SimpleDfs::new(&graph, 0, DfsOrder::PRE | DfsOrder::POST);

        assert_eq!(dfs.preorder().unwrap(), &[0, 1, 2]);
        assert_eq!(dfs.postorder().unwrap(), &[2, 1, 0]);
        assert_eq!(dfs.visited().len(), 3);
    }

    #[test]
    fn test_self_loop() {
        let graph = build(1, &[(0, 0)]);
        assert_eq!(preorder(&graph, 0), vec![0]);
        assert_eq!(postorder(&graph, 0), vec![0]);
    }

    #[test]
    fn test_no_orders_still_tracks_reachability() {
        let graph = build(4, &[(0, 1), (2, 3)]);
        let dfs = SimpleDfs::new(&graph, 0, DfsOrder::empty());

        assert!(dfs.preorder().is_none());
        assert!(dfs.postorder().is_none());
        assert!(dfs.is_reachable(1));
        assert!(!dfs.is_reachable(2));
    }

    #[test]
    fn test_unknown_entry() {
        let graph = build(1, &[]);
        assert_eq!(preorder(&graph, 42), vec![42]);
    }

    #[test]
    fn test_transposed_traversal() {
        let graph = build(3, &[(0, 1), (1, 2)]);
        assert_eq!(preorder(&Transposed::new(&graph), 2), vec![2, 1, 0]);
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let depth = 100_000;
        let edges: Vec<(usize, usize)> = (0..depth - 1).map(|v| (v, v + 1)).collect();
        let graph = build(depth, &edges);

        let order = postorder(&graph, 0);
        assert_eq!(order.len(), depth);
        assert_eq!(order[0], depth - 1);
    }
}
