//! Graph algorithms for program analysis.
//!
//! # Available Algorithms
//!
//! ## Traversal
//!
//! - [`SimpleDfs`] - Iterative depth-first search producing preorder and/or postorder
//! - [`preorder`] - Discovery order from an entry vertex
//! - [`postorder`] - Finish order from an entry vertex
//! - [`reverse_postorder`] - Reverse finish order, the usual iteration order for forward dataflow
//!
//! All traversals keep an explicit stack, so native stack usage does not depend on graph
//! depth, and they terminate on cyclic graphs.
//!
//! # Examples
//!
//! ```rust
//! use flowscope::analysis::{FlowEdge, FlowEdgeKind};
//! use flowscope::utils::graph::{algorithms, FlowGraph};
//!
//! let mut graph: FlowGraph<usize, FlowEdge<usize>> = FlowGraph::new();
//! for v in 0..3 {
//!     graph.add_vertex(v);
//! }
//! graph.add_edge(FlowEdge::new(0, 1, FlowEdgeKind::Immediate))?;
//! graph.add_edge(FlowEdge::new(1, 2, FlowEdgeKind::Immediate))?;
//! graph.add_edge(FlowEdge::new(2, 0, FlowEdgeKind::UnconditionalJump))?;
//!
//! assert_eq!(algorithms::preorder(&graph, 0), vec![0, 1, 2]);
//! assert_eq!(algorithms::postorder(&graph, 0), vec![2, 1, 0]);
//! # Ok::<(), flowscope::Error>(())
//! ```

mod traversal;

pub use traversal::{postorder, preorder, reverse_postorder, DfsOrder, SimpleDfs};
