//! Generic directed multigraph infrastructure for program analysis.
//!
//! This module provides the mutable graph used underneath control flow graphs, statement
//! graphs, the type hierarchy and the call graph. Unlike an append-only graph, a
//! [`FlowGraph`] supports edge and vertex removal as well as the two splice primitives that
//! IR transforms rely on, [`FlowGraph::excavate`] and [`FlowGraph::jam`].
//!
//! # Architecture
//!
//! - **Vertices**: any [`Vertex`] (a `Copy` handle into an arena owned elsewhere)
//! - **Edges**: any [`GraphEdge`] value that knows its endpoints and how to be retargeted
//! - **Storage**: [`FlowGraph`] keeps forward and reverse adjacency for every vertex
//! - **Traits**: [`GraphBase`], [`Successors`], [`Predecessors`] let algorithms run over
//!   any graph, including the [`Transposed`] view
//! - **Algorithms**: iterative depth-first traversal in [`algorithms`]
//!
//! # Invariants
//!
//! Reverse adjacency is always the exact transpose of forward adjacency. Every mutation
//! updates both sides before returning, so there is no observable state where an edge is
//! present in only one direction.
//!
//! # Usage Examples
//!
//! ```rust
//! use flowscope::analysis::{BlockId, FlowEdge, FlowEdgeKind};
//! use flowscope::utils::graph::{FlowGraph, GraphEdge};
//!
//! let (a, b, c) = (BlockId::new(0), BlockId::new(1), BlockId::new(2));
//! let mut graph: FlowGraph<BlockId, FlowEdge<BlockId>> = FlowGraph::new();
//! for v in [a, b, c] {
//!     graph.add_vertex(v);
//! }
//! graph.add_edge(FlowEdge::new(a, b, FlowEdgeKind::Immediate))?;
//! graph.add_edge(FlowEdge::new(b, c, FlowEdgeKind::Immediate))?;
//!
//! // Splice `b` out, `a` now flows straight into `c`
//! assert!(graph.excavate(b)?);
//! assert_eq!(graph.edges(a)[0].dst(), c);
//! assert_eq!(graph.reverse_edges(c)[0].src(), a);
//! # Ok::<(), flowscope::Error>(())
//! ```

mod edge;
mod flow;
mod node;
mod traits;
mod transpose;

pub mod algorithms;

pub use edge::GraphEdge;
pub use flow::FlowGraph;
pub use node::Vertex;
pub use traits::{GraphBase, MutableGraph, Predecessors, Successors};
pub use transpose::Transposed;
