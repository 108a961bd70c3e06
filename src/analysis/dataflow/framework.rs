//! Data flow analysis framework traits.
//!
//! This module defines the core abstraction for data flow analyses. Any specific analysis
//! (reaching definitions, live locals) implements [`DataAnalysis`] to work with the
//! [`DataflowSolver`](super::DataflowSolver).
//!
//! # Direction
//!
//! The framework only knows one direction: information flows from a vertex to its
//! successors. Backward analyses run over a [`Transposed`] view of their graph, which
//! swaps successors and predecessors without copying anything.

use std::fmt::Debug;

use crate::{
    analysis::{
        cfg::FlowEdge,
        ssa::{StatementGraph, StmtId},
    },
    utils::graph::{FlowGraph, GraphEdge, Predecessors, Successors, Transposed, Vertex},
};

/// A graph a data flow analysis can run on.
///
/// In addition to successor traversal, the solver needs to know for every edge whether
/// it is exceptional, since states crossing into a handler go through
/// [`DataAnalysis::flow_exception`] rather than [`DataAnalysis::flow_through`].
pub trait DataflowGraph: Successors {
    /// Returns `(predecessor, is_exceptional)` for every incoming edge of `vertex`.
    fn incoming(&self, vertex: Self::Vertex) -> impl Iterator<Item = (Self::Vertex, bool)>;

    /// Returns `(successor, is_exceptional)` for every outgoing edge of `vertex`.
    fn outgoing(&self, vertex: Self::Vertex) -> impl Iterator<Item = (Self::Vertex, bool)>;
}

impl<V: Vertex, E: GraphEdge<Vertex = V>> DataflowGraph for FlowGraph<V, E> {
    fn incoming(&self, vertex: V) -> impl Iterator<Item = (V, bool)> {
        self.reverse_edges(vertex)
            .iter()
            .map(|edge| (edge.src(), edge.is_exceptional()))
    }

    fn outgoing(&self, vertex: V) -> impl Iterator<Item = (V, bool)> {
        self.edges(vertex)
            .iter()
            .map(|edge| (edge.dst(), edge.is_exceptional()))
    }
}

impl DataflowGraph for StatementGraph {
    fn incoming(&self, vertex: StmtId) -> impl Iterator<Item = (StmtId, bool)> {
        self.graph()
            .reverse_edges(vertex)
            .iter()
            .map(|edge: &FlowEdge<StmtId>| (edge.src, edge.kind.is_exceptional()))
    }

    fn outgoing(&self, vertex: StmtId) -> impl Iterator<Item = (StmtId, bool)> {
        self.graph()
            .edges(vertex)
            .iter()
            .map(|edge: &FlowEdge<StmtId>| (edge.dst, edge.kind.is_exceptional()))
    }
}

impl<G: DataflowGraph + Predecessors> DataflowGraph for Transposed<'_, G> {
    fn incoming(&self, vertex: Self::Vertex) -> impl Iterator<Item = (Self::Vertex, bool)> {
        self.inner().outgoing(vertex)
    }

    fn outgoing(&self, vertex: Self::Vertex) -> impl Iterator<Item = (Self::Vertex, bool)> {
        self.inner().incoming(vertex)
    }
}

/// A data flow analysis over the graph type `G`.
///
/// Implementations provide the state lattice and the transfer function; the solver
/// handles iteration to a fixed point.
///
/// # Transfer Functions
///
/// For every vertex `v` the solver computes
///
/// ```text
/// in[v]  = merge over incoming edges (p, v) of flow(out[p])
/// out[v] = execute(v, in[v])
/// ```
///
/// where `flow` is [`flow_exception`](Self::flow_exception) for exceptional edges and
/// [`flow_through`](Self::flow_through) otherwise. Entry vertices start the merge from
/// [`new_entry_state`](Self::new_entry_state) instead of
/// [`new_state`](Self::new_state).
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeSet;
///
/// use flowscope::analysis::dataflow::{DataAnalysis, DataflowGraph};
///
/// /// Collects every vertex on some path from the entry.
/// struct Paths;
///
/// impl<G: DataflowGraph<Vertex = usize>> DataAnalysis<G> for Paths {
///     type State = BTreeSet<usize>;
///
///     fn new_state(&self) -> Self::State {
///         BTreeSet::new()
///     }
///
///     fn new_entry_state(&self) -> Self::State {
///         BTreeSet::new()
///     }
///
///     fn equals(&self, a: &Self::State, b: &Self::State) -> bool {
///         a == b
///     }
///
///     fn merge(&self, into: &mut Self::State, from: &Self::State) {
///         into.extend(from.iter().copied());
///     }
///
///     fn execute(&self, _graph: &G, vertex: usize, input: &Self::State) -> Self::State {
///         let mut out = input.clone();
///         out.insert(vertex);
///         out
///     }
/// }
/// ```
pub trait DataAnalysis<G: DataflowGraph> {
    /// The abstract state attached to the entry and exit of every vertex.
    type State: Clone + Debug;

    /// Returns the state every vertex starts with.
    fn new_state(&self) -> Self::State;

    /// Returns the state entry vertices start with.
    fn new_entry_state(&self) -> Self::State;

    /// Overwrites `dst` with `src`.
    fn copy(&self, src: &Self::State, dst: &mut Self::State) {
        dst.clone_from(src);
    }

    /// Returns `true` if two states are equal. Convergence is decided by this.
    fn equals(&self, a: &Self::State, b: &Self::State) -> bool;

    /// Merges `from` into `into`.
    fn merge(&self, into: &mut Self::State, from: &Self::State);

    /// Transforms the out state of `src` as it crosses a normal edge into `dst`.
    fn flow_through(&self, src: G::Vertex, dst: G::Vertex, state: &Self::State) -> Self::State {
        let _ = (src, dst);
        let mut flowed = self.new_state();
        self.copy(state, &mut flowed);
        flowed
    }

    /// Transforms the out state of `src` as it crosses an exception edge into `dst`.
    fn flow_exception(
        &self,
        src: G::Vertex,
        dst: G::Vertex,
        state: &Self::State,
    ) -> Self::State {
        let _ = (src, dst);
        let mut flowed = self.new_state();
        self.copy(state, &mut flowed);
        flowed
    }

    /// Computes the out state of `vertex` from its in state.
    fn execute(&self, graph: &G, vertex: G::Vertex, input: &Self::State) -> Self::State;
}
