//! Worklist-based data flow solver.
//!
//! This module provides the iterative solver that computes fixed points for data flow
//! analyses.
//!
//! # Algorithm
//!
//! 1. Initialize every vertex with the analysis' zero state, in and out
//! 2. Queue the vertices reachable from the entries in reverse postorder, then the rest
//! 3. While the queue is non-empty:
//!    a. Pop a vertex
//!    b. Merge the flowed out states of its predecessors into a fresh in state
//!    c. Apply the transfer function to get the out state
//!    d. If the out state changed, queue every successor
//!
//! # Incremental Use
//!
//! The solver never holds on to the graph. Between solves the caller may mutate the
//! graph, [`remove`](DataflowSolver::remove) stale vertices and
//! [`append_queue`](DataflowSolver::append_queue) the affected ones, then
//! [`commit`](DataflowSolver::commit) again to reach the new fixed point.

use std::{
    collections::{BTreeSet, HashMap, HashSet, VecDeque},
    marker::PhantomData,
};

use crate::{
    analysis::dataflow::{DataAnalysis, DataflowGraph},
    utils::graph::algorithms::reverse_postorder,
};

/// Worklist-based data flow solver.
///
/// # Usage
///
/// ```rust
/// use std::collections::BTreeSet;
///
/// use flowscope::analysis::dataflow::{DataAnalysis, DataflowGraph, DataflowSolver};
/// use flowscope::analysis::{FlowEdge, FlowEdgeKind};
/// use flowscope::utils::graph::FlowGraph;
///
/// struct Paths;
///
/// impl<G: DataflowGraph<Vertex = usize>> DataAnalysis<G> for Paths {
///     type State = BTreeSet<usize>;
///     fn new_state(&self) -> Self::State { BTreeSet::new() }
///     fn new_entry_state(&self) -> Self::State { BTreeSet::new() }
///     fn equals(&self, a: &Self::State, b: &Self::State) -> bool { a == b }
///     fn merge(&self, into: &mut Self::State, from: &Self::State) {
///         into.extend(from.iter().copied());
///     }
///     fn execute(&self, _: &G, vertex: usize, input: &Self::State) -> Self::State {
///         let mut out = input.clone();
///         out.insert(vertex);
///         out
///     }
/// }
///
/// let mut graph: FlowGraph<usize, FlowEdge<usize>> = FlowGraph::new();
/// for v in 0..3 {
///     graph.add_vertex(v);
/// }
/// graph.add_edge(FlowEdge::new(0, 1, FlowEdgeKind::Immediate))?;
/// graph.add_edge(FlowEdge::new(1, 2, FlowEdgeKind::Immediate))?;
///
/// let solver = DataflowSolver::with_commit(Paths, &graph, [0]);
/// assert_eq!(solver.out_state(2), Some(&BTreeSet::from([0, 1, 2])));
/// # Ok::<(), flowscope::Error>(())
/// ```
pub struct DataflowSolver<G: DataflowGraph, A: DataAnalysis<G>> {
    /// The analysis being solved.
    analysis: A,
    /// Input state for each vertex.
    in_states: HashMap<G::Vertex, A::State>,
    /// Output state for each vertex.
    out_states: HashMap<G::Vertex, A::State>,
    /// Vertices waiting to be processed.
    queue: VecDeque<G::Vertex>,
    /// Whether each vertex is currently queued (for deduplication).
    queued: HashSet<G::Vertex>,
    /// Vertices that start from the entry state.
    entries: HashSet<G::Vertex>,
    /// Number of vertex evaluations performed.
    iterations: usize,
    _graph: PhantomData<fn(&G)>,
}

impl<G: DataflowGraph, A: DataAnalysis<G>> DataflowSolver<G, A> {
    /// Creates a solver with no states and an empty queue.
    #[must_use]
    pub fn new(analysis: A) -> Self {
        Self {
            analysis,
            in_states: HashMap::new(),
            out_states: HashMap::new(),
            queue: VecDeque::new(),
            queued: HashSet::new(),
            entries: HashSet::new(),
            iterations: 0,
            _graph: PhantomData,
        }
    }

    /// Creates a solver, initializes it for `graph` and runs it to a fixed point.
    pub fn with_commit(
        analysis: A,
        graph: &G,
        entries: impl IntoIterator<Item = G::Vertex>,
    ) -> Self {
        let mut solver = Self::new(analysis);
        solver.init(graph, entries);
        solver.commit(graph);
        solver
    }

    /// Resets every state and queues every vertex of `graph`.
    ///
    /// Vertices reachable from `entries` are queued in reverse postorder so that, in the
    /// absence of back edges, each vertex is processed after all of its predecessors.
    pub fn init(&mut self, graph: &G, entries: impl IntoIterator<Item = G::Vertex>) {
        self.in_states.clear();
        self.out_states.clear();
        self.queue.clear();
        self.queued.clear();
        self.entries = entries.into_iter().collect();

        for vertex in graph.vertices() {
            let state = if self.entries.contains(&vertex) {
                self.analysis.new_entry_state()
            } else {
                self.analysis.new_state()
            };
            self.in_states.insert(vertex, state);
            self.out_states.insert(vertex, self.analysis.new_state());
        }

        let mut entries: Vec<G::Vertex> = self.entries.iter().copied().collect();
        entries.sort_unstable();
        for entry in entries {
            for vertex in reverse_postorder(graph, entry) {
                self.append_queue(vertex);
            }
        }
        for vertex in graph.vertices() {
            self.append_queue(vertex);
        }
    }

    /// Queues `vertex` unless it is already queued.
    pub fn append_queue(&mut self, vertex: G::Vertex) {
        if self.queued.insert(vertex) {
            self.queue.push_back(vertex);
        }
    }

    /// Forgets every state of `vertex` and drops it from the queue.
    pub fn remove(&mut self, vertex: G::Vertex) {
        self.in_states.remove(&vertex);
        self.out_states.remove(&vertex);
        self.entries.remove(&vertex);
        if self.queued.remove(&vertex) {
            self.queue.retain(|queued| *queued != vertex);
        }
    }

    /// Marks `vertex` as an entry, so its merge starts from the entry state.
    pub fn add_entry(&mut self, vertex: G::Vertex) {
        self.entries.insert(vertex);
    }

    /// Recomputes the in and out state of `vertex`.
    ///
    /// Successors are queued if the out state changed. Returns `true` in that case.
    pub fn process(&mut self, graph: &G, vertex: G::Vertex) -> bool {
        self.iterations += 1;

        let mut input = if self.entries.contains(&vertex) {
            self.analysis.new_entry_state()
        } else {
            self.analysis.new_state()
        };
        for (pred, exceptional) in graph.incoming(vertex) {
            let Some(pred_out) = self.out_states.get(&pred) else {
                continue;
            };
            let flowed = if exceptional {
                self.analysis.flow_exception(pred, vertex, pred_out)
            } else {
                self.analysis.flow_through(pred, vertex, pred_out)
            };
            self.analysis.merge(&mut input, &flowed);
        }

        let output = self.analysis.execute(graph, vertex, &input);
        self.in_states.insert(vertex, input);

        let changed = self
            .out_states
            .get(&vertex)
            .is_none_or(|previous| !self.analysis.equals(previous, &output));
        self.out_states.insert(vertex, output);

        if changed {
            for succ in graph.successors(vertex) {
                self.append_queue(succ);
            }
        }
        changed
    }

    /// Drains the queue, reaching a fixed point.
    ///
    /// Returns the vertices whose in state differs from the one they had before.
    pub fn commit(&mut self, graph: &G) -> BTreeSet<G::Vertex> {
        let mut changed = BTreeSet::new();
        while let Some(vertex) = self.queue.pop_front() {
            self.queued.remove(&vertex);

            let before = self.in_states.get(&vertex).cloned();
            self.process(graph, vertex);
            let differs = match (before.as_ref(), self.in_states.get(&vertex)) {
                (Some(before), Some(after)) => !self.analysis.equals(before, after),
                _ => true,
            };
            if differs {
                changed.insert(vertex);
            }
        }
        changed
    }

    /// Returns the in state of `vertex`.
    #[must_use]
    pub fn in_state(&self, vertex: G::Vertex) -> Option<&A::State> {
        self.in_states.get(&vertex)
    }

    /// Returns the out state of `vertex`.
    #[must_use]
    pub fn out_state(&self, vertex: G::Vertex) -> Option<&A::State> {
        self.out_states.get(&vertex)
    }

    /// Returns `true` if `vertex` is waiting to be processed.
    #[must_use]
    pub fn is_queued(&self, vertex: G::Vertex) -> bool {
        self.queued.contains(&vertex)
    }

    /// Returns the number of vertex evaluations performed so far.
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }

    /// Returns the analysis.
    #[must_use]
    pub const fn analysis(&self) -> &A {
        &self.analysis
    }

    /// Consumes the solver, returning the in and out state maps.
    #[must_use]
    pub fn into_states(self) -> (HashMap<G::Vertex, A::State>, HashMap<G::Vertex, A::State>) {
        (self.in_states, self.out_states)
    }
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

    /// Collects the set of vertices on some path to each vertex.
    struct Paths;

    impl<G: DataflowGraph<Vertex = usize>> DataAnalysis<G> for Paths {
        type State = BTreeSet<usize>;

        fn new_state(&self) -> Self::State {
            BTreeSet::new()
        }

        fn new_entry_state(&self) -> Self::State {
            BTreeSet::new()
        }

        fn equals(&self, a: &Self::State, b: &Self::State) -> bool {
            a == b
        }

        fn merge(&self, into: &mut Self::State, from: &Self::State) {
            into.extend(from.iter().copied());
        }

        fn execute(&self, _graph: &G, vertex: usize, input: &Self::State) -> Self::State {
            let mut out = input.clone();
            out.insert(vertex);
            out
        }
    }

    /// Counts exception edges crossed instead of vertices visited.
    struct Handlers;

    impl DataAnalysis<Graph> for Handlers {
        type State = u32;

        fn new_state(&self) -> u32 {
            0
        }

        fn new_entry_state(&self) -> u32 {
            0
        }

        fn equals(&self, a: &u32, b: &u32) -> bool {
            a == b
        }

        fn merge(&self, into: &mut u32, from: &u32) {
            *into = (*into).max(*from);
        }

        fn flow_exception(&self, _src: usize, _dst: usize, state: &u32) -> u32 {
            state + 1
        }

        fn execute(&self, _graph: &Graph, _vertex: usize, input: &u32) -> u32 {
            *input
        }
    }

    #[test]
    fn test_loop_reaches_fixed_point() {
        // 0 -> 1 -> 2 -> 1, 2 -> 3
        let graph = build(4, &[(0, 1), (1, 2), (2, 1), (2, 3)]);
        let solver = DataflowSolver::with_commit(Paths, &graph, [0]);

        assert_eq!(solver.in_state(1), Some(&BTreeSet::from([0, 1, 2])));
        assert_eq!(solver.out_state(3), Some(&BTreeSet::from([0, 1, 2, 3])));
        assert!(solver.iterations() >= graph.vertex_count());
    }

    #[test]
    fn test_commit_twice_is_stable() {
        let graph = build(3, &[(0, 1), (1, 2), (2, 0)]);
        let mut solver = DataflowSolver::with_commit(Paths, &graph, [0]);
        let before = solver.iterations();

        assert!(solver.commit(&graph).is_empty());
        assert_eq!(solver.iterations(), before);

        solver.append_queue(1);
        assert!(solver.commit(&graph).is_empty());
        assert_eq!(solver.iterations(), before + 1);
    }

    #[test]
    fn test_unreachable_vertices_still_processed() {
        let graph = build(3, &[(0, 1)]);
        let solver = DataflowSolver::with_commit(Paths, &graph, [0]);
        assert_eq!(solver.out_state(2), Some(&BTreeSet::from([2])));
    }

    #[test]
    fn test_append_queue_idempotent_and_remove() {
        let graph = build(2, &[(0, 1)]);
        let mut solver = DataflowSolver::new(Paths);
        solver.init(&graph, [0]);
        solver.commit(&graph);

        solver.append_queue(1);
        solver.append_queue(1);
        assert!(solver.is_queued(1));
        solver.remove(1);
        assert!(!solver.is_queued(1));
        assert!(solver.in_state(1).is_none());
        assert!(solver.commit(&graph).is_empty());
    }

    #[test]
    fn test_commit_reports_changed_in_states() {
        let mut graph = build(3, &[(0, 1), (1, 2)]);
        let mut solver = DataflowSolver::with_commit(Paths, &graph, [0]);

        graph.remove_edge(&FlowEdge::new(0, 1, FlowEdgeKind::ConditionalJump));
        solver.append_queue(1);
        let changed = solver.commit(&graph);

        assert_eq!(changed, BTreeSet::from([1, 2]));
        assert_eq!(solver.out_state(2), Some(&BTreeSet::from([1, 2])));
    }

    #[test]
    fn test_exception_edges_use_flow_exception() {
        let mut graph = build(3, &[(0, 1)]);
        graph.add_edge(FlowEdge::exception(1, 2, None, 0)).unwrap();
        let solver = DataflowSolver::with_commit(Handlers, &graph, [0]);
        assert_eq!(solver.in_state(1), Some(&0));
        assert_eq!(solver.in_state(2), Some(&1));
    }

    #[test]
    fn test_backward_over_transposed() {
        // 0 -> 1 -> 2; backward from 2
        let graph = build(3, &[(0, 1), (1, 2)]);
        let reversed = Transposed::new(&graph);
        let solver = DataflowSolver::with_commit(Paths, &reversed, [2]);
        assert_eq!(solver.out_state(0), Some(&BTreeSet::from([0, 1, 2])));
        assert_eq!(solver.out_state(2), Some(&BTreeSet::from([2])));
    }
}
