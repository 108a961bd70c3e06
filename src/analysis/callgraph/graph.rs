//! Call graph representation.
//!
//! The [`CallGraph`] records, for every traced method, the methods its invocations were
//! resolved to. It is built by the [`CallGraphBuilder`](super::CallGraphBuilder) and stored
//! in a [`FlowGraph`], so the generic traversal algorithms apply to it directly.

use std::{collections::BTreeSet, fmt};

use crate::{
    analysis::ssa::InvokeKind,
    program::MethodId,
    utils::graph::{algorithms::preorder, FlowGraph, GraphBase, GraphEdge, Predecessors, Successors},
    Result,
};

/// A resolved call from `caller` to `callee`.
///
/// Calls with the same endpoints but a different dispatch kind are kept as parallel edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallEdge {
    /// The calling method.
    pub caller: MethodId,
    /// The resolved target.
    pub callee: MethodId,
    /// Dispatch kind of the invocation.
    pub kind: InvokeKind,
}

impl GraphEdge for CallEdge {
    type Vertex = MethodId;

    fn src(&self) -> MethodId {
        self.caller
    }

    fn dst(&self) -> MethodId {
        self.callee
    }

    fn with_endpoints(&self, src: MethodId, dst: MethodId) -> Result<Self> {
        Ok(Self {
            caller: src,
            callee: dst,
            kind: self.kind,
        })
    }
}

impl fmt::Display for CallEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -{}-> {}", self.caller, self.kind, self.callee)
    }
}

/// Inter-procedural call graph.
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::callgraph::CallGraph;
/// use flowscope::analysis::InvokeKind;
/// use flowscope::program::MethodId;
///
/// let (main, helper) = (MethodId::new(0), MethodId::new(1));
/// let mut graph = CallGraph::new();
/// graph.add_call(main, helper, InvokeKind::Static)?;
///
/// assert_eq!(graph.callees(main), vec![helper]);
/// assert_eq!(graph.callers(helper), vec![main]);
/// assert_eq!(graph.entry_points(), vec![main]);
/// # Ok::<(), flowscope::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    graph: FlowGraph<MethodId, CallEdge>,
    pub(crate) call_sites: usize,
    pub(crate) resolved_sites: usize,
    pub(crate) virtual_sites: usize,
    pub(crate) polymorphic_sites: usize,
}

impl CallGraph {
    /// Creates an empty call graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a method without calls, returning `false` if it was already present.
    pub fn add_method(&mut self, method: MethodId) -> bool {
        self.graph.add_vertex(method)
    }

    /// Records a call, adding both methods if needed.
    ///
    /// Returns `false` if the same call was already recorded.
    ///
    /// # Errors
    ///
    /// Propagates graph errors; none occur once both endpoints exist.
    pub fn add_call(&mut self, caller: MethodId, callee: MethodId, kind: InvokeKind) -> Result<bool> {
        self.graph.add_vertex(caller);
        self.graph.add_vertex(callee);
        self.graph.add_edge(CallEdge {
            caller,
            callee,
            kind,
        })
    }

    /// Returns `true` if `method` was traced or called.
    #[must_use]
    pub fn contains(&self, method: MethodId) -> bool {
        self.graph.contains_vertex(method)
    }

    /// Returns every method of the graph, in the order they were added.
    pub fn methods(&self) -> impl Iterator<Item = MethodId> + '_ {
        self.graph.vertices()
    }

    /// Returns the number of methods.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.graph.vertex_count()
    }

    /// Returns the number of call edges.
    ///
    /// Repeated calls from one caller to one callee with the same kind count once.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns the outgoing call edges of `method`.
    #[must_use]
    pub fn calls_from(&self, method: MethodId) -> &[CallEdge] {
        self.graph.edges(method)
    }

    /// Returns the incoming call edges of `method`.
    #[must_use]
    pub fn calls_to(&self, method: MethodId) -> &[CallEdge] {
        self.graph.reverse_edges(method)
    }

    /// Returns the distinct methods called by `caller`, in handle order.
    #[must_use]
    pub fn callees(&self, caller: MethodId) -> Vec<MethodId> {
        self.graph
            .successors(caller)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Returns the distinct methods calling `callee`, in handle order.
    #[must_use]
    pub fn callers(&self, callee: MethodId) -> Vec<MethodId> {
        self.graph
            .predecessors(callee)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Returns the methods no other method calls.
    #[must_use]
    pub fn entry_points(&self) -> Vec<MethodId> {
        self.methods()
            .filter(|&method| self.calls_to(method).is_empty())
            .collect()
    }

    /// Returns the methods that call nothing.
    #[must_use]
    pub fn leaf_methods(&self) -> Vec<MethodId> {
        self.methods()
            .filter(|&method| self.calls_from(method).is_empty())
            .collect()
    }

    /// Returns every method reachable from `method` through calls, including itself.
    #[must_use]
    pub fn reachable_from(&self, method: MethodId) -> Vec<MethodId> {
        if !self.contains(method) {
            return Vec::new();
        }
        preorder(&self.graph, method)
    }

    /// Returns `true` if `method` can reach itself through one or more calls.
    #[must_use]
    pub fn is_recursive(&self, method: MethodId) -> bool {
        self.callees(method)
            .into_iter()
            .any(|callee| callee == method || self.reachable_from(callee).contains(&method))
    }

    /// Returns the methods involved in direct or mutual recursion.
    #[must_use]
    pub fn recursive_methods(&self) -> Vec<MethodId> {
        self.methods()
            .filter(|&method| self.is_recursive(method))
            .collect()
    }

    /// Returns the underlying graph.
    #[must_use]
    pub const fn graph(&self) -> &FlowGraph<MethodId, CallEdge> {
        &self.graph
    }

    /// Returns statistics about the graph and the call sites that built it.
    #[must_use]
    pub fn stats(&self) -> CallGraphStats {
        CallGraphStats {
            method_count: self.method_count(),
            edge_count: self.edge_count(),
            total_call_sites: self.call_sites,
            virtual_calls: self.virtual_sites,
            resolved_calls: self.resolved_sites,
            polymorphic_calls: self.polymorphic_sites,
            entry_points: self.entry_points().len(),
            leaf_methods: self.leaf_methods().len(),
            recursive_methods: self.recursive_methods().len(),
        }
    }
}

impl GraphBase for CallGraph {
    type Vertex = MethodId;

    fn vertex_count(&self) -> usize {
        self.graph.vertex_count()
    }

    fn vertices(&self) -> impl Iterator<Item = MethodId> {
        self.graph.vertices()
    }
}

impl Successors for CallGraph {
    fn successors(&self, vertex: MethodId) -> impl Iterator<Item = MethodId> {
        self.graph.successors(vertex)
    }
}

impl Predecessors for CallGraph {
    fn predecessors(&self, vertex: MethodId) -> impl Iterator<Item = MethodId> {
        self.graph.predecessors(vertex)
    }
}

/// Statistics about a call graph.
#[derive(Debug, Clone, Default)]
pub struct CallGraphStats {
    /// Number of methods (nodes) in the graph.
    pub method_count: usize,
    /// Number of call edges between methods.
    pub edge_count: usize,
    /// Total number of call sites scanned in traced bodies.
    pub total_call_sites: usize,
    /// Number of virtual and interface call sites.
    pub virtual_calls: usize,
    /// Number of call sites with at least one resolved target.
    pub resolved_calls: usize,
    /// Number of call sites with more than one resolved target.
    pub polymorphic_calls: usize,
    /// Number of methods with no callers.
    pub entry_points: usize,
    /// Number of methods with no callees.
    pub leaf_methods: usize,
    /// Number of methods involved in direct or mutual recursion.
    pub recursive_methods: usize,
}

impl CallGraphStats {
    /// Returns the percentage of call sites resolved to at least one target.
    ///
    /// Returns 100.0 if there are no call sites.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn resolution_rate(&self) -> f64 {
        if self.total_call_sites == 0 {
            100.0
        } else {
            (self.resolved_calls as f64 / self.total_call_sites as f64) * 100.0
        }
    }
}
