//! Reaching definitions analysis.
//!
//! Reaching definitions computes, for each statement, which definitions of each local may
//! reach it without being killed by an intervening definition of the same local.
//!
//! # Algorithm
//!
//! The analysis runs forward over the [`StatementGraph`]. For a statement `s`:
//! - `IN[s]` = ∪{OUT[p] | p is a predecessor of s}
//! - `OUT[s]` = `IN[s]` with the definitions of the local `s` defines replaced by `{s}`
//!
//! A statement that defines nothing passes its input through unchanged.
//!
//! # Keeping Up With Changes
//!
//! [`ReachingDefinitionsAnalyser`] wraps the solver and listens for changes to the graph.
//! On every structural change it discards all states and solves again from scratch, then
//! reports which statements ended up with a different in state. Re-queueing only the
//! touched statements is not enough for a union analysis: a definition removed from one
//! side of a loop keeps circulating around the back edge forever.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{
    analysis::{
        dataflow::{DataAnalysis, DataflowSolver},
        ssa::{CodeListener, Local, StatementGraph, StmtId},
    },
    utils::graph::GraphBase,
    Result,
};

/// The definitions reaching a program point, grouped by local.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionSet(BTreeMap<Local, BTreeSet<StmtId>>);

impl DefinitionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the definitions of `local`.
    #[must_use]
    pub fn get(&self, local: Local) -> Option<&BTreeSet<StmtId>> {
        self.0.get(&local)
    }

    /// Kills every definition of `local` and records `stmt` as its only definition.
    pub fn define(&mut self, local: Local, stmt: StmtId) {
        self.0.insert(local, BTreeSet::from([stmt]));
    }

    /// Adds every definition of `other`.
    pub fn union(&mut self, other: &DefinitionSet) {
        for (local, defs) in &other.0 {
            self.0.entry(*local).or_default().extend(defs.iter().copied());
        }
    }

    /// Returns the locals with at least one reaching definition.
    pub fn locals(&self) -> impl Iterator<Item = Local> + '_ {
        self.0.keys().copied()
    }

    /// Returns `true` if no definition reaches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Forward reaching definitions over a statement graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReachingDefinitions;

impl DataAnalysis<StatementGraph> for ReachingDefinitions {
    type State = DefinitionSet;

    fn new_state(&self) -> DefinitionSet {
        DefinitionSet::new()
    }

    fn new_entry_state(&self) -> DefinitionSet {
        DefinitionSet::new()
    }

    fn equals(&self, a: &DefinitionSet, b: &DefinitionSet) -> bool {
        a == b
    }

    fn merge(&self, into: &mut DefinitionSet, from: &DefinitionSet) {
        into.union(from);
    }

    fn execute(
        &self,
        graph: &StatementGraph,
        vertex: StmtId,
        input: &DefinitionSet,
    ) -> DefinitionSet {
        let mut output = input.clone();
        if let Some(local) = graph.statement(vertex).and_then(|stmt| stmt.defined_local()) {
            output.define(local, vertex);
        }
        output
    }
}

/// Reaching definitions kept in sync with a [`StatementGraph`].
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::dataflow::ReachingDefinitionsAnalyser;
/// use flowscope::analysis::{
///     Constant, ControlFlowGraph, Local, Statement, StatementGraph, StmtId,
/// };
///
/// let mut cfg = ControlFlowGraph::new();
/// let block = cfg.add_block("A");
/// let x = Local::variable(0);
/// cfg.block_mut(block).unwrap().push(Statement::copy(x, Constant::Int(1)));
/// cfg.block_mut(block).unwrap().push(Statement::copy(x, Constant::Int(2)));
/// cfg.block_mut(block).unwrap().push(Statement::Return(Some(x.into())));
///
/// let graph = StatementGraph::from_cfg(&cfg)?;
/// let definitions = ReachingDefinitionsAnalyser::new(&graph);
/// let reaching = definitions.definitions_at(StmtId::new(2), x).unwrap();
/// assert_eq!(reaching.iter().copied().collect::<Vec<_>>(), vec![StmtId::new(1)]);
/// # Ok::<(), flowscope::Error>(())
/// ```
pub struct ReachingDefinitionsAnalyser {
    solver: DataflowSolver<StatementGraph, ReachingDefinitions>,
    last_changed: BTreeSet<StmtId>,
}

impl ReachingDefinitionsAnalyser {
    /// Solves reaching definitions for `graph`.
    #[must_use]
    pub fn new(graph: &StatementGraph) -> Self {
        Self {
            solver: DataflowSolver::with_commit(ReachingDefinitions, graph, graph.entry()),
            last_changed: BTreeSet::new(),
        }
    }

    /// Returns the definitions reaching `stmt`, before it executes.
    #[must_use]
    pub fn in_state(&self, stmt: StmtId) -> Option<&DefinitionSet> {
        self.solver.in_state(stmt)
    }

    /// Returns the definitions reaching the point right after `stmt`.
    #[must_use]
    pub fn out_state(&self, stmt: StmtId) -> Option<&DefinitionSet> {
        self.solver.out_state(stmt)
    }

    /// Returns the definitions of `local` that reach `stmt`.
    #[must_use]
    pub fn definitions_at(&self, stmt: StmtId, local: Local) -> Option<&BTreeSet<StmtId>> {
        self.in_state(stmt)?.get(local)
    }

    /// Returns the statements whose in state changed during the last update.
    #[must_use]
    pub fn last_changed(&self) -> &BTreeSet<StmtId> {
        &self.last_changed
    }

    /// Returns the total number of statement evaluations performed.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.solver.iterations()
    }

    fn refresh(&mut self, graph: &StatementGraph) {
        let before: HashMap<StmtId, DefinitionSet> = graph
            .vertices()
            .filter_map(|stmt| self.solver.in_state(stmt).map(|state| (stmt, state.clone())))
            .collect();

        self.solver.init(graph, graph.entry());
        self.solver.commit(graph);

        self.last_changed = graph
            .vertices()
            .filter(|stmt| before.get(stmt) != self.solver.in_state(*stmt))
            .collect();
    }
}

impl CodeListener for ReachingDefinitionsAnalyser {
    fn insert(
        &mut self,
        graph: &StatementGraph,
        _pred: StmtId,
        _stmt: StmtId,
        _succ: StmtId,
    ) -> Result<()> {
        self.refresh(graph);
        Ok(())
    }

    fn post_remove(&mut self, graph: &StatementGraph, stmt: StmtId) -> Result<()> {
        self.solver.remove(stmt);
        self.refresh(graph);
        Ok(())
    }

    fn replaced(&mut self, graph: &StatementGraph, old: StmtId, _new: StmtId) -> Result<()> {
        self.solver.remove(old);
        self.refresh(graph);
        Ok(())
    }

    fn updated(&mut self, _graph: &StatementGraph, _stmt: StmtId) -> Result<()> {
        // Only phi arguments change in place; the defined local stays the same.
        self.last_changed.clear();
        Ok(())
    }
}
