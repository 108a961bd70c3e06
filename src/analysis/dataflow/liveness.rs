//! Live locals analysis.
//!
//! A local is *live* at a program point if there exists a path from that point to a read
//! of the local that doesn't pass through a definition of it.
//!
//! # Uses
//!
//! - **Dead code elimination**: a definition whose local is not live after it is dead
//! - **Local compaction**: locals never live at the same time can share a slot
//!
//! # Algorithm
//!
//! This is a backward data flow analysis, run forward over the [`Transposed`] statement
//! graph with the exits as entries:
//!
//! - `OUT[s]` = ∪{IN[t] | t is a successor of s}
//! - `IN[s]` = READS[s] ∪ (OUT[s] - DEF[s])

use std::collections::{BTreeSet, HashMap};

use crate::{
    analysis::{
        dataflow::{DataAnalysis, DataflowSolver},
        ssa::{Expr, Local, Statement, StatementGraph, StmtId},
    },
    utils::graph::Transposed,
};

/// Backward liveness over a transposed statement graph.
///
/// Since the solver runs over the reversed graph, its "in" state is the live-out set of a
/// statement and its "out" state the live-in set.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveLocalsAnalysis;

impl<'g> DataAnalysis<Transposed<'g, StatementGraph>> for LiveLocalsAnalysis {
    type State = BTreeSet<Local>;

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

    fn execute(
        &self,
        graph: &Transposed<'g, StatementGraph>,
        vertex: StmtId,
        live_out: &Self::State,
    ) -> Self::State {
        let Some(stmt) = graph.inner().statement(vertex) else {
            return live_out.clone();
        };
        let mut live_in = live_out.clone();
        if let Some(local) = stmt.defined_local() {
            live_in.remove(&local);
        }
        live_in.extend(stmt.reads());
        live_in
    }
}

/// Live locals of every statement of a [`StatementGraph`].
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::dataflow::LiveLocals;
/// use flowscope::analysis::{Constant, ControlFlowGraph, Local, Statement, StatementGraph, StmtId};
///
/// let (x, y) = (Local::variable(0), Local::variable(1));
/// let mut cfg = ControlFlowGraph::new();
/// let block = cfg.add_block("A");
/// cfg.block_mut(block).unwrap().push(Statement::copy(x, Constant::Int(1)));
/// cfg.block_mut(block).unwrap().push(Statement::copy(y, Constant::Int(2)));
/// cfg.block_mut(block).unwrap().push(Statement::Return(Some(x.into())));
///
/// let graph = StatementGraph::from_cfg(&cfg)?;
/// let live = LiveLocals::compute(&graph);
/// assert!(live.is_live_out(StmtId::new(0), x));
/// assert_eq!(live.dead_definitions(&graph), vec![StmtId::new(1)]);
/// # Ok::<(), flowscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct LiveLocals {
    live_in: HashMap<StmtId, BTreeSet<Local>>,
    live_out: HashMap<StmtId, BTreeSet<Local>>,
    iterations: usize,
}

impl LiveLocals {
    /// Solves liveness for `graph`.
    #[must_use]
    pub fn compute(graph: &StatementGraph) -> Self {
        let reversed = Transposed::new(graph);
        let solver = DataflowSolver::with_commit(LiveLocalsAnalysis, &reversed, graph.exits());
        let iterations = solver.iterations();
        let (live_out, live_in) = solver.into_states();
        Self {
            live_in,
            live_out,
            iterations,
        }
    }

    /// Returns the locals live right before `stmt` executes.
    #[must_use]
    pub fn live_in(&self, stmt: StmtId) -> Option<&BTreeSet<Local>> {
        self.live_in.get(&stmt)
    }

    /// Returns the locals live right after `stmt` executes.
    #[must_use]
    pub fn live_out(&self, stmt: StmtId) -> Option<&BTreeSet<Local>> {
        self.live_out.get(&stmt)
    }

    /// Returns `true` if `local` is live right after `stmt`.
    #[must_use]
    pub fn is_live_out(&self, stmt: StmtId, local: Local) -> bool {
        self.live_out(stmt).is_some_and(|live| live.contains(&local))
    }

    /// Returns the definitions whose local is never read afterwards, in statement order.
    ///
    /// Only plain copies of local reads and constants are reported; a definition whose
    /// value comes from an invocation or operation may still be needed for its effects.
    #[must_use]
    pub fn dead_definitions(&self, graph: &StatementGraph) -> Vec<StmtId> {
        graph
            .statements()
            .filter(|(_, stmt)| match stmt {
                Statement::Copy { expr, .. } => {
                    matches!(expr, Expr::Local(_) | Expr::Constant(_))
                }
                Statement::CopyPhi { .. } => true,
                _ => false,
            })
            .filter(|(id, stmt)| {
                stmt.defined_local()
                    .is_some_and(|local| !self.is_live_out(*id, local))
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Returns the number of statement evaluations the solver performed.
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }
}
