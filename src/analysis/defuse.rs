//! Def-use chains kept in sync with a statement graph.
//!
//! This module provides [`DefUseAnalysis`], which links every definition to the statements
//! reading it and every read to the definitions that may have produced its value. Both
//! directions are derived from [`ReachingDefinitionsAnalyser`] results.
//!
//! # Records
//!
//! - **Uses**: for a defining statement, every statement with a read it may reach
//! - **Reads**: for a statement, every local read in evaluation order with its possible
//!   definitions
//!
//! The two views are exact mirrors: `u` is in the uses of `d` exactly when some read of
//! `u` lists `d` among its definitions.
//!
//! # Keeping Up With Changes
//!
//! [`DefUseAnalysis`] is a [`CodeListener`]. Pass it to the mutating methods of
//! [`StatementGraph`] and it updates its definitions first, then the records of the
//! statements downstream of the change and of every statement whose reaching definitions
//! changed.
//!
//! # Basic Usage
//!
//! ```rust
//! use flowscope::analysis::{
//!     Constant, ControlFlowGraph, DefUseAnalysis, Local, Statement, StatementGraph, StmtId,
//! };
//!
//! let x = Local::variable(0);
//! let mut cfg = ControlFlowGraph::new();
//! let block = cfg.add_block("A");
//! cfg.block_mut(block).unwrap().push(Statement::copy(x, Constant::Int(3)));
//! cfg.block_mut(block).unwrap().push(Statement::Return(Some(x.into())));
//!
//! let mut graph = StatementGraph::from_cfg(&cfg)?;
//! let mut defuse = DefUseAnalysis::new(&graph);
//! let (def, ret) = (StmtId::new(0), StmtId::new(1));
//! assert!(defuse.uses_of(def).contains(&ret));
//!
//! // Redefine `x` right before the return
//! let redef = graph.insert_between(def, ret, Statement::copy(x, Constant::Int(4)), &mut defuse)?;
//! assert!(defuse.uses_of(def).is_empty());
//! assert!(defuse.uses_of(redef).contains(&ret));
//! # Ok::<(), flowscope::Error>(())
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::{
    analysis::{
        dataflow::ReachingDefinitionsAnalyser,
        ssa::{CodeListener, Local, StatementGraph, StmtId},
    },
    utils::graph::{GraphBase, Successors},
    Result,
};

/// A single read of a local together with the definitions that may reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRead {
    /// The local read.
    pub local: Local,
    /// Statements whose definition of `local` may reach the read. Empty for locals that
    /// are never assigned in the method, such as parameters.
    pub defs: BTreeSet<StmtId>,
}

/// Def-use and use-def chains of a [`StatementGraph`].
pub struct DefUseAnalysis {
    definitions: ReachingDefinitionsAnalyser,
    /// Definition to the statements reading it. Empty sets are not stored.
    uses: HashMap<StmtId, BTreeSet<StmtId>>,
    /// Statement to its reads. Statements without reads are not stored.
    used: HashMap<StmtId, Vec<VarRead>>,
    /// Successors of the statement being removed, recorded before the removal.
    pending: Vec<StmtId>,
}

impl DefUseAnalysis {
    /// Computes reaching definitions and the def-use records of every statement.
    #[must_use]
    pub fn new(graph: &StatementGraph) -> Self {
        let mut analysis = Self {
            definitions: ReachingDefinitionsAnalyser::new(graph),
            uses: HashMap::new(),
            used: HashMap::new(),
            pending: Vec::new(),
        };
        for stmt in graph.vertices() {
            analysis.build(graph, stmt);
        }
        analysis
    }

    /// Returns the statements reading the value defined by `def`.
    #[must_use]
    pub fn uses_of(&self, def: StmtId) -> BTreeSet<StmtId> {
        self.uses.get(&def).cloned().unwrap_or_default()
    }

    /// Returns the reads performed by `stmt`, in evaluation order.
    #[must_use]
    pub fn reads_of(&self, stmt: StmtId) -> &[VarRead] {
        self.used.get(&stmt).map_or(&[][..], Vec::as_slice)
    }

    /// Returns the definitions of `local` that may reach `stmt`.
    #[must_use]
    pub fn definitions_of(&self, stmt: StmtId, local: Local) -> BTreeSet<StmtId> {
        self.definitions
            .definitions_at(stmt, local)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns `true` if the value defined by `def` is never read.
    #[must_use]
    pub fn is_unused(&self, def: StmtId) -> bool {
        !self.uses.contains_key(&def)
    }

    /// Returns the underlying reaching definitions.
    #[must_use]
    pub const fn definitions(&self) -> &ReachingDefinitionsAnalyser {
        &self.definitions
    }

    /// Recomputes the reads of `stmt` and links them to their definitions.
    fn build(&mut self, graph: &StatementGraph, stmt: StmtId) {
        self.unlink(stmt);
        let Some(statement) = graph.statement(stmt) else {
            return;
        };

        let reads: Vec<VarRead> = statement
            .reads()
            .into_iter()
            .map(|local| VarRead {
                local,
                defs: self.definitions_of(stmt, local),
            })
            .collect();
        if reads.is_empty() {
            return;
        }

        for read in &reads {
            for def in &read.defs {
                self.uses.entry(*def).or_default().insert(stmt);
            }
        }
        self.used.insert(stmt, reads);
    }

    /// Drops the reads of `stmt` from both directions.
    fn unlink(&mut self, stmt: StmtId) {
        let Some(reads) = self.used.remove(&stmt) else {
            return;
        };
        for def in reads.iter().flat_map(|read| read.defs.iter()) {
            if let Some(users) = self.uses.get_mut(def) {
                users.remove(&stmt);
                if users.is_empty() {
                    self.uses.remove(def);
                }
            }
        }
    }

    /// Drops every record mentioning `stmt`, as reader or as definition.
    fn strip(&mut self, stmt: StmtId) {
        self.unlink(stmt);
        let Some(users) = self.uses.remove(&stmt) else {
            return;
        };
        for user in users {
            if let Some(reads) = self.used.get_mut(&user) {
                for read in reads.iter_mut() {
                    read.defs.remove(&stmt);
                }
            }
        }
    }

    /// Rebuilds everything reachable from `starts`, then every statement whose reaching
    /// definitions changed in the last update.
    fn rebuild_from(&mut self, graph: &StatementGraph, starts: &[StmtId]) {
        let mut visited = HashSet::new();
        let mut stack: Vec<StmtId> = starts.to_vec();
        while let Some(stmt) = stack.pop() {
            if !visited.insert(stmt) {
                continue;
            }
            self.build(graph, stmt);
            stack.extend(graph.successors(stmt));
        }

        let changed: Vec<StmtId> = self
            .definitions
            .last_changed()
            .iter()
            .filter(|stmt| !visited.contains(*stmt))
            .copied()
            .collect();
        for stmt in changed {
            self.build(graph, stmt);
        }
    }
}

impl CodeListener for DefUseAnalysis {
    fn insert(
        &mut self,
        graph: &StatementGraph,
        pred: StmtId,
        stmt: StmtId,
        succ: StmtId,
    ) -> Result<()> {
        self.definitions.insert(graph, pred, stmt, succ)?;
        self.rebuild_from(graph, &[stmt]);
        Ok(())
    }

    fn pre_remove(&mut self, graph: &StatementGraph, stmt: StmtId) -> Result<()> {
        self.definitions.pre_remove(graph, stmt)?;
        self.pending = graph.successors(stmt).filter(|succ| *succ != stmt).collect();
        self.strip(stmt);
        Ok(())
    }

    fn post_remove(&mut self, graph: &StatementGraph, stmt: StmtId) -> Result<()> {
        self.definitions.post_remove(graph, stmt)?;
        let pending = std::mem::take(&mut self.pending);
        self.rebuild_from(graph, &pending);
        Ok(())
    }

    fn replaced(&mut self, graph: &StatementGraph, old: StmtId, new: StmtId) -> Result<()> {
        self.definitions.replaced(graph, old, new)?;
        self.strip(old);
        self.rebuild_from(graph, &[new]);
        Ok(())
    }

    fn updated(&mut self, graph: &StatementGraph, stmt: StmtId) -> Result<()> {
        self.definitions.updated(graph, stmt)?;
        self.build(graph, stmt);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Constant, ControlFlowGraph, Expr, FlowEdgeKind, PhiExpr, Statement};

    /// Asserts that the incremental records equal a fresh computation and mirror each
    /// other.
    fn assert_consistent(graph: &StatementGraph, defuse: &DefUseAnalysis) {
        let fresh = DefUseAnalysis::new(graph);
        assert_eq!(defuse.uses, fresh.uses);
        assert_eq!(defuse.used, fresh.used);

        for (def, users) in &defuse.uses {
            for user in users {
                assert!(defuse
                    .reads_of(*user)
                    .iter()
                    .any(|read| read.defs.contains(def)));
            }
        }
        for (user, reads) in &defuse.used {
            for def in reads.iter().flat_map(|read| read.defs.iter()) {
                assert!(defuse.uses_of(*def).contains(user));
            }
        }
    }

    /// s0: x = 1, s1: if (x) goto C, s2: x = 2, s3: y = x, s4: return y
    fn join() -> StatementGraph {
        let (x, y) = (Local::variable(0), Local::variable(1));
        let mut cfg = ControlFlowGraph::new();
        let a = cfg.add_block("A");
        let b = cfg.add_block("B");
        let c = cfg.add_block("C");
        cfg.block_mut(a).unwrap().push(Statement::copy(x, Constant::Int(1)));
        cfg.block_mut(a).unwrap().push(Statement::Branch {
            cond: x.into(),
            target: c,
        });
        cfg.block_mut(b).unwrap().push(Statement::copy(x, Constant::Int(2)));
        cfg.block_mut(c).unwrap().push(Statement::copy(y, x));
        cfg.block_mut(c).unwrap().push(Statement::Return(Some(y.into())));
        cfg.add_edge(a, b, FlowEdgeKind::Immediate).unwrap();
        cfg.add_edge(a, c, FlowEdgeKind::ConditionalJump).unwrap();
        cfg.add_edge(b, c, FlowEdgeKind::Immediate).unwrap();
        StatementGraph::from_cfg(&cfg).unwrap()
    }

    fn ids(set: BTreeSet<StmtId>) -> Vec<usize> {
        set.into_iter().map(StmtId::index).collect()
    }

    #[test]
    fn test_initial_chains() {
        let graph = join();
        let defuse = DefUseAnalysis::new(&graph);
        let x = Local::variable(0);

        assert_eq!(ids(defuse.uses_of(StmtId::new(0))), vec![1, 3]);
        assert_eq!(ids(defuse.uses_of(StmtId::new(2))), vec![3]);
        assert_eq!(ids(defuse.uses_of(StmtId::new(3))), vec![4]);
        assert_eq!(ids(defuse.definitions_of(StmtId::new(3), x)), vec![0, 2]);
        assert_eq!(defuse.reads_of(StmtId::new(3)).len(), 1);
        assert!(defuse.reads_of(StmtId::new(0)).is_empty());
        assert!(defuse.is_unused(StmtId::new(4)));
        assert_consistent(&graph, &defuse);
    }

    #[test]
    fn test_remove_definition() {
        let mut graph = join();
        let mut defuse = DefUseAnalysis::new(&graph);

        graph.remove(StmtId::new(2), &mut defuse).unwrap();

        assert!(defuse.uses_of(StmtId::new(2)).is_empty());
        assert_eq!(ids(defuse.uses_of(StmtId::new(0))), vec![1, 3]);
        assert_eq!(
            ids(defuse.reads_of(StmtId::new(3))[0].defs.clone()),
            vec![0]
        );
        assert_consistent(&graph, &defuse);
    }

    #[test]
    fn test_remove_reader() {
        let mut graph = join();
        let mut defuse = DefUseAnalysis::new(&graph);

        graph.remove(StmtId::new(3), &mut defuse).unwrap();

        assert_eq!(ids(defuse.uses_of(StmtId::new(0))), vec![1]);
        assert!(defuse.uses_of(StmtId::new(2)).is_empty());
        assert!(defuse.reads_of(StmtId::new(3)).is_empty());
        assert_consistent(&graph, &defuse);
    }

    #[test]
    fn test_insert_kills_downstream() {
        let mut graph = join();
        let mut defuse = DefUseAnalysis::new(&graph);
        let x = Local::variable(0);

        let redef = graph
            .insert_between(
                StmtId::new(2),
                StmtId::new(3),
                Statement::copy(x, Constant::Int(5)),
                &mut defuse,
            )
            .unwrap();

        assert!(defuse.uses_of(StmtId::new(2)).is_empty());
        assert_eq!(ids(defuse.uses_of(redef)), vec![3]);
        assert_eq!(ids(defuse.definitions_of(StmtId::new(3), x)), vec![0, redef.index()]);
        assert_consistent(&graph, &defuse);
    }

    #[test]
    fn test_replace_reader() {
        let mut graph = join();
        let mut defuse = DefUseAnalysis::new(&graph);
        let y = Local::variable(1);

        let replacement = graph
            .replace(
                StmtId::new(3),
                Statement::copy(y, Constant::Int(0)),
                &mut defuse,
            )
            .unwrap();

        assert_eq!(ids(defuse.uses_of(StmtId::new(0))), vec![1]);
        assert!(defuse.uses_of(StmtId::new(2)).is_empty());
        assert_eq!(ids(defuse.uses_of(replacement)), vec![4]);
        assert_consistent(&graph, &defuse);
    }

    #[test]
    fn test_phi_update() {
        // L: a = 1  R: b = 2  J: c = phi{L: a, R: a}
        let (a, b, c) = (Local::variable(0), Local::variable(1), Local::variable(2));
        let mut cfg = ControlFlowGraph::new();
        let left = cfg.add_block("L");
        let right = cfg.add_block("R");
        let join = cfg.add_block("J");
        cfg.block_mut(left).unwrap().push(Statement::copy(a, Constant::Int(1)));
        cfg.block_mut(right).unwrap().push(Statement::copy(b, Constant::Int(2)));
        cfg.block_mut(join).unwrap().push(Statement::CopyPhi {
            local: c,
            phi: PhiExpr::new([(left, Expr::Local(a)), (right, Expr::Local(a))]),
        });
        cfg.add_edge(left, join, FlowEdgeKind::Immediate).unwrap();
        cfg.add_edge(right, join, FlowEdgeKind::UnconditionalJump)
            .unwrap();

        let mut graph = StatementGraph::from_cfg(&cfg).unwrap();
        let mut defuse = DefUseAnalysis::new(&graph);
        let (def_a, def_b, phi) = (StmtId::new(0), StmtId::new(1), StmtId::new(2));
        assert_eq!(ids(defuse.uses_of(def_a)), vec![2]);
        assert!(defuse.is_unused(def_b));

        graph
            .set_phi_argument(phi, right, Expr::Local(b), &mut defuse)
            .unwrap();
        assert_eq!(defuse.reads_of(phi).len(), 2);
        assert_eq!(defuse.reads_of(phi)[1].local, b);
        assert_eq!(ids(defuse.uses_of(def_b)), vec![2]);
        assert_consistent(&graph, &defuse);
    }
}
