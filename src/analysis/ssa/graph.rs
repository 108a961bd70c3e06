//! Statement-level control flow graph.
//!
//! A [`StatementGraph`] flattens a [`ControlFlowGraph`] into one vertex per statement.
//! Statements of the same block are chained by immediate edges, block edges connect the
//! last statement of the source block to the first statement of the target, and every
//! statement of a protected block gets its own edge into the handler. This is the graph
//! the reaching definitions and liveness analyses run on.
//!
//! Structural changes go through [`StatementGraph::insert_between`],
//! [`StatementGraph::remove`], [`StatementGraph::replace`] and
//! [`StatementGraph::set_phi_argument`], each of which notifies a [`CodeListener`] so
//! cached analysis results can follow the code.

use std::collections::HashMap;

use crate::{
    analysis::{
        cfg::{BlockId, ControlFlowGraph, FlowEdge, FlowEdgeKind},
        ssa::{CodeListener, Expr, Statement},
    },
    utils::graph::{FlowGraph, GraphBase, Predecessors, Successors},
    Error, Result,
};

define_handle!(
    /// Identifier of a statement within a [`StatementGraph`].
    ///
    /// Identifiers are never reused: replacing a statement issues a new one.
    StmtId,
    "s"
);

/// Control flow graph with one vertex per statement.
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::{
///     Constant, ControlFlowGraph, Local, NoopListener, Statement, StatementGraph,
/// };
///
/// let mut cfg = ControlFlowGraph::new();
/// let block = cfg.add_block("A");
/// cfg.block_mut(block).unwrap().push(Statement::copy(Local::variable(0), Constant::Int(1)));
/// cfg.block_mut(block).unwrap().push(Statement::Return(None));
///
/// let mut graph = StatementGraph::from_cfg(&cfg)?;
/// assert_eq!(graph.len(), 2);
///
/// let entry = graph.entry().unwrap();
/// graph.remove(entry, &mut NoopListener)?;
/// assert!(matches!(graph.statement(graph.entry().unwrap()), Some(Statement::Return(None))));
/// # Ok::<(), flowscope::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct StatementGraph {
    statements: Vec<Option<Statement>>,
    owners: Vec<BlockId>,
    graph: FlowGraph<StmtId, FlowEdge<StmtId>>,
    entry: Option<StmtId>,
}

impl StatementGraph {
    /// Creates an empty statement graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens a block graph into a statement graph.
    ///
    /// Empty blocks are represented by a single [`Statement::Nop`] so that control can
    /// still pass through them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] if an edge of `cfg` references a block it does not
    /// contain.
    pub fn from_cfg(cfg: &ControlFlowGraph) -> Result<Self> {
        let mut graph = Self::new();
        let mut bounds: HashMap<BlockId, (StmtId, StmtId)> = HashMap::new();
        let mut members: HashMap<BlockId, Vec<StmtId>> = HashMap::new();

        for block in cfg.blocks() {
            let mut ids = Vec::with_capacity(block.len().max(1));
            if block.is_empty() {
                ids.push(graph.add_statement(block.id(), Statement::Nop));
            } else {
                for stmt in block.statements() {
                    ids.push(graph.add_statement(block.id(), stmt.clone()));
                }
            }
            for pair in ids.windows(2) {
                graph.graph.add_edge(FlowEdge::immediate(pair[0], pair[1]))?;
            }
            if let (Some(first), Some(last)) = (ids.first(), ids.last()) {
                bounds.insert(block.id(), (*first, *last));
            }
            members.insert(block.id(), ids);
        }

        for edge in cfg.graph().all_edges() {
            let (Some((_, last)), Some((target, _))) = (bounds.get(&edge.src), bounds.get(&edge.dst))
            else {
                return Err(Error::GraphError(format!(
                    "Edge {} references a block that does not exist",
                    edge
                )));
            };
            if edge.kind.is_exceptional() {
                for stmt in members.get(&edge.src).into_iter().flatten() {
                    graph
                        .graph
                        .add_edge(FlowEdge::new(*stmt, *target, edge.kind.clone()))?;
                }
            } else {
                graph
                    .graph
                    .add_edge(FlowEdge::new(*last, *target, edge.kind.clone()))?;
            }
        }

        graph.entry = cfg
            .entry()
            .and_then(|entry| bounds.get(&entry))
            .map(|(first, _)| *first);
        Ok(graph)
    }

    /// Adds an unconnected statement owned by `block`.
    ///
    /// The first statement added becomes the entry.
    pub fn add_statement(&mut self, block: BlockId, stmt: Statement) -> StmtId {
        let id = self.allocate(block, stmt);
        if self.entry.is_none() {
            self.entry = Some(id);
        }
        id
    }

    /// Returns the statement with the given id, if it is still part of the graph.
    #[must_use]
    pub fn statement(&self, id: StmtId) -> Option<&Statement> {
        self.statements.get(id.index()).and_then(Option::as_ref)
    }

    /// Returns the block a statement belongs to.
    #[must_use]
    pub fn block_of(&self, id: StmtId) -> Option<BlockId> {
        self.statement(id)?;
        self.owners.get(id.index()).copied()
    }

    /// Returns the live statements in creation order.
    pub fn statements(&self) -> impl Iterator<Item = (StmtId, &Statement)> + '_ {
        self.statements
            .iter()
            .enumerate()
            .filter_map(|(index, stmt)| stmt.as_ref().map(|stmt| (StmtId::new(index), stmt)))
    }

    /// Returns the number of live statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.vertex_count()
    }

    /// Returns `true` if the graph holds no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Returns the first statement executed.
    #[must_use]
    pub const fn entry(&self) -> Option<StmtId> {
        self.entry
    }

    /// Returns the statements without successors.
    #[must_use]
    pub fn exits(&self) -> Vec<StmtId> {
        self.graph
            .vertices()
            .filter(|id| self.graph.edges(*id).is_empty())
            .collect()
    }

    /// Returns the underlying edge graph.
    #[must_use]
    pub const fn graph(&self) -> &FlowGraph<StmtId, FlowEdge<StmtId>> {
        &self.graph
    }

    /// Splices `stmt` onto every edge from `pred` to `succ`.
    ///
    /// The new statement belongs to the block of `pred`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] if no edge connects `pred` to `succ`, and propagates
    /// listener failures.
    pub fn insert_between(
        &mut self,
        pred: StmtId,
        succ: StmtId,
        stmt: Statement,
        listener: &mut dyn CodeListener,
    ) -> Result<StmtId> {
        let owner = self.block_of(pred);
        let connected = self.graph.edges(pred).iter().any(|edge| edge.dst == succ);
        let Some(owner) = owner.filter(|_| connected) else {
            return Err(Error::GraphError(format!(
                "No edge from {} to {}",
                pred, succ
            )));
        };

        let id = self.allocate(owner, stmt);
        self.graph.jam(pred, succ, id)?;
        listener.insert(self, pred, id, succ)?;
        Ok(id)
    }

    /// Removes `stmt`, reconnecting each predecessor to each successor.
    ///
    /// A predecessor that fell through into `stmt` keeps falling through only into the
    /// fall-through of `stmt`; its other new edges become unconditional jumps.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if the statement is not part of the graph.
    ///
    /// # Errors
    ///
    /// Propagates graph and listener failures.
    pub fn remove(&mut self, stmt: StmtId, listener: &mut dyn CodeListener) -> Result<bool> {
        if self.statement(stmt).is_none() {
            return Ok(false);
        }

        listener.pre_remove(self, stmt)?;

        let next = self.graph.successors(stmt).find(|succ| *succ != stmt);
        let falls_in = self
            .graph
            .reverse_edges(stmt)
            .iter()
            .find(|edge| edge.kind.is_immediate() && edge.src != stmt)
            .map(|edge| edge.src);
        let falls_out = self
            .graph
            .edges(stmt)
            .iter()
            .find(|edge| edge.kind.is_immediate() && edge.dst != stmt)
            .map(|edge| edge.dst);
        self.graph.excavate(stmt)?;
        if let Some(pred) = falls_in {
            self.demote_fallthroughs(pred, falls_out)?;
        }
        self.statements[stmt.index()] = None;
        if self.entry == Some(stmt) {
            self.entry = next;
        }

        listener.post_remove(self, stmt)?;
        Ok(true)
    }

    /// Turns every immediate edge out of `stmt` that does not lead to `keep` into an
    /// unconditional jump.
    fn demote_fallthroughs(&mut self, stmt: StmtId, keep: Option<StmtId>) -> Result<()> {
        let extra: Vec<FlowEdge<StmtId>> = self
            .graph
            .edges(stmt)
            .iter()
            .filter(|edge| edge.kind.is_immediate() && Some(edge.dst) != keep)
            .cloned()
            .collect();
        for edge in extra {
            self.graph.remove_edge(&edge);
            self.graph.add_edge(FlowEdge::new(
                edge.src,
                edge.dst,
                FlowEdgeKind::UnconditionalJump,
            ))?;
        }
        Ok(())
    }

    /// Replaces `old` by a new statement that takes over all of its edges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] if `old` is not part of the graph, and propagates
    /// listener failures.
    pub fn replace(
        &mut self,
        old: StmtId,
        stmt: Statement,
        listener: &mut dyn CodeListener,
    ) -> Result<StmtId> {
        let Some(owner) = self.block_of(old) else {
            return Err(Error::GraphError(format!("Statement {} does not exist", old)));
        };

        let id = self.allocate(owner, stmt);
        let mut moved = Vec::new();
        for edge in self.graph.edges(old).iter().chain(self.graph.reverse_edges(old)) {
            moved.push(self.graph.clone_edge(edge, old, id)?);
        }
        self.graph.remove_vertex(old);
        for edge in moved {
            self.graph.add_edge(edge)?;
        }
        self.statements[old.index()] = None;
        if self.entry == Some(old) {
            self.entry = Some(id);
        }

        listener.replaced(self, old, id)?;
        Ok(id)
    }

    /// Changes the argument a phi statement takes from `pred`, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Structural`] if `stmt` is not a phi assignment or the phi has no
    /// argument for `pred`, and propagates listener failures.
    pub fn set_phi_argument(
        &mut self,
        stmt: StmtId,
        pred: BlockId,
        expr: Expr,
        listener: &mut dyn CodeListener,
    ) -> Result<Expr> {
        let previous = match self
            .statements
            .get_mut(stmt.index())
            .and_then(Option::as_mut)
        {
            Some(Statement::CopyPhi { phi, .. }) => phi.set_argument(pred, expr)?,
            _ => {
                return Err(structural_error!(
                    "Statement {} is not a phi assignment",
                    stmt
                ))
            }
        };
        listener.updated(self, stmt)?;
        Ok(previous)
    }

    fn allocate(&mut self, owner: BlockId, stmt: Statement) -> StmtId {
        let id = StmtId::new(self.statements.len());
        self.statements.push(Some(stmt));
        self.owners.push(owner);
        self.graph.add_vertex(id);
        id
    }
}

impl GraphBase for StatementGraph {
    type Vertex = StmtId;

    fn vertex_count(&self) -> usize {
        self.graph.vertex_count()
    }

    fn vertices(&self) -> impl Iterator<Item = StmtId> {
        self.graph.vertices()
    }
}

impl Successors for StatementGraph {
    fn successors(&self, vertex: StmtId) -> impl Iterator<Item = StmtId> {
        self.graph.successors(vertex)
    }
}

impl Predecessors for StatementGraph {
    fn predecessors(&self, vertex: StmtId) -> impl Iterator<Item = StmtId> {
        self.graph.predecessors(vertex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{
        ssa::NoopListener, Constant, ExceptionRange, FlowEdgeKind, Local, PhiExpr,
    };

    /// Records every callback in order.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl CodeListener for Recorder {
        fn insert(
            &mut self,
            graph: &StatementGraph,
            pred: StmtId,
            stmt: StmtId,
            succ: StmtId,
        ) -> Result<()> {
            assert!(graph.statement(stmt).is_some());
            self.events.push(format!("insert {} {} {}", pred, stmt, succ));
            Ok(())
        }

        fn pre_remove(&mut self, graph: &StatementGraph, stmt: StmtId) -> Result<()> {
            assert!(graph.statement(stmt).is_some());
            self.events.push(format!("pre_remove {}", stmt));
            Ok(())
        }

        fn post_remove(&mut self, graph: &StatementGraph, stmt: StmtId) -> Result<()> {
            assert!(graph.statement(stmt).is_none());
            self.events.push(format!("post_remove {}", stmt));
            Ok(())
        }

        fn replaced(&mut self, _graph: &StatementGraph, old: StmtId, new: StmtId) -> Result<()> {
            self.events.push(format!("replaced {} {}", old, new));
            Ok(())
        }

        fn updated(&mut self, _graph: &StatementGraph, stmt: StmtId) -> Result<()> {
            self.events.push(format!("updated {}", stmt));
            Ok(())
        }
    }

    fn assign(slot: u32, value: i32) -> Statement {
        Statement::copy(Local::variable(slot), Constant::Int(value))
    }

    /// A: x = 1; if (x) goto C  B: y = 2  C: return
    fn branching() -> ControlFlowGraph {
        let mut cfg = ControlFlowGraph::new();
        let a = cfg.add_block("A");
        let b = cfg.add_block("B");
        let c = cfg.add_block("C");
        cfg.block_mut(a).unwrap().push(assign(0, 1));
        cfg.block_mut(a).unwrap().push(Statement::Branch {
            cond: Local::variable(0).into(),
            target: c,
        });
        cfg.block_mut(b).unwrap().push(assign(1, 2));
        cfg.block_mut(c).unwrap().push(Statement::Return(None));
        cfg.add_edge(a, b, FlowEdgeKind::Immediate).unwrap();
        cfg.add_edge(a, c, FlowEdgeKind::ConditionalJump).unwrap();
        cfg.add_edge(b, c, FlowEdgeKind::Immediate).unwrap();
        cfg
    }

    #[test]
    fn test_from_cfg_links_statements() {
        let graph = StatementGraph::from_cfg(&branching()).unwrap();
        let (s0, s1, s2, s3) = (
            StmtId::new(0),
            StmtId::new(1),
            StmtId::new(2),
            StmtId::new(3),
        );

        assert_eq!(graph.len(), 4);
        assert_eq!(graph.entry(), Some(s0));
        assert_eq!(graph.successors(s0).collect::<Vec<_>>(), vec![s1]);
        assert_eq!(graph.successors(s1).collect::<Vec<_>>(), vec![s2, s3]);
        assert_eq!(graph.graph().edges(s1)[1].kind, FlowEdgeKind::ConditionalJump);
        assert_eq!(graph.predecessors(s3).collect::<Vec<_>>(), vec![s1, s2]);
        assert_eq!(graph.exits(), vec![s3]);
        assert_eq!(graph.block_of(s2), Some(BlockId::new(1)));
    }

    #[test]
    fn test_empty_block_becomes_nop() {
        let mut cfg = ControlFlowGraph::new();
        let a = cfg.add_block("A");
        let b = cfg.add_block("B");
        cfg.add_edge(a, b, FlowEdgeKind::Immediate).unwrap();
        cfg.block_mut(b).unwrap().push(Statement::Return(None));

        let graph = StatementGraph::from_cfg(&cfg).unwrap();
        assert!(matches!(graph.statement(StmtId::new(0)), Some(Statement::Nop)));
        assert_eq!(graph.graph().edge_count(), 1);
    }

    #[test]
    fn test_exception_edges_from_every_statement() {
        let mut cfg = ControlFlowGraph::new();
        let a = cfg.add_block("A");
        let handler = cfg.add_block("H");
        cfg.block_mut(a).unwrap().push(assign(0, 1));
        cfg.block_mut(a).unwrap().push(Statement::Return(None));
        cfg.block_mut(handler).unwrap().push(Statement::Throw(
            Expr::CaughtException(None),
        ));
        cfg.add_range(ExceptionRange::new(handler).with_block(a))
            .unwrap();

        let graph = StatementGraph::from_cfg(&cfg).unwrap();
        let throw = StmtId::new(2);
        let sources: Vec<_> = graph
            .graph()
            .reverse_edges(throw)
            .iter()
            .filter(|edge| edge.kind.is_exceptional())
            .map(|edge| edge.src)
            .collect();
        assert_eq!(sources, vec![StmtId::new(0), StmtId::new(1)]);
    }

    #[test]
    fn test_insert_between_notifies() {
        let mut graph = StatementGraph::from_cfg(&branching()).unwrap();
        let mut recorder = Recorder::default();
        let (s1, s3) = (StmtId::new(1), StmtId::new(3));

        let id = graph
            .insert_between(s1, s3, assign(2, 3), &mut recorder)
            .unwrap();
        assert_eq!(recorder.events, vec![format!("insert s1 {} s3", id)]);
        assert_eq!(graph.block_of(id), Some(BlockId::new(0)));
        assert!(graph.successors(s1).any(|succ| succ == id));
        assert_eq!(graph.graph().edges(id)[0].kind, FlowEdgeKind::ConditionalJump);

        assert!(matches!(
            graph.insert_between(s3, s1, Statement::Nop, &mut recorder),
            Err(Error::GraphError(_))
        ));
    }

    #[test]
    fn test_remove_notifies_and_splices() {
        let mut graph = StatementGraph::from_cfg(&branching()).unwrap();
        let mut recorder = Recorder::default();
        let (s0, s1, s2) = (StmtId::new(0), StmtId::new(1), StmtId::new(2));

        assert!(graph.remove(s0, &mut recorder).unwrap());
        assert_eq!(recorder.events, vec!["pre_remove s0", "post_remove s0"]);
        assert_eq!(graph.entry(), Some(s1));

        assert!(graph.remove(s2, &mut recorder).unwrap());
        assert_eq!(
            graph.predecessors(StmtId::new(3)).collect::<Vec<_>>(),
            vec![s1, s1]
        );
        assert!(!graph.remove(s2, &mut recorder).unwrap());
    }

    #[test]
    fn test_remove_branch_keeps_single_fallthrough() {
        let mut graph = StatementGraph::from_cfg(&branching()).unwrap();
        let (s0, s1, s2, s3) = (
            StmtId::new(0),
            StmtId::new(1),
            StmtId::new(2),
            StmtId::new(3),
        );

        assert!(graph.remove(s1, &mut NoopListener).unwrap());
        let kinds: Vec<_> = graph
            .graph()
            .edges(s0)
            .iter()
            .map(|edge| (edge.dst, edge.kind.clone()))
            .collect();
        assert_eq!(kinds.len(), 2);
        assert!(kinds.contains(&(s2, FlowEdgeKind::Immediate)));
        assert!(kinds.contains(&(s3, FlowEdgeKind::UnconditionalJump)));

        let incoming: Vec<_> = graph
            .graph()
            .reverse_edges(s3)
            .iter()
            .filter(|edge| edge.kind.is_immediate())
            .map(|edge| edge.src)
            .collect();
        assert_eq!(incoming, vec![s2]);
    }

    #[test]
    fn test_replace_moves_edges() {
        let mut graph = StatementGraph::from_cfg(&branching()).unwrap();
        let mut recorder = Recorder::default();
        let s1 = StmtId::new(1);

        let id = graph
            .replace(s1, Statement::Goto(BlockId::new(2)), &mut recorder)
            .unwrap();
        assert_ne!(id, s1);
        assert!(graph.statement(s1).is_none());
        assert_eq!(graph.successors(id).count(), 2);
        assert_eq!(graph.predecessors(id).collect::<Vec<_>>(), vec![StmtId::new(0)]);
        assert_eq!(recorder.events, vec![format!("replaced s1 {}", id)]);
    }

    #[test]
    fn test_set_phi_argument() {
        let mut graph = StatementGraph::new();
        let (left, right) = (BlockId::new(0), BlockId::new(1));
        let phi = graph.add_statement(
            BlockId::new(2),
            Statement::CopyPhi {
                local: Local::variable(2),
                phi: PhiExpr::new([
                    (left, Expr::Local(Local::variable(0))),
                    (right, Expr::Local(Local::variable(1))),
                ]),
            },
        );
        let plain = graph.add_statement(BlockId::new(2), Statement::Nop);
        let mut recorder = Recorder::default();

        let previous = graph
            .set_phi_argument(phi, right, Local::variable(5).into(), &mut recorder)
            .unwrap();
        assert_eq!(previous, Expr::Local(Local::variable(1)));
        assert_eq!(recorder.events, vec![format!("updated {}", phi)]);

        assert!(matches!(
            graph.set_phi_argument(phi, BlockId::new(7), Local::variable(5).into(), &mut recorder),
            Err(Error::Structural { .. })
        ));
        assert!(matches!(
            graph.set_phi_argument(plain, left, Local::variable(5).into(), &mut NoopListener),
            Err(Error::Structural { .. })
        ));
    }
}
