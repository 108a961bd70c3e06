//! Control Flow Graph implementation.
//!
//! This module provides the [`ControlFlowGraph`], an arena of [`BasicBlock`]s connected by
//! a [`FlowGraph`] of typed [`FlowEdge`]s, together with the method's exception ranges.

use crate::{
    analysis::cfg::{BasicBlock, BlockId, ExceptionRange, FlowEdge, FlowEdgeKind},
    utils::graph::{FlowGraph, GraphBase, Predecessors, Successors},
    Error, Result,
};

/// A control flow graph of basic blocks.
///
/// Blocks live in an arena indexed by [`BlockId`]; the graph itself only stores handles.
/// Edges are typed, and the graph enforces that every block has at most one outgoing and
/// at most one incoming [`Immediate`](FlowEdgeKind::Immediate) edge.
///
/// # Lazy Computation
///
/// The list of exception ranges protecting a block is computed on first access and cached
/// in the block. Adding or removing a range resets every cached list.
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::{ControlFlowGraph, FlowEdgeKind, Statement};
///
/// let mut cfg = ControlFlowGraph::new();
/// let entry = cfg.add_block("A");
/// let exit = cfg.add_block("B");
/// cfg.add_edge(entry, exit, FlowEdgeKind::Immediate)?;
/// cfg.block_mut(exit).unwrap().push(Statement::Return(None));
///
/// assert_eq!(cfg.entry(), Some(entry));
/// assert_eq!(cfg.immediate(entry)?, Some(exit));
///
/// // A second fall-through out of the same block is rejected
/// let other = cfg.add_block("C");
/// assert!(cfg.add_edge(entry, other, FlowEdgeKind::Immediate).is_err());
/// # Ok::<(), flowscope::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ControlFlowGraph {
    blocks: Vec<Option<BasicBlock>>,
    graph: FlowGraph<BlockId, FlowEdge<BlockId>>,
    entry: Option<BlockId>,
    ranges: Vec<ExceptionRange>,
    /// Edge priority of each range, parallel to `ranges`. Never reused.
    priorities: Vec<u32>,
    next_priority: u32,
}

impl ControlFlowGraph {
    /// Creates an empty control flow graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new empty block. The first block added becomes the entry.
    pub fn add_block(&mut self, label: impl Into<String>) -> BlockId {
        let id = BlockId::new(self.blocks.len());
        self.blocks.push(Some(BasicBlock::new(id, label.into())));
        self.graph.add_vertex(id);
        if self.entry.is_none() {
            self.entry = Some(id);
        }
        id
    }

    /// Removes a block, its edges and its membership in every exception range.
    ///
    /// Returns `false` if the block does not exist.
    pub fn remove_block(&mut self, id: BlockId) -> bool {
        let Some(slot) = self.blocks.get_mut(id.index()) else {
            return false;
        };
        if slot.take().is_none() {
            return false;
        }

        self.graph.remove_vertex(id);
        if self.entry == Some(id) {
            self.entry = None;
        }
        if self.ranges.iter().any(|range| range.contains(id)) {
            self.ranges = std::mem::take(&mut self.ranges)
                .into_iter()
                .map(|range| {
                    let mut rebuilt = ExceptionRange::new(range.handler());
                    for block in range.blocks().iter().filter(|b| **b != id) {
                        rebuilt = rebuilt.with_block(*block);
                    }
                    for ty in range.catch_types() {
                        rebuilt = rebuilt.catching(ty.clone());
                    }
                    rebuilt
                })
                .collect();
            self.invalidate_ranges();
        }
        true
    }

    /// Returns the block with the given id.
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.index()).and_then(Option::as_ref)
    }

    /// Returns the block with the given id for modification.
    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut BasicBlock> {
        self.blocks.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Returns the live blocks in creation order.
    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> + '_ {
        self.blocks.iter().filter_map(Option::as_ref)
    }

    /// Returns the number of live blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.graph.vertex_count()
    }

    /// Changes the label of a block. Its identity is unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] if the block does not exist.
    pub fn rename_block(&mut self, id: BlockId, label: impl Into<String>) -> Result<()> {
        match self.block_mut(id) {
            Some(block) => {
                block.set_label(label.into());
                Ok(())
            }
            None => Err(Error::GraphError(format!("Block {} does not exist", id))),
        }
    }

    /// Returns the entry block.
    #[must_use]
    pub const fn entry(&self) -> Option<BlockId> {
        self.entry
    }

    /// Sets the entry block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] if the block does not exist.
    pub fn set_entry(&mut self, id: BlockId) -> Result<()> {
        if self.block(id).is_none() {
            return Err(Error::GraphError(format!("Block {} does not exist", id)));
        }
        self.entry = Some(id);
        Ok(())
    }

    /// Returns the blocks without successors.
    #[must_use]
    pub fn exits(&self) -> Vec<BlockId> {
        self.graph
            .vertices()
            .filter(|id| self.graph.edges(*id).is_empty())
            .collect()
    }

    /// Returns the underlying edge graph.
    #[must_use]
    pub const fn graph(&self) -> &FlowGraph<BlockId, FlowEdge<BlockId>> {
        &self.graph
    }

    /// Adds an edge of `kind` from `src` to `dst`.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if an identical edge already exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Structural`] when adding an immediate edge would give `src` a
    /// second immediate successor or `dst` a second immediate predecessor, and
    /// [`Error::GraphError`] if a block does not exist.
    pub fn add_edge(&mut self, src: BlockId, dst: BlockId, kind: FlowEdgeKind) -> Result<bool> {
        self.add_flow_edge(FlowEdge::new(src, dst, kind))
    }

    /// Adds a prepared edge; see [`add_edge`](Self::add_edge).
    ///
    /// # Errors
    ///
    /// Same as [`add_edge`](Self::add_edge).
    pub fn add_flow_edge(&mut self, edge: FlowEdge<BlockId>) -> Result<bool> {
        if edge.kind.is_immediate() && !self.graph.edges(edge.src).contains(&edge) {
            if let Some(existing) = self.immediate(edge.src)? {
                return Err(structural_error!(
                    "Block {} already falls through to {}, cannot add immediate edge to {}",
                    edge.src,
                    existing,
                    edge.dst
                ));
            }
            if let Some(existing) = self.incoming_immediate(edge.dst)? {
                return Err(structural_error!(
                    "Block {} is already the fall-through of {}, cannot add immediate edge from {}",
                    edge.dst,
                    existing,
                    edge.src
                ));
            }
        }
        self.graph.add_edge(edge)
    }

    /// Removes an edge, returning `false` if it does not exist.
    pub fn remove_edge(&mut self, edge: &FlowEdge<BlockId>) -> bool {
        self.graph.remove_edge(edge)
    }

    /// Returns the outgoing edges of a block.
    #[must_use]
    pub fn edges(&self, id: BlockId) -> &[FlowEdge<BlockId>] {
        self.graph.edges(id)
    }

    /// Returns the incoming edges of a block.
    #[must_use]
    pub fn reverse_edges(&self, id: BlockId) -> &[FlowEdge<BlockId>] {
        self.graph.reverse_edges(id)
    }

    /// Returns the fall-through successor of a block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Structural`] if the block has more than one immediate successor.
    pub fn immediate(&self, id: BlockId) -> Result<Option<BlockId>> {
        single_immediate(self.graph.edges(id), |edge| edge.dst, id, "successor")
    }

    /// Returns the block that falls through into `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Structural`] if the block has more than one immediate predecessor.
    pub fn incoming_immediate(&self, id: BlockId) -> Result<Option<BlockId>> {
        single_immediate(self.graph.reverse_edges(id), |edge| edge.src, id, "predecessor")
    }

    /// Returns the targets of explicit jumps and switches out of a block.
    #[must_use]
    pub fn jump_targets(&self, id: BlockId) -> Vec<BlockId> {
        self.graph
            .edges(id)
            .iter()
            .filter(|edge| edge.kind.is_jump() || edge.kind.is_switch())
            .map(|edge| edge.dst)
            .collect()
    }

    /// Returns `true` if the block is the target of an exception edge.
    #[must_use]
    pub fn is_handler(&self, id: BlockId) -> bool {
        self.graph
            .reverse_edges(id)
            .iter()
            .any(|edge| edge.kind.is_exceptional())
    }

    /// Adds an exception range and an exception edge from every protected block to its
    /// handler, then resets the cached range lists.
    ///
    /// Each range gets a priority above every range added before it. Nothing is changed
    /// unless the handler and every protected block exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] if the handler or a protected block does not exist.
    pub fn add_range(&mut self, range: ExceptionRange) -> Result<()> {
        if let Some(missing) = std::iter::once(&range.handler())
            .chain(range.blocks())
            .find(|block| !self.graph.contains_vertex(**block))
        {
            return Err(Error::GraphError(format!(
                "Exception range refers to unknown block {}",
                missing
            )));
        }
        let priority = self.next_priority;
        self.next_priority = priority
            .checked_add(1)
            .ok_or_else(|| structural_error!("Too many exception ranges"))?;

        for edge in range_edges(&range, priority) {
            self.graph.add_edge(edge)?;
        }
        self.ranges.push(range);
        self.priorities.push(priority);
        self.invalidate_ranges();
        Ok(())
    }

    /// Removes the range at `index` together with the exception edges it introduced.
    ///
    /// Edges added by other ranges stay, even when they share the handler.
    /// Returns `None` if there is no such range.
    pub fn remove_range(&mut self, index: usize) -> Option<ExceptionRange> {
        if index >= self.ranges.len() {
            return None;
        }
        let range = self.ranges.remove(index);
        let priority = self.priorities.remove(index);
        for edge in range_edges(&range, priority) {
            let shared = self
                .ranges
                .iter()
                .zip(&self.priorities)
                .any(|(other, p)| range_edges(other, *p).any(|kept| kept == edge));
            if !shared {
                self.graph.remove_edge(&edge);
            }
        }
        self.invalidate_ranges();
        Some(range)
    }

    /// Returns every exception range, in exception table order.
    #[must_use]
    pub fn ranges(&self) -> &[ExceptionRange] {
        &self.ranges
    }

    /// Returns the ranges protecting a block, in exception table order.
    ///
    /// The result is cached in the block until the range set changes.
    #[must_use]
    pub fn protecting_ranges(&self, id: BlockId) -> Vec<&ExceptionRange> {
        let Some(block) = self.block(id) else {
            return Vec::new();
        };
        block
            .protecting
            .get_or_init(|| {
                self.ranges
                    .iter()
                    .enumerate()
                    .filter(|(_, range)| range.contains(id))
                    .map(|(index, _)| index)
                    .collect()
            })
            .iter()
            .filter_map(|index| self.ranges.get(*index))
            .collect()
    }

    fn invalidate_ranges(&mut self) {
        for block in self.blocks.iter_mut().flatten() {
            block.protecting.take();
        }
    }
}

/// The exception edges a range contributes.
fn range_edges(
    range: &ExceptionRange,
    priority: u32,
) -> impl Iterator<Item = FlowEdge<BlockId>> + '_ {
    let catch_type = if range.catch_types().len() == 1 {
        range.catch_types().iter().next().cloned()
    } else {
        None
    };
    range
        .blocks()
        .iter()
        .map(move |block| FlowEdge::exception(*block, range.handler(), catch_type.clone(), priority))
}

fn single_immediate(
    edges: &[FlowEdge<BlockId>],
    endpoint: fn(&FlowEdge<BlockId>) -> BlockId,
    id: BlockId,
    role: &str,
) -> Result<Option<BlockId>> {
    let mut immediates = edges.iter().filter(|edge| edge.kind.is_immediate());
    let first = immediates.next().map(endpoint);
    if immediates.next().is_some() {
        return Err(structural_error!(
            "Block {} has more than one immediate {}",
            id,
            role
        ));
    }
    Ok(first)
}

impl GraphBase for ControlFlowGraph {
    type Vertex = BlockId;

    fn vertex_count(&self) -> usize {
        self.graph.vertex_count()
    }

    fn vertices(&self) -> impl Iterator<Item = BlockId> {
        self.graph.vertices()
    }
}

impl Successors for ControlFlowGraph {
    fn successors(&self, vertex: BlockId) -> impl Iterator<Item = BlockId> {
        self.graph.successors(vertex)
    }
}

impl Predecessors for ControlFlowGraph {
    fn predecessors(&self, vertex: BlockId) -> impl Iterator<Item = BlockId> {
        self.graph.predecessors(vertex)
    }
}
