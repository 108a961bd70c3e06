//! Basic blocks and exception ranges.

use std::{
    collections::BTreeSet,
    fmt,
    hash::{Hash, Hasher},
    sync::OnceLock,
};

use crate::analysis::ssa::Statement;

define_handle!(
    /// Identifier of a basic block within its [`ControlFlowGraph`](super::ControlFlowGraph).
    ///
    /// The identifier is the block's identity: it never changes, even when the block is
    /// relabelled.
    BlockId,
    "b"
);

/// A basic block: a straight-line sequence of statements.
///
/// Blocks compare equal only by identity, never by content. Two blocks with identical
/// statements but different ids are different blocks.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    id: BlockId,
    label: String,
    statements: Vec<Statement>,
    /// Indices of the graph's exception ranges protecting this block, computed on demand.
    pub(crate) protecting: OnceLock<Vec<usize>>,
}

impl BasicBlock {
    pub(crate) fn new(id: BlockId, label: String) -> Self {
        Self {
            id,
            label,
            statements: Vec::new(),
            protecting: OnceLock::new(),
        }
    }

    /// Returns the identity of this block.
    #[must_use]
    pub const fn id(&self) -> BlockId {
        self.id
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = label;
    }

    /// Returns the statements of this block.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Returns the statements of this block for modification.
    pub fn statements_mut(&mut self) -> &mut Vec<Statement> {
        &mut self.statements
    }

    /// Appends a statement.
    pub fn push(&mut self, stmt: Statement) {
        self.statements.push(stmt);
    }

    /// Returns the last statement.
    #[must_use]
    pub fn last(&self) -> Option<&Statement> {
        self.statements.last()
    }

    /// Returns the number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Returns `true` if the block has no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl PartialEq for BasicBlock {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BasicBlock {}

impl Hash for BasicBlock {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.label)?;
        for stmt in &self.statements {
            writeln!(f, "    {}", stmt)?;
        }
        Ok(())
    }
}

/// A protected range of blocks together with its handler.
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::{BlockId, ExceptionRange};
///
/// let range = ExceptionRange::new(BlockId::new(4))
///     .with_block(BlockId::new(1))
///     .with_block(BlockId::new(2))
///     .catching("java/io/IOException");
/// assert!(range.contains(BlockId::new(2)));
/// assert!(!range.is_catch_all());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionRange {
    blocks: Vec<BlockId>,
    handler: BlockId,
    catch_types: BTreeSet<String>,
}

impl ExceptionRange {
    /// Creates an empty range that transfers to `handler`.
    #[must_use]
    pub fn new(handler: BlockId) -> Self {
        Self {
            blocks: Vec::new(),
            handler,
            catch_types: BTreeSet::new(),
        }
    }

    /// Adds a protected block.
    #[must_use]
    pub fn with_block(mut self, block: BlockId) -> Self {
        if !self.blocks.contains(&block) {
            self.blocks.push(block);
        }
        self
    }

    /// Adds a caught type by internal name.
    #[must_use]
    pub fn catching(mut self, ty: impl Into<String>) -> Self {
        self.catch_types.insert(ty.into());
        self
    }

    /// Returns the protected blocks in order.
    #[must_use]
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// Returns the handler block.
    #[must_use]
    pub const fn handler(&self) -> BlockId {
        self.handler
    }

    /// Returns the caught types; empty for catch-all handlers.
    #[must_use]
    pub fn catch_types(&self) -> &BTreeSet<String> {
        &self.catch_types
    }

    /// Returns `true` if the handler catches every exception.
    #[must_use]
    pub fn is_catch_all(&self) -> bool {
        self.catch_types.is_empty()
    }

    /// Returns `true` if `block` is protected by this range.
    #[must_use]
    pub fn contains(&self, block: BlockId) -> bool {
        self.blocks.contains(&block)
    }
}
