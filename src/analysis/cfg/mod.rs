//! Control Flow Graph (CFG) of basic blocks.
//!
//! This module provides the block-level graph of a method body. Blocks are stored in an
//! arena and referenced by [`BlockId`] handles; control transfers between them are typed
//! [`FlowEdge`]s.
//!
//! # Key Components
//!
//! - [`ControlFlowGraph`] - Blocks, edges, entry and exception ranges of one method
//! - [`BasicBlock`] - A straight-line statement sequence, identified by its id
//! - [`FlowEdge`] / [`FlowEdgeKind`] - Edge representation with control flow semantics
//! - [`ExceptionRange`] - A set of protected blocks and the handler guarding them
//!
//! # Edge Types
//!
//! - **Immediate**: Fall-through into the next block. At most one in and one out per block
//! - **Unconditional jump**: An explicit `goto`
//! - **Conditional jump**: The taken side of a branch
//! - **Switch**: A case or the default of a multi-way branch
//! - **Exception**: From a protected block to its handler, ordered by priority
//!
//! # Lazy Computation
//!
//! The exception ranges protecting a block are computed on first access and cached in the
//! block using [`std::sync::OnceLock`]. The caches are reset whenever a range is added or
//! removed.

mod block;
mod edge;
mod graph;

pub use block::{BasicBlock, BlockId, ExceptionRange};
pub use edge::{FlowEdge, FlowEdgeKind, SwitchKey};
pub use graph::ControlFlowGraph;
