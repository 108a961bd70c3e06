//! Program analysis infrastructure for class-based bytecode.
//!
//! This module provides the analyses that understand and transform method bodies and the
//! relationships between methods. It builds upon the generic graph infrastructure in
//! [`crate::utils::graph`] to provide domain-specific analysis tools.
//!
//! # Architecture
//!
//! The analysis module is organized into focused sub-modules:
//!
//! - [`cfg`] - Basic-block control flow graphs with typed edges
//! - [`ssa`] - Statement IR and the per-statement [`StatementGraph`]
//! - [`dataflow`] - Fixed-point solver, reaching definitions and liveness
//! - [`callgraph`] - Invocation resolution, call tracing and the call graph
//!
//! Def-use chains ([`DefUseAnalysis`]) and the lazily materialized class hierarchy
//! ([`ClassTree`]) live directly in this module.
//!
//! # Usage
//!
//! ```rust
//! use flowscope::analysis::{
//!     Constant, ControlFlowGraph, DefUseAnalysis, Expr, Local, Statement, StatementGraph,
//! };
//!
//! let x = Local::variable(0);
//! let mut cfg = ControlFlowGraph::new();
//! let block = cfg.add_block("A");
//! cfg.block_mut(block).unwrap().push(Statement::copy(x, Constant::Int(1)));
//! cfg.block_mut(block).unwrap().push(Statement::Return(Some(Expr::Local(x))));
//!
//! let graph = StatementGraph::from_cfg(&cfg)?;
//! let defuse = DefUseAnalysis::new(&graph);
//! for (id, stmt) in graph.statements() {
//!     println!("{}: {} reads={:?} unused={}", id, stmt, defuse.reads_of(id), defuse.is_unused(id));
//! }
//! # Ok::<(), flowscope::Error>(())
//! ```

pub mod callgraph;
pub mod cfg;
pub mod dataflow;
mod defuse;
mod hierarchy;
pub mod ssa;

// Re-export primary types at module level
pub use callgraph::{CallGraph, CallGraphBuilder, CallTracer, EntryPoints, InvocationResolver};
pub use cfg::{
    BasicBlock, BlockId, ControlFlowGraph, ExceptionRange, FlowEdge, FlowEdgeKind, SwitchKey,
};
pub use defuse::{DefUseAnalysis, VarRead};
pub use hierarchy::{ClassTree, InheritanceEdge, InheritanceKind};
pub use ssa::{
    CodeListener, Constant, Effects, Expr, Invocation, InvokeKind, Local, LocalKind, LocalsPool,
    NoopListener, Operation, PhiExpr, Statement, StatementGraph, StmtId,
};
