//! SSA-form intermediate representation.
//!
//! This module provides the statement-level IR that analyses and transforms operate on.
//! Every instruction of the source bytecode becomes a [`Statement`] over explicit
//! [`Local`]s; values merging at control flow joins are selected by [`PhiExpr`]s.
//!
//! # Architecture
//!
//! The module is organized into focused sub-modules:
//!
//! - [`local`] - Local variables and the [`LocalsPool`] that issues them
//! - [`expr`] - Expression trees, invocations and opaque operations
//! - [`phi`] - Phi expressions for control flow merges
//! - [`stmt`] - Statements, each defining at most one local
//! - [`graph`] - The [`StatementGraph`], one vertex per statement
//! - [`listener`] - [`CodeListener`] notifications for structural changes
//!
//! # Instructions
//!
//! Apart from local reads, constants and method invocations, instructions are opaque
//! [`Operation`]s that carry an opcode, a result type and the [`Effects`] they have. The
//! analyses in this crate only need to know which locals an operation reads and whether
//! it can throw, so no concrete instruction set is modelled.
//!
//! # Usage
//!
//! ```rust
//! use flowscope::analysis::{
//!     Constant, ControlFlowGraph, Expr, FlowEdgeKind, Local, NoopListener, Statement,
//!     StatementGraph,
//! };
//!
//! let mut cfg = ControlFlowGraph::new();
//! let entry = cfg.add_block("A");
//! let exit = cfg.add_block("B");
//! cfg.add_edge(entry, exit, FlowEdgeKind::Immediate)?;
//! cfg.block_mut(entry).unwrap().push(Statement::copy(Local::variable(0), Constant::Int(7)));
//! cfg.block_mut(exit).unwrap().push(Statement::Return(Some(Expr::Local(Local::variable(0)))));
//!
//! let graph = StatementGraph::from_cfg(&cfg)?;
//! for (id, stmt) in graph.statements() {
//!     println!("{}: {}", id, stmt);
//! }
//! # Ok::<(), flowscope::Error>(())
//! ```

pub mod expr;
pub mod graph;
pub mod listener;
pub mod local;
pub mod phi;
pub mod stmt;

pub use expr::{Constant, Effects, Expr, Invocation, InvokeKind, Operation};
pub use graph::{StatementGraph, StmtId};
pub use listener::{CodeListener, NoopListener};
pub use local::{Local, LocalKind, LocalsPool};
pub use phi::PhiExpr;
pub use stmt::Statement;
