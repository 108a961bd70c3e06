//! Data flow analysis framework.
//!
//! This module provides a generic framework for computing properties that propagate along
//! control flow edges, and the analyses built on it.
//!
//! # Architecture
//!
//! The framework is built around three core abstractions:
//!
//! - **Graph**: [`DataflowGraph`] exposes successors plus the kind of every edge
//! - **Analysis**: [`DataAnalysis`] specifies states, merge and the transfer function
//! - **Solver**: [`DataflowSolver`] iteratively computes fixed points using a worklist
//!
//! The solver borrows the graph per call instead of owning it. Callers holding a solver
//! across graph mutations (such as [`ReachingDefinitionsAnalyser`]) can therefore keep
//! mutating the graph and re-solve afterwards.
//!
//! # Analyses Provided
//!
//! - [`ReachingDefinitions`]: Tracks which definitions may reach each statement
//! - [`LiveLocals`]: Determines which locals are live around each statement
//!
//! # Example
//!
//! ```rust
//! use flowscope::analysis::dataflow::{LiveLocals, ReachingDefinitionsAnalyser};
//! use flowscope::analysis::{Constant, ControlFlowGraph, Local, Statement, StatementGraph};
//!
//! let x = Local::variable(0);
//! let mut cfg = ControlFlowGraph::new();
//! let block = cfg.add_block("A");
//! cfg.block_mut(block).unwrap().push(Statement::copy(x, Constant::Int(4)));
//! cfg.block_mut(block).unwrap().push(Statement::Return(Some(x.into())));
//!
//! let graph = StatementGraph::from_cfg(&cfg)?;
//! let definitions = ReachingDefinitionsAnalyser::new(&graph);
//! let live = LiveLocals::compute(&graph);
//!
//! for (id, stmt) in graph.statements() {
//!     println!("{}: {} reaching={:?} live={:?}", id, stmt, definitions.in_state(id), live.live_in(id));
//! }
//! # Ok::<(), flowscope::Error>(())
//! ```

mod framework;
mod liveness;
mod reaching;
mod solver;

pub use framework::{DataAnalysis, DataflowGraph};
pub use liveness::{LiveLocals, LiveLocalsAnalysis};
pub use reaching::{DefinitionSet, ReachingDefinitions, ReachingDefinitionsAnalyser};
pub use solver::DataflowSolver;
