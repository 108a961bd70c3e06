//! Inter-procedural call graph construction and analysis.
//!
//! This module builds a graph of call relationships between the methods of a
//! [`ClassSource`](crate::program::ClassSource), enabling inter-procedural analysis.
//!
//! # Architecture
//!
//! The call graph is built by walking method bodies from a set of entry points and
//! resolving each invocation against the class hierarchy. Virtual and interface calls are
//! resolved with Class Hierarchy Analysis: every congruent override in a subtype of the
//! receiver is a possible target, plus the nearest implementation above it.
//!
//! # Components
//!
//! - [`InvocationResolver`]: Maps one invocation to the set of methods it may dispatch to
//! - [`CallTracer`]: Worklist traversal over reachable methods with overridable hooks
//! - [`CallGraphBuilder`]: The tracer that records resolved calls into a [`CallGraph`]
//! - [`CallGraph`]: The resulting graph with forward and reverse call edges
//! - [`EntryPoints`]: Caller-supplied and discovered roots of the trace
//!
//! # Example
//!
//! ```rust,ignore
//! use flowscope::analysis::callgraph::{CallGraphBuilder, EntryPoints};
//! use flowscope::config::AnalysisConfig;
//!
//! let config = AnalysisConfig::default();
//! let builder = CallGraphBuilder::new(&source, &config)?;
//! let graph = builder.build(&EntryPoints::new(&source, &config))?;
//!
//! for callee in graph.callees(main) {
//!     println!("Calls: {}", callee);
//! }
//!
//! for method in graph.recursive_methods() {
//!     println!("Recursive method: {}", method);
//! }
//! ```

mod entry;
mod graph;
mod resolution;
mod tracer;

pub use entry::{EntryPoints, MAIN_DESC, MAIN_NAME};
pub use graph::{CallEdge, CallGraph, CallGraphStats};
pub use resolution::{Ambiguity, InvocationResolver, ResolverStats};
pub use tracer::{CallGraphBuilder, CallTracer};
