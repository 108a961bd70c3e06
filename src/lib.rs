// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # flowscope
//!
//! Program analysis infrastructure for class-based bytecode: control flow graphs, a
//! statement-level IR, dataflow analyses and a class-hierarchy call graph. Everything is
//! built on one generic directed multigraph with typed edges, so the same traversal and
//! fixed-point machinery serves basic blocks, statements, types and methods.
//!
//! ## Features
//!
//! - **Generic flow graphs** - Adjacency-indexed multigraphs with splicing primitives
//! - **Typed control flow** - Immediate, jump, switch and exception edges between blocks
//! - **Statement IR** - One vertex per statement with phi merges and change listeners
//! - **Dataflow** - Worklist fixed-point solver with reaching definitions and liveness
//! - **Def-use chains** - Incrementally maintained across statement edits
//! - **Call graphs** - Lazily materialized class hierarchy with CHA virtual dispatch
//!
//! ## Quick Start
//!
//! ```rust
//! use flowscope::prelude::*;
//!
//! let mut source = ApplicationClassSource::new();
//! source.add_class(ClassNode::new("java/lang/Object", None).library())?;
//! let app = source.add_class(ClassNode::new("app/Main", Some("java/lang/Object")))?;
//! source.add_method(
//!     app,
//!     MethodNode::new("main", "([Ljava/lang/String;)V", MethodFlags::PUBLIC | MethodFlags::STATIC),
//! )?;
//!
//! let config = AnalysisConfig::default();
//! let graph = CallGraphBuilder::new(&source, &config)?.build(&EntryPoints::new(&source, &config))?;
//! println!("Traced {} methods", graph.method_count());
//! # Ok::<(), flowscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `flowscope` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`utils::graph`] - The generic graph layer and its algorithms
//! - [`program`] - Classes, methods, descriptors and the class source
//! - [`analysis`] - Control flow, IR, dataflow, hierarchy and call graph analyses
//! - [`config`] - Resolution and tracing options
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! ## Logging
//!
//! The crate reports through the [`log`](https://docs.rs/log) facade. Hierarchy
//! materialization and call tracing log at `debug`; skipped classes and ambiguous dispatch
//! in strict mode log at `warn`. Install any logger (for example `env_logger`) to see them.

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use flowscope::prelude::*;
///
/// let mut graph: FlowGraph<u32, FlowEdge<u32>> = FlowGraph::new();
/// graph.add_vertex(1);
/// graph.add_vertex(2);
/// graph.add_edge(FlowEdge::new(1, 2, FlowEdgeKind::Immediate))?;
/// assert_eq!(preorder(&graph, 1), vec![1, 2]);
/// # Ok::<(), flowscope::Error>(())
/// ```
pub mod prelude;

/// Control flow, statement IR, dataflow, class hierarchy and call graph analyses.
pub mod analysis;

/// Options shared by hierarchy materialization, resolution and tracing.
pub mod config;

/// Classes, methods and descriptors as supplied by a class source.
pub mod program;

/// Shared utilities, most importantly the generic graph layer.
pub mod utils;

/// `flowscope` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`Error`]. This is used consistently throughout the crate for all fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `flowscope` Error type
///
/// The main error type for all operations in this crate. See [`Error`] for the variants and
/// when each is produced.
pub use error::Error;
