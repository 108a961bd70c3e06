//! # flowscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the flowscope library. Import this module to get quick access to the essential
//! types for building graphs and running analyses over them.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all flowscope operations
pub use crate::Error;

/// The result type used throughout flowscope
pub use crate::Result;

/// Options for resolution and tracing
pub use crate::config::AnalysisConfig;

// ================================================================================================
// Graph Layer
// ================================================================================================

/// The generic multigraph and its edge abstraction
pub use crate::utils::graph::{FlowGraph, GraphEdge, Transposed, Vertex};

/// Graph traits shared by every specialization
pub use crate::utils::graph::{GraphBase, MutableGraph, Predecessors, Successors};

/// Depth-first traversal
pub use crate::utils::graph::algorithms::{
    postorder, preorder, reverse_postorder, DfsOrder, SimpleDfs,
};

// ================================================================================================
// Program Model
// ================================================================================================

/// Classes, methods and their handles
pub use crate::program::{
    ApplicationClassSource, ClassFlags, ClassId, ClassNode, ClassSource, MethodFlags, MethodId,
    MethodNode,
};

/// Type and method descriptors
pub use crate::program::{FieldType, MethodDescriptor, ReturnType};

// ================================================================================================
// Control Flow and IR
// ================================================================================================

/// Basic blocks and control flow graphs
pub use crate::analysis::{BasicBlock, BlockId, ControlFlowGraph, FlowEdge, FlowEdgeKind};

/// Statement IR
pub use crate::analysis::{
    CodeListener, Constant, Expr, Invocation, InvokeKind, Local, PhiExpr, Statement,
    StatementGraph, StmtId,
};

// ================================================================================================
// Analyses
// ================================================================================================

/// Dataflow framework and analyses
pub use crate::analysis::dataflow::{
    DataAnalysis, DataflowSolver, LiveLocals, ReachingDefinitionsAnalyser,
};

/// Def-use chains
pub use crate::analysis::DefUseAnalysis;

/// Class hierarchy
pub use crate::analysis::ClassTree;

/// Call graph construction
pub use crate::analysis::callgraph::{
    CallGraph, CallGraphBuilder, CallTracer, EntryPoints, InvocationResolver,
};
