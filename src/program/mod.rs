//! Program model consumed by the analyses.
//!
//! The analyses operate on pre-decoded classes: names, supertypes, access flags and
//! method declarations with optional [`ControlFlowGraph`](crate::analysis::ControlFlowGraph)
//! bodies. Classes and methods live in a [`ClassSource`] arena and are addressed by
//! [`ClassId`] and [`MethodId`] handles.
//!
//! # Key Components
//!
//! - [`ClassNode`] / [`MethodNode`] - Declarations with `bitflags` access sets
//! - [`ClassSource`] - Lookup interface used by the hierarchy and call resolution
//! - [`ApplicationClassSource`] - In-memory source holding application and library classes
//! - [`descriptor`] - Field and method descriptor parsing

mod class;
pub mod descriptor;
mod source;

pub use class::{
    ClassFlags, ClassId, ClassNode, MethodFlags, MethodId, MethodNode, CONSTRUCTOR_NAME,
    STATIC_INITIALIZER_NAME,
};
pub use descriptor::{
    parse_field_descriptor, parse_method_descriptor, BaseType, FieldType, MethodDescriptor,
    ReturnType,
};
pub use source::{ApplicationClassSource, ClassSource};
