//! Vertex requirements for graphs.
//!
//! Graphs never own the data behind a vertex. A vertex is a small `Copy` handle
//! (a [`BlockId`](crate::analysis::BlockId), a [`StmtId`](crate::analysis::StmtId), a
//! [`ClassId`](crate::program::ClassId), ...) pointing into an arena held by the owning
//! structure, which keeps mutation free of aliasing and lets graphs be copied by value.

use std::{fmt::Debug, hash::Hash};

/// A value usable as a graph vertex.
///
/// Vertices are compared and hashed by identity. The trait is implemented for every type
/// meeting the bounds, so handle types get it automatically.
pub trait Vertex: Copy + Eq + Ord + Hash + Debug {}

impl<T> Vertex for T where T: Copy + Eq + Ord + Hash + Debug {}
