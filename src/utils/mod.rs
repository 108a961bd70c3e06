//! Shared utilities that are not tied to a specific analysis.

pub mod graph;
