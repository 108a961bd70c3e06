//! Notification hooks for structural changes to a [`StatementGraph`].
//!
//! Every mutation of a [`StatementGraph`] calls into a [`CodeListener`] synchronously, with
//! the graph passed back in its post-mutation state (or, for
//! [`pre_remove`](CodeListener::pre_remove), its pre-mutation state). Analyses that cache
//! per-statement facts implement the trait to stay consistent with the code.

use crate::{
    analysis::ssa::{StatementGraph, StmtId},
    Result,
};

/// Receives notifications about statement graph mutations.
///
/// All callbacks default to doing nothing.
pub trait CodeListener {
    /// `stmt` was spliced in between `pred` and `succ`.
    ///
    /// # Errors
    ///
    /// Implementations may fail if their cached state cannot be updated.
    fn insert(
        &mut self,
        graph: &StatementGraph,
        pred: StmtId,
        stmt: StmtId,
        succ: StmtId,
    ) -> Result<()> {
        let _ = (graph, pred, stmt, succ);
        Ok(())
    }

    /// `stmt` is about to be removed. It is still part of `graph`.
    ///
    /// # Errors
    ///
    /// Implementations may fail if their cached state cannot be updated.
    fn pre_remove(&mut self, graph: &StatementGraph, stmt: StmtId) -> Result<()> {
        let _ = (graph, stmt);
        Ok(())
    }

    /// `stmt` has been removed; its predecessors now flow into its former successors.
    ///
    /// # Errors
    ///
    /// Implementations may fail if their cached state cannot be updated.
    fn post_remove(&mut self, graph: &StatementGraph, stmt: StmtId) -> Result<()> {
        let _ = (graph, stmt);
        Ok(())
    }

    /// `old` was replaced by `new`, which took over all of its edges.
    ///
    /// # Errors
    ///
    /// Implementations may fail if their cached state cannot be updated.
    fn replaced(&mut self, graph: &StatementGraph, old: StmtId, new: StmtId) -> Result<()> {
        let _ = (graph, old, new);
        Ok(())
    }

    /// `stmt` was modified in place, for example a phi argument was changed.
    ///
    /// # Errors
    ///
    /// Implementations may fail if their cached state cannot be updated.
    fn updated(&mut self, graph: &StatementGraph, stmt: StmtId) -> Result<()> {
        let _ = (graph, stmt);
        Ok(())
    }
}

/// A listener that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl CodeListener for NoopListener {}
