//! Phi expressions for SSA form.
//!
//! A phi expression sits at the head of a block with several predecessors and selects the
//! argument belonging to the predecessor control arrived from. The set of predecessors is
//! fixed when the phi is built; only the arguments can change afterwards.
//!
//! Phis are not executable. They only appear as the right-hand side of a
//! [`Statement::CopyPhi`](super::Statement::CopyPhi) and are removed again when leaving
//! SSA form.

use std::{collections::BTreeMap, fmt};

use crate::{
    analysis::{ssa::Expr, BlockId},
    Result,
};

/// A phi expression.
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::{BlockId, Expr, Local, PhiExpr};
///
/// let (left, right) = (BlockId::new(1), BlockId::new(2));
/// let mut phi = PhiExpr::new([
///     (left, Expr::Local(Local::variable(1))),
///     (right, Expr::Local(Local::variable(2))),
/// ]);
/// assert_eq!(phi.arity(), 2);
///
/// phi.set_argument(right, Expr::Local(Local::variable(3)))?;
/// assert!(phi.set_argument(BlockId::new(9), Expr::Local(Local::variable(4))).is_err());
/// # Ok::<(), flowscope::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PhiExpr {
    args: BTreeMap<BlockId, Expr>,
}

impl PhiExpr {
    /// Creates a phi expression from `(predecessor, argument)` pairs.
    ///
    /// A predecessor listed twice keeps its last argument.
    pub fn new(args: impl IntoIterator<Item = (BlockId, Expr)>) -> Self {
        Self {
            args: args.into_iter().collect(),
        }
    }

    /// Returns the number of predecessors.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Returns the argument for `pred`.
    #[must_use]
    pub fn argument(&self, pred: BlockId) -> Option<&Expr> {
        self.args.get(&pred)
    }

    /// Replaces the argument for `pred`, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Structural`](crate::Error::Structural) if `pred` is not one of the
    /// predecessors this phi was built for.
    pub fn set_argument(&mut self, pred: BlockId, expr: Expr) -> Result<Expr> {
        match self.args.get_mut(&pred) {
            Some(slot) => Ok(std::mem::replace(slot, expr)),
            None => Err(structural_error!(
                "phi has no argument for predecessor {}",
                pred
            )),
        }
    }

    /// Returns the predecessors in ascending order.
    pub fn sources(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.args.keys().copied()
    }

    /// Returns the `(predecessor, argument)` pairs in ascending predecessor order.
    pub fn arguments(&self) -> impl Iterator<Item = (BlockId, &Expr)> + '_ {
        self.args.iter().map(|(pred, expr)| (*pred, expr))
    }

    /// Structural equivalence.
    ///
    /// Equivalent phis have identical predecessor sets and pairwise equivalent arguments.
    #[must_use]
    pub fn equivalent(&self, other: &PhiExpr) -> bool {
        self.args.len() == other.args.len()
            && self.args.iter().all(|(pred, expr)| {
                other
                    .args
                    .get(pred)
                    .is_some_and(|theirs| expr.equivalent(theirs))
            })
    }
}

impl fmt::Display for PhiExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\u{3d5}{{")?;
        for (i, (pred, expr)) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", pred, expr)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::{Constant, Local},
        Error,
    };

    fn block(index: usize) -> BlockId {
        BlockId::new(index)
    }

    #[test]
    fn test_insertion_order_irrelevant() {
        let forward = PhiExpr::new([
            (block(1), Expr::Local(Local::variable(1))),
            (block(2), Expr::Constant(Constant::Int(0))),
        ]);
        let backward = PhiExpr::new([
            (block(2), Expr::Constant(Constant::Int(0))),
            (block(1), Expr::Local(Local::variable(1))),
        ]);
        assert!(forward.equivalent(&backward));
        assert!(backward.equivalent(&forward));
    }

    #[test]
    fn test_changed_argument_breaks_equivalence() {
        let original = PhiExpr::new([
            (block(1), Expr::Local(Local::variable(1))),
            (block(2), Expr::Local(Local::variable(2))),
        ]);
        let mut changed = original.clone();
        let previous = changed
            .set_argument(block(2), Expr::Local(Local::variable(5)))
            .unwrap();

        assert_eq!(previous, Expr::Local(Local::variable(2)));
        assert!(!original.equivalent(&changed));
    }

    #[test]
    fn test_different_sources_not_equivalent() {
        let a = PhiExpr::new([(block(1), Expr::Local(Local::variable(1)))]);
        let b = PhiExpr::new([(block(3), Expr::Local(Local::variable(1)))]);
        assert!(!a.equivalent(&b));
    }

    #[test]
    fn test_unknown_predecessor_rejected() {
        let mut phi = PhiExpr::new([(block(1), Expr::Local(Local::variable(1)))]);
        let result = phi.set_argument(block(7), Expr::Local(Local::variable(2)));
        assert!(matches!(result, Err(Error::Structural { .. })));
        assert_eq!(phi.arity(), 1);
    }

    #[test]
    fn test_display() {
        let phi = PhiExpr::new([
            (block(2), Expr::Local(Local::variable(2))),
            (block(1), Expr::Local(Local::variable(1))),
        ]);
        assert_eq!(phi.to_string(), "\u{3d5}{b1:lvar1, b2:lvar2}");
    }
}
