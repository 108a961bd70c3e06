//! IR statements.
//!
//! Statements are the unit of the IR: basic blocks hold ordered statement lists, and the
//! [`StatementGraph`](super::StatementGraph) connects individual statements by control
//! flow. A statement defines at most one local.

use std::{collections::BTreeMap, fmt};

use crate::analysis::{
    ssa::{Expr, Invocation, Local, PhiExpr},
    BlockId,
};

/// An IR statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Assignment of an expression to a local.
    Copy {
        /// The defined local.
        local: Local,
        /// The assigned value.
        expr: Expr,
    },
    /// Assignment of a phi expression to a local.
    CopyPhi {
        /// The defined local.
        local: Local,
        /// The merged value.
        phi: PhiExpr,
    },
    /// Evaluation of an expression for its side effects (stores, discarded call results).
    Eval(Expr),
    /// Return from the method, with an optional value.
    Return(Option<Expr>),
    /// Raise an exception.
    Throw(Expr),
    /// Unconditional jump.
    Goto(BlockId),
    /// Conditional jump to `target`; falls through otherwise.
    Branch {
        /// Jump condition.
        cond: Expr,
        /// Target when the condition holds.
        target: BlockId,
    },
    /// Multi-way jump.
    Switch {
        /// Value being switched on.
        scrutinee: Expr,
        /// Case targets keyed by case value.
        cases: BTreeMap<i32, BlockId>,
        /// Target when no case matches.
        default: BlockId,
    },
    /// No operation; also used to stand in for empty blocks.
    Nop,
}

impl Statement {
    /// Creates an assignment.
    pub fn copy(local: Local, expr: impl Into<Expr>) -> Self {
        Statement::Copy {
            local,
            expr: expr.into(),
        }
    }

    /// Returns the local defined by this statement.
    #[must_use]
    pub fn defined_local(&self) -> Option<Local> {
        match self {
            Statement::Copy { local, .. } | Statement::CopyPhi { local, .. } => Some(*local),
            _ => None,
        }
    }

    /// Returns `true` for assignments.
    #[must_use]
    pub fn is_definition(&self) -> bool {
        self.defined_local().is_some()
    }

    /// Returns the top-level expressions of this statement.
    ///
    /// Phi arguments are included, in predecessor order.
    #[must_use]
    pub fn expressions(&self) -> Vec<&Expr> {
        match self {
            Statement::Copy { expr, .. } | Statement::Eval(expr) | Statement::Throw(expr) => {
                vec![expr]
            }
            Statement::CopyPhi { phi, .. } => phi.arguments().map(|(_, expr)| expr).collect(),
            Statement::Return(value) => value.iter().collect(),
            Statement::Branch { cond, .. } => vec![cond],
            Statement::Switch { scrutinee, .. } => vec![scrutinee],
            Statement::Goto(_) | Statement::Nop => Vec::new(),
        }
    }

    /// Returns every local read by this statement, in evaluation order.
    ///
    /// A local read twice is reported twice.
    #[must_use]
    pub fn reads(&self) -> Vec<Local> {
        let mut reads = Vec::new();
        for expr in self.expressions() {
            expr.visit_locals(&mut |local| reads.push(local));
        }
        reads
    }

    /// Returns every invocation performed by this statement.
    #[must_use]
    pub fn invocations(&self) -> Vec<&Invocation> {
        let mut invocations = Vec::new();
        for expr in self.expressions() {
            expr.visit_invocations(&mut |invocation| invocations.push(invocation));
        }
        invocations
    }

    /// Returns `true` if this statement can transfer control somewhere other than the
    /// next statement.
    #[must_use]
    pub fn can_change_flow(&self) -> bool {
        matches!(
            self,
            Statement::Return(_)
                | Statement::Throw(_)
                | Statement::Goto(_)
                | Statement::Branch { .. }
                | Statement::Switch { .. }
        )
    }

    /// Returns the blocks this statement may jump to explicitly.
    #[must_use]
    pub fn jump_targets(&self) -> Vec<BlockId> {
        match self {
            Statement::Goto(target) | Statement::Branch { target, .. } => vec![*target],
            Statement::Switch { cases, default, .. } => {
                let mut targets: Vec<BlockId> = cases.values().copied().collect();
                targets.push(*default);
                targets
            }
            _ => Vec::new(),
        }
    }

    /// Structural equivalence.
    #[must_use]
    pub fn equivalent(&self, other: &Statement) -> bool {
        match (self, other) {
            (
                Statement::Copy { local, expr },
                Statement::Copy {
                    local: other_local,
                    expr: other_expr,
                },
            ) => local == other_local && expr.equivalent(other_expr),
            (
                Statement::CopyPhi { local, phi },
                Statement::CopyPhi {
                    local: other_local,
                    phi: other_phi,
                },
            ) => local == other_local && phi.equivalent(other_phi),
            (Statement::Eval(a), Statement::Eval(b)) | (Statement::Throw(a), Statement::Throw(b)) => {
                a.equivalent(b)
            }
            (Statement::Return(a), Statement::Return(b)) => match (a, b) {
                (Some(a), Some(b)) => a.equivalent(b),
                (None, None) => true,
                _ => false,
            },
            (Statement::Goto(a), Statement::Goto(b)) => a == b,
            (
                Statement::Branch { cond, target },
                Statement::Branch {
                    cond: other_cond,
                    target: other_target,
                },
            ) => target == other_target && cond.equivalent(other_cond),
            (
                Statement::Switch {
                    scrutinee,
                    cases,
                    default,
                },
                Statement::Switch {
                    scrutinee: other_scrutinee,
                    cases: other_cases,
                    default: other_default,
                },
            ) => {
                cases == other_cases
                    && default == other_default
                    && scrutinee.equivalent(other_scrutinee)
            }
            (Statement::Nop, Statement::Nop) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Copy { local, expr } => write!(f, "{} = {}", local, expr),
            Statement::CopyPhi { local, phi } => write!(f, "{} = {}", local, phi),
            Statement::Eval(expr) => write!(f, "{}", expr),
            Statement::Return(Some(expr)) => write!(f, "return {}", expr),
            Statement::Return(None) => write!(f, "return"),
            Statement::Throw(expr) => write!(f, "throw {}", expr),
            Statement::Goto(target) => write!(f, "goto {}", target),
            Statement::Branch { cond, target } => write!(f, "if ({}) goto {}", cond, target),
            Statement::Switch {
                scrutinee,
                cases,
                default,
            } => {
                write!(f, "switch ({}) {{", scrutinee)?;
                for (value, target) in cases {
                    write!(f, " {}: {};", value, target)?;
                }
                write!(f, " default: {} }}", default)
            }
            Statement::Nop => write!(f, "nop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Constant, InvokeKind};

    #[test]
    fn test_definitions() {
        let copy = Statement::copy(Local::variable(0), Constant::Int(1));
        assert_eq!(copy.defined_local(), Some(Local::variable(0)));
        assert!(copy.is_definition());
        assert!(!Statement::Return(None).is_definition());
    }

    #[test]
    fn test_reads_include_phi_arguments() {
        let phi = Statement::CopyPhi {
            local: Local::variable(3),
            phi: PhiExpr::new([
                (BlockId::new(1), Expr::Local(Local::variable(1))),
                (BlockId::new(2), Expr::Local(Local::variable(2))),
            ]),
        };
        assert_eq!(phi.reads(), vec![Local::variable(1), Local::variable(2)]);
    }

    #[test]
    fn test_invocations() {
        let call = Invocation::new(
            InvokeKind::Virtual,
            "a/A",
            "f",
            "()V",
            vec![Local::variable(0).into()],
        );
        let stmt = Statement::Eval(Expr::Invoke(call.clone()));
        assert_eq!(stmt.invocations(), vec![&call]);
        assert!(!stmt.can_change_flow());
    }

    #[test]
    fn test_switch_targets_and_flow() {
        let stmt = Statement::Switch {
            scrutinee: Local::stack(0).into(),
            cases: BTreeMap::from([(1, BlockId::new(4)), (2, BlockId::new(5))]),
            default: BlockId::new(6),
        };
        assert!(stmt.can_change_flow());
        assert_eq!(
            stmt.jump_targets(),
            vec![BlockId::new(4), BlockId::new(5), BlockId::new(6)]
        );
        assert_eq!(stmt.reads(), vec![Local::stack(0)]);
    }

    #[test]
    fn test_equivalence() {
        let a = Statement::copy(Local::variable(0), Local::stack(1));
        let b = Statement::copy(Local::variable(0), Local::stack(1));
        let c = Statement::copy(Local::variable(1), Local::stack(1));
        assert!(a.equivalent(&b));
        assert!(!a.equivalent(&c));
        assert!(!a.equivalent(&Statement::Nop));
    }

    #[test]
    fn test_display() {
        let stmt = Statement::Branch {
            cond: Local::variable(2).into(),
            target: BlockId::new(3),
        };
        assert_eq!(stmt.to_string(), "if (lvar2) goto b3");
    }
}
