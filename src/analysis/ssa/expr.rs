//! IR expressions.
//!
//! Expressions form trees hanging off [`Statement`](super::Statement)s. Apart from local
//! reads, constants and invocations, every instruction is represented by an opaque
//! [`Operation`] carrying its opcode, result type and declared side effects.

use std::fmt;

use bitflags::bitflags;
use strum::{Display, EnumIter};

use crate::analysis::ssa::Local;

bitflags! {
    /// Side effects of an [`Operation`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Effects: u8 {
        /// Reads a field, array element or other heap location.
        const READS_HEAP = 0x01;
        /// Writes a field, array element or other heap location.
        const WRITES_HEAP = 0x02;
        /// May raise an exception.
        const MAY_THROW = 0x04;
        /// Allocates a new object or array.
        const ALLOCATES = 0x08;
    }
}

/// A constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// The null reference.
    Null,
    /// A 32-bit integer (also used for `boolean`, `byte`, `char` and `short`).
    Int(i32),
    /// A 64-bit integer.
    Long(i64),
    /// A 32-bit float.
    Float(f32),
    /// A 64-bit float.
    Double(f64),
    /// A string literal.
    String(String),
    /// A class literal, by internal name.
    Class(String),
}

impl Constant {
    /// Bitwise equality, treating `NaN` payloads and signed zeros as distinct values.
    #[must_use]
    pub fn equivalent(&self, other: &Constant) -> bool {
        match (self, other) {
            (Constant::Float(a), Constant::Float(b)) => a.to_bits() == b.to_bits(),
            (Constant::Double(a), Constant::Double(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => write!(f, "null"),
            Constant::Int(v) => write!(f, "{}", v),
            Constant::Long(v) => write!(f, "{}L", v),
            Constant::Float(v) => write!(f, "{}F", v),
            Constant::Double(v) => write!(f, "{}D", v),
            Constant::String(v) => write!(f, "{:?}", v),
            Constant::Class(v) => write!(f, "{}.class", v),
        }
    }
}

/// Dispatch kind of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum InvokeKind {
    /// Dispatch on the runtime class of the receiver.
    Virtual,
    /// Dispatch through an interface method.
    Interface,
    /// Non-virtual call: constructors, private methods and `super` calls.
    Special,
    /// Call to a static method.
    Static,
}

/// A method invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Dispatch kind.
    pub kind: InvokeKind,
    /// Internal name of the referenced owner type.
    pub owner: String,
    /// Method name.
    pub name: String,
    /// Method descriptor.
    pub desc: String,
    /// Arguments, starting with the receiver for non-static calls.
    pub args: Vec<Expr>,
}

impl Invocation {
    /// Creates an invocation.
    pub fn new(
        kind: InvokeKind,
        owner: impl Into<String>,
        name: impl Into<String>,
        desc: impl Into<String>,
        args: Vec<Expr>,
    ) -> Self {
        Self {
            kind,
            owner: owner.into(),
            name: name.into(),
            desc: desc.into(),
            args,
        }
    }

    /// Returns `true` for constructor calls.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }
}

/// An instruction treated as an opaque operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Raw opcode of the instruction.
    pub opcode: u16,
    /// Result type descriptor, `None` for operations without a value.
    pub ty: Option<String>,
    /// Operands.
    pub args: Vec<Expr>,
    /// Declared side effects.
    pub effects: Effects,
}

impl Operation {
    /// Creates an operation.
    #[must_use]
    pub fn new(opcode: u16, ty: Option<String>, args: Vec<Expr>, effects: Effects) -> Self {
        Self {
            opcode,
            ty,
            args,
            effects,
        }
    }
}

/// An IR expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Read of a local.
    Local(Local),
    /// A constant.
    Constant(Constant),
    /// A method invocation.
    Invoke(Invocation),
    /// Any other instruction.
    Operation(Operation),
    /// The exception object on entry to a handler, with the caught type if any.
    CaughtException(Option<String>),
}

impl Expr {
    /// Returns the direct sub-expressions of this expression.
    #[must_use]
    pub fn children(&self) -> &[Expr] {
        match self {
            Expr::Invoke(invocation) => &invocation.args,
            Expr::Operation(operation) => &operation.args,
            Expr::Local(_) | Expr::Constant(_) | Expr::CaughtException(_) => &[],
        }
    }

    /// Calls `f` for this expression and every nested expression, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            f(expr);
            stack.extend(expr.children().iter().rev());
        }
    }

    /// Calls `f` for every local read in this expression, in evaluation order.
    pub fn visit_locals(&self, f: &mut impl FnMut(Local)) {
        self.walk(&mut |expr| {
            if let Expr::Local(local) = expr {
                f(*local);
            }
        });
    }

    /// Calls `f` for every invocation in this expression, outermost first.
    pub fn visit_invocations<'a>(&'a self, f: &mut impl FnMut(&'a Invocation)) {
        self.walk(&mut |expr| {
            if let Expr::Invoke(invocation) = expr {
                f(invocation);
            }
        });
    }

    /// Structural equivalence.
    ///
    /// Two expressions are equivalent when they have the same shape and every leaf is
    /// equivalent. Unlike `==`, floating point constants are compared bitwise.
    #[must_use]
    pub fn equivalent(&self, other: &Expr) -> bool {
        match (self, other) {
            (Expr::Local(a), Expr::Local(b)) => a == b,
            (Expr::Constant(a), Expr::Constant(b)) => a.equivalent(b),
            (Expr::CaughtException(a), Expr::CaughtException(b)) => a == b,
            (Expr::Invoke(a), Expr::Invoke(b)) => {
                a.kind == b.kind
                    && a.owner == b.owner
                    && a.name == b.name
                    && a.desc == b.desc
                    && all_equivalent(&a.args, &b.args)
            }
            (Expr::Operation(a), Expr::Operation(b)) => {
                a.opcode == b.opcode
                    && a.ty == b.ty
                    && a.effects == b.effects
                    && all_equivalent(&a.args, &b.args)
            }
            _ => false,
        }
    }
}

/// Pairwise equivalence of two operand lists.
fn all_equivalent(a: &[Expr], b: &[Expr]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equivalent(y))
}

impl From<Local> for Expr {
    fn from(local: Local) -> Self {
        Expr::Local(local)
    }
}

impl From<Constant> for Expr {
    fn from(constant: Constant) -> Self {
        Expr::Constant(constant)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Local(local) => write!(f, "{}", local),
            Expr::Constant(constant) => write!(f, "{}", constant),
            Expr::CaughtException(ty) => {
                write!(f, "catch({})", ty.as_deref().unwrap_or("*"))
            }
            Expr::Invoke(invocation) => {
                write!(
                    f,
                    "{} {}.{}{}(",
                    invocation.kind, invocation.owner, invocation.name, invocation.desc
                )?;
                write_args(f, &invocation.args)?;
                write!(f, ")")
            }
            Expr::Operation(operation) => {
                write!(f, "op{:#04x}(", operation.opcode)?;
                write_args(f, &operation.args)?;
                write!(f, ")")
            }
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Operation(Operation::new(
            0x60,
            Some("I".into()),
            vec![lhs, rhs],
            Effects::empty(),
        ))
    }

    #[test]
    fn test_visit_locals_in_order() {
        let expr = add(
            Local::variable(1).into(),
            add(Local::stack(0).into(), Local::variable(1).into()),
        );
        let mut reads = Vec::new();
        expr.visit_locals(&mut |local| reads.push(local));
        assert_eq!(
            reads,
            vec![Local::variable(1), Local::stack(0), Local::variable(1)]
        );
    }

    #[test]
    fn test_visit_nested_invocations() {
        let inner = Expr::Invoke(Invocation::new(
            InvokeKind::Static,
            "a/B",
            "g",
            "()I",
            vec![],
        ));
        let outer = Expr::Invoke(Invocation::new(
            InvokeKind::Virtual,
            "a/B",
            "f",
            "(I)V",
            vec![Local::variable(0).into(), inner],
        ));

        let mut names = Vec::new();
        outer.visit_invocations(&mut |invocation| names.push(invocation.name.clone()));
        assert_eq!(names, vec!["f", "g"]);
    }

    #[test]
    fn test_equivalence_is_structural() {
        let a = add(Local::variable(0).into(), Constant::Int(1).into());
        let b = add(Local::variable(0).into(), Constant::Int(1).into());
        let c = add(Local::variable(0).into(), Constant::Int(2).into());
        assert!(a.equivalent(&b));
        assert!(!a.equivalent(&c));

        let nan = Expr::Constant(Constant::Double(f64::NAN));
        assert!(nan.equivalent(&nan.clone()));
        assert!(!Expr::Constant(Constant::Float(0.0))
            .equivalent(&Expr::Constant(Constant::Float(-0.0))));
    }

    #[test]
    fn test_display() {
        let call = Expr::Invoke(Invocation::new(
            InvokeKind::Special,
            "a/B",
            "<init>",
            "(I)V",
            vec![Local::stack(0).into(), Constant::Int(3).into()],
        ));
        assert_eq!(call.to_string(), "special a/B.<init>(I)V(svar0, 3)");
    }
}
