//! Control flow edge types.
//!
//! This module defines the edge representation shared by the block-level
//! [`ControlFlowGraph`](super::ControlFlowGraph) and the statement-level
//! [`StatementGraph`](crate::analysis::StatementGraph). The edge kind carries the semantic
//! information about how control moves between its endpoints.

use std::fmt;

use crate::{
    utils::graph::{GraphEdge, Vertex},
    Error, Result,
};

/// The key of a switch edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SwitchKey {
    /// Taken when the scrutinee equals the value.
    Case(i32),
    /// Taken when no case matches.
    Default,
}

impl fmt::Display for SwitchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchKey::Case(value) => write!(f, "case {}", value),
            SwitchKey::Default => write!(f, "default"),
        }
    }
}

/// The kind of control flow represented by an edge.
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::{FlowEdgeKind, SwitchKey};
///
/// assert!(FlowEdgeKind::Immediate.is_immediate());
/// assert!(FlowEdgeKind::Switch(SwitchKey::Default).is_switch());
/// assert!(FlowEdgeKind::Exception { catch_type: None, priority: 0 }.is_exceptional());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlowEdgeKind {
    /// Fall-through into the next block in layout order.
    ///
    /// A block has at most one outgoing and at most one incoming immediate edge.
    Immediate,

    /// An explicit unconditional jump (`goto`).
    UnconditionalJump,

    /// The taken branch of a conditional jump.
    ///
    /// The not-taken branch is the block's immediate edge.
    ConditionalJump,

    /// A switch case or the switch default.
    Switch(SwitchKey),

    /// Edge from a protected block to an exception handler.
    Exception {
        /// Internal name of the caught type, `None` for catch-all handlers.
        catch_type: Option<String>,
        /// Position of the handler in the exception table; lower values are tried first.
        priority: u32,
    },
}

impl FlowEdgeKind {
    /// Returns `true` for fall-through edges.
    #[must_use]
    pub const fn is_immediate(&self) -> bool {
        matches!(self, FlowEdgeKind::Immediate)
    }

    /// Returns `true` for explicit jumps, conditional or not.
    #[must_use]
    pub const fn is_jump(&self) -> bool {
        matches!(
            self,
            FlowEdgeKind::UnconditionalJump | FlowEdgeKind::ConditionalJump
        )
    }

    /// Returns `true` for switch edges, including the default edge.
    #[must_use]
    pub const fn is_switch(&self) -> bool {
        matches!(self, FlowEdgeKind::Switch(_))
    }

    /// Returns `true` for edges into exception handlers.
    #[must_use]
    pub const fn is_exceptional(&self) -> bool {
        matches!(self, FlowEdgeKind::Exception { .. })
    }
}

impl fmt::Display for FlowEdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowEdgeKind::Immediate => write!(f, "immediate"),
            FlowEdgeKind::UnconditionalJump => write!(f, "goto"),
            FlowEdgeKind::ConditionalJump => write!(f, "cond"),
            FlowEdgeKind::Switch(key) => write!(f, "switch {}", key),
            FlowEdgeKind::Exception {
                catch_type,
                priority,
            } => write!(
                f,
                "handler#{} {}",
                priority,
                catch_type.as_deref().unwrap_or("*")
            ),
        }
    }
}

/// A typed control flow edge between two vertices.
///
/// # Type Parameters
///
/// * `V` - The vertex type, a [`BlockId`](super::BlockId) in a control flow graph or a
///   [`StmtId`](crate::analysis::StmtId) in a statement graph
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlowEdge<V> {
    /// Source vertex.
    pub src: V,
    /// Destination vertex.
    pub dst: V,
    /// The kind of control transfer.
    pub kind: FlowEdgeKind,
}

impl<V: Vertex> FlowEdge<V> {
    /// Creates a new edge.
    #[must_use]
    pub const fn new(src: V, dst: V, kind: FlowEdgeKind) -> Self {
        Self { src, dst, kind }
    }

    /// Creates a fall-through edge.
    #[must_use]
    pub const fn immediate(src: V, dst: V) -> Self {
        Self::new(src, dst, FlowEdgeKind::Immediate)
    }

    /// Creates an edge into an exception handler.
    #[must_use]
    pub fn exception(src: V, handler: V, catch_type: Option<String>, priority: u32) -> Self {
        Self::new(
            src,
            handler,
            FlowEdgeKind::Exception {
                catch_type,
                priority,
            },
        )
    }
}

impl<V: Vertex> GraphEdge for FlowEdge<V> {
    type Vertex = V;

    fn src(&self) -> V {
        self.src
    }

    fn dst(&self) -> V {
        self.dst
    }

    fn with_endpoints(&self, src: V, dst: V) -> Result<Self> {
        Ok(Self::new(src, dst, self.kind.clone()))
    }

    fn inverted(&self) -> Result<Self> {
        if self.kind.is_exceptional() {
            return Err(Error::UnsupportedOperation("invert exception edge"));
        }
        self.with_endpoints(self.dst, self.src)
    }

    fn is_exceptional(&self) -> bool {
        self.kind.is_exceptional()
    }
}

impl<V: fmt::Display> fmt::Display for FlowEdge<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.src, self.dst, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_predicates() {
        assert!(FlowEdgeKind::Immediate.is_immediate());
        assert!(!FlowEdgeKind::Immediate.is_jump());
        assert!(FlowEdgeKind::UnconditionalJump.is_jump());
        assert!(FlowEdgeKind::ConditionalJump.is_jump());
        assert!(FlowEdgeKind::Switch(SwitchKey::Case(1)).is_switch());
        assert!(!FlowEdgeKind::Switch(SwitchKey::Default).is_exceptional());
    }

    #[test]
    fn test_switch_inverts_with_key() {
        let edge = FlowEdge::new(1usize, 2, FlowEdgeKind::Switch(SwitchKey::Case(-3)));
        let inverted = edge.inverted().unwrap();
        assert_eq!(inverted.src, 2);
        assert_eq!(inverted.dst, 1);
        assert_eq!(inverted.kind, FlowEdgeKind::Switch(SwitchKey::Case(-3)));
    }

    #[test]
    fn test_exception_edge_not_invertible_but_retargetable() {
        let edge = FlowEdge::exception(1usize, 5, Some("java/io/IOException".into()), 2);
        assert!(edge.is_exceptional());
        assert!(matches!(
            edge.inverted(),
            Err(Error::UnsupportedOperation(_))
        ));

        let moved = edge.with_endpoints(3, 5).unwrap();
        assert_eq!(moved.src, 3);
        assert_eq!(moved.kind, edge.kind);
    }

    #[test]
    fn test_display() {
        let edge = FlowEdge::exception(0usize, 1, None, 0);
        assert_eq!(edge.to_string(), "0 -> 1 (handler#0 *)");
        let edge = FlowEdge::new(0usize, 1, FlowEdgeKind::Switch(SwitchKey::Default));
        assert_eq!(edge.to_string(), "0 -> 1 (switch default)");
    }
}
