//! Local variable representation and interning.
//!
//! A [`Local`] is identified by its raw slot number and whether it is a declared variable
//! or a temporary derived from the operand stack. The two kinds live in separate slot
//! spaces, so `lvar0` and `svar0` are different locals.
//!
//! [`LocalsPool`] is the per-analysis registry of issued locals. It is keyed by the
//! structured `(slot, kind)` pair and hands out fresh slots for locals introduced by
//! transforms.

use std::{collections::HashMap, fmt};

/// Kind of a local variable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocalKind {
    /// A variable declared in the method's local variable table (or a parameter).
    Variable,
    /// A temporary introduced for an operand stack slot.
    Stack,
}

/// A local variable of the IR.
///
/// Two locals are the same entity exactly when slot and kind match. Ordering places all
/// declared variables before stack temporaries, then orders by slot.
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::Local;
///
/// let var = Local::variable(1);
/// let tmp = Local::stack(1);
/// assert_ne!(var, tmp);
/// assert!(var < tmp);
/// assert_eq!(var.to_string(), "lvar1");
/// assert_eq!(tmp.to_string(), "svar1");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Local {
    kind: LocalKind,
    index: u32,
}

impl Local {
    /// Creates a local of the given kind.
    #[must_use]
    pub const fn new(index: u32, kind: LocalKind) -> Self {
        Self { kind, index }
    }

    /// Creates a declared variable local.
    #[must_use]
    pub const fn variable(index: u32) -> Self {
        Self::new(index, LocalKind::Variable)
    }

    /// Creates a stack temporary local.
    #[must_use]
    pub const fn stack(index: u32) -> Self {
        Self::new(index, LocalKind::Stack)
    }

    /// Returns the raw slot number.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Returns the kind of slot.
    #[must_use]
    pub const fn kind(&self) -> LocalKind {
        self.kind
    }

    /// Returns `true` for operand stack temporaries.
    #[must_use]
    pub const fn is_stack(&self) -> bool {
        matches!(self.kind, LocalKind::Stack)
    }
}

impl fmt::Debug for Local {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Local {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LocalKind::Variable => write!(f, "lvar{}", self.index),
            LocalKind::Stack => write!(f, "svar{}", self.index),
        }
    }
}

/// Interning key of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct LocalKey {
    index: u32,
    kind: LocalKind,
}

/// Registry of the locals issued during one analysis.
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::{LocalKind, LocalsPool};
///
/// let mut pool = LocalsPool::new();
/// let a = pool.get(0, LocalKind::Variable);
/// let b = pool.get(0, LocalKind::Variable);
/// assert_eq!(a, b);
/// assert_eq!(pool.len(), 1);
///
/// let fresh = pool.new_local(LocalKind::Variable);
/// assert_eq!(fresh.index(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LocalsPool {
    cache: HashMap<LocalKey, Local>,
}

impl LocalsPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the local for `(index, kind)`, registering it on first use.
    pub fn get(&mut self, index: u32, kind: LocalKind) -> Local {
        *self
            .cache
            .entry(LocalKey { index, kind })
            .or_insert_with(|| Local::new(index, kind))
    }

    /// Returns the local for `(index, kind)` if it has been issued.
    #[must_use]
    pub fn lookup(&self, index: u32, kind: LocalKind) -> Option<Local> {
        self.cache.get(&LocalKey { index, kind }).copied()
    }

    /// Issues a local of `kind` on the lowest slot that has not been issued yet.
    pub fn new_local(&mut self, kind: LocalKind) -> Local {
        let mut index = 0;
        while self.cache.contains_key(&LocalKey { index, kind }) {
            index += 1;
        }
        self.get(index, kind)
    }

    /// Returns every issued local in order.
    #[must_use]
    pub fn ordered(&self) -> Vec<Local> {
        let mut locals: Vec<Local> = self.cache.values().copied().collect();
        locals.sort_unstable();
        locals
    }

    /// Returns the highest issued slot of `kind`.
    #[must_use]
    pub fn max_index(&self, kind: LocalKind) -> Option<u32> {
        self.cache
            .keys()
            .filter(|key| key.kind == kind)
            .map(|key| key.index)
            .max()
    }

    /// Returns the number of issued locals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns `true` if no local has been issued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Forgets every issued local.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_slot_and_kind() {
        assert_eq!(Local::variable(3), Local::new(3, LocalKind::Variable));
        assert_ne!(Local::variable(3), Local::stack(3));
        assert!(Local::stack(0).is_stack());
        assert!(!Local::variable(0).is_stack());
    }

    #[test]
    fn test_pool_interns() {
        let mut pool = LocalsPool::new();
        let first = pool.get(2, LocalKind::Stack);
        let second = pool.get(2, LocalKind::Stack);
        assert_eq!(first, second);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.lookup(2, LocalKind::Stack), Some(first));
        assert_eq!(pool.lookup(2, LocalKind::Variable), None);
    }

    #[test]
    fn test_new_local_fills_gaps() {
        let mut pool = LocalsPool::new();
        pool.get(0, LocalKind::Variable);
        pool.get(2, LocalKind::Variable);
        pool.get(0, LocalKind::Stack);

        assert_eq!(pool.new_local(LocalKind::Variable), Local::variable(1));
        assert_eq!(pool.new_local(LocalKind::Variable), Local::variable(3));
        assert_eq!(pool.new_local(LocalKind::Stack), Local::stack(1));
        assert_eq!(pool.max_index(LocalKind::Variable), Some(3));
    }

    #[test]
    fn test_ordered_variables_first() {
        let mut pool = LocalsPool::new();
        pool.get(1, LocalKind::Stack);
        pool.get(4, LocalKind::Variable);
        pool.get(0, LocalKind::Variable);

        assert_eq!(
            pool.ordered(),
            vec![Local::variable(0), Local::variable(4), Local::stack(1)]
        );
    }
}
