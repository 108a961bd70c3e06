#![allow(unused_macros)]

/// Declares a strongly-typed arena handle.
///
/// Handles wrap a `usize` index into the arena that owns the underlying item. They are
/// `Copy`, hashable and ordered so they can be used directly as graph vertices and map keys.
/// Identity is the index alone; renaming or mutating the owned item never changes it.
///
/// ```rust, ignore
///  define_handle!(
///      /// Identifier of a basic block.
///      BlockId, "b"
///  );
///  assert_eq!(BlockId::new(3).to_string(), "b3");
/// ```
macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Creates a handle from a raw arena index.
            #[must_use]
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Returns the raw arena index of this handle.
            #[must_use]
            #[inline]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl From<$name> for usize {
            fn from(handle: $name) -> Self {
                handle.0
            }
        }
    };
}
