//! Class and method declarations.

use std::fmt;

use bitflags::bitflags;

use crate::{
    analysis::ControlFlowGraph,
    program::descriptor::{parse_method_descriptor, MethodDescriptor},
    Result,
};

/// Name of instance initializers.
pub const CONSTRUCTOR_NAME: &str = "<init>";
/// Name of static initializers.
pub const STATIC_INITIALIZER_NAME: &str = "<clinit>";

define_handle!(
    /// Identifier of a class within its [`ClassSource`](super::ClassSource).
    ClassId,
    "c"
);

define_handle!(
    /// Identifier of a method within its [`ClassSource`](super::ClassSource).
    MethodId,
    "m"
);

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Class access flags, with class-file bit values
    pub struct ClassFlags: u16 {
        /// Declared public
        const PUBLIC = 0x0001;
        /// Declared final
        const FINAL = 0x0010;
        /// Is an interface
        const INTERFACE = 0x0200;
        /// Declared abstract
        const ABSTRACT = 0x0400;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Method access flags, with class-file bit values
    pub struct MethodFlags: u16 {
        /// Declared public
        const PUBLIC = 0x0001;
        /// Declared private
        const PRIVATE = 0x0002;
        /// Declared protected
        const PROTECTED = 0x0004;
        /// Declared static
        const STATIC = 0x0008;
        /// Declared final
        const FINAL = 0x0010;
        /// Implemented natively
        const NATIVE = 0x0100;
        /// Declared abstract, no body
        const ABSTRACT = 0x0400;
    }
}

impl ClassFlags {
    /// Extracts the known flags from a raw access word
    #[must_use]
    pub fn from_access(access: u16) -> Self {
        Self::from_bits_truncate(access)
    }
}

impl MethodFlags {
    /// Extracts the known flags from a raw access word
    #[must_use]
    pub fn from_access(access: u16) -> Self {
        Self::from_bits_truncate(access)
    }
}

/// A declared class or interface.
///
/// Classes are created detached and receive their identity when added to an
/// [`ApplicationClassSource`](super::ApplicationClassSource), which also fills
/// [`ClassNode::methods`].
///
/// # Examples
///
/// ```rust
/// use flowscope::program::{ClassFlags, ClassNode};
///
/// let list = ClassNode::new("java/util/ArrayList", Some("java/util/AbstractList"))
///     .with_interface("java/util/List")
///     .with_flags(ClassFlags::PUBLIC)
///     .library();
/// assert!(list.is_library());
/// assert!(!list.is_interface());
/// ```
#[derive(Debug, Clone)]
pub struct ClassNode {
    /// Internal name, e.g. `java/lang/String`.
    pub name: String,
    /// Internal name of the superclass, `None` only for the hierarchy root.
    pub super_name: Option<String>,
    /// Internal names of the directly implemented interfaces.
    pub interfaces: Vec<String>,
    /// Access flags.
    pub access: ClassFlags,
    /// Whether the class belongs to an external library whose bodies are not analyzed.
    pub library: bool,
    /// Declared methods, in declaration order.
    pub methods: Vec<MethodId>,
}

impl ClassNode {
    /// Creates a class without interfaces, flags or methods.
    pub fn new(name: impl Into<String>, super_name: Option<&str>) -> Self {
        Self {
            name: name.into(),
            super_name: super_name.map(str::to_string),
            interfaces: Vec::new(),
            access: ClassFlags::empty(),
            library: false,
            methods: Vec::new(),
        }
    }

    /// Adds a directly implemented interface.
    #[must_use]
    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.interfaces.push(name.into());
        self
    }

    /// Replaces the access flags.
    #[must_use]
    pub fn with_flags(mut self, access: ClassFlags) -> Self {
        self.access = access;
        self
    }

    /// Marks the class as belonging to a library.
    #[must_use]
    pub fn library(mut self) -> Self {
        self.library = true;
        self
    }

    /// Returns `true` for library classes.
    #[must_use]
    pub fn is_library(&self) -> bool {
        self.library
    }

    /// Returns `true` for interfaces.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.access.contains(ClassFlags::INTERFACE)
    }

    /// Returns `true` for abstract classes and interfaces.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.access
            .intersects(ClassFlags::ABSTRACT | ClassFlags::INTERFACE)
    }
}

impl fmt::Display for ClassNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A declared method.
#[derive(Debug, Clone)]
pub struct MethodNode {
    /// Declaring class, assigned when the method is added to a source.
    pub owner: Option<ClassId>,
    /// Method name.
    pub name: String,
    /// Method descriptor, e.g. `(I)V`.
    pub desc: String,
    /// Access flags.
    pub access: MethodFlags,
    /// Pre-decoded body; `None` for abstract, native and library methods.
    pub body: Option<ControlFlowGraph>,
}

impl MethodNode {
    /// Creates a bodiless method.
    pub fn new(name: impl Into<String>, desc: impl Into<String>, access: MethodFlags) -> Self {
        Self {
            owner: None,
            name: name.into(),
            desc: desc.into(),
            access,
            body: None,
        }
    }

    /// Attaches a body.
    #[must_use]
    pub fn with_body(mut self, body: ControlFlowGraph) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns `true` for static methods.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.access.contains(MethodFlags::STATIC)
    }

    /// Returns `true` for abstract methods.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.access.contains(MethodFlags::ABSTRACT)
    }

    /// Returns `true` for instance initializers.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    /// Returns `true` for the static initializer.
    #[must_use]
    pub fn is_static_initializer(&self) -> bool {
        self.name == STATIC_INITIALIZER_NAME
    }

    /// Returns `true` if name and descriptor are exactly `name` and `desc`.
    #[must_use]
    pub fn matches(&self, name: &str, desc: &str) -> bool {
        self.name == name && self.desc == desc
    }

    /// Parses the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidDescriptor`] if the descriptor is malformed.
    pub fn descriptor(&self) -> Result<MethodDescriptor> {
        parse_method_descriptor(&self.desc)
    }
}

impl fmt::Display for MethodNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.desc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_from_access() {
        let flags = MethodFlags::from_access(0x0009 | 0x8000);
        assert_eq!(flags, MethodFlags::PUBLIC | MethodFlags::STATIC);

        let iface = ClassNode::new("a/I", Some("java/lang/Object"))
            .with_flags(ClassFlags::from_access(0x0601));
        assert!(iface.is_interface());
        assert!(iface.is_abstract());
    }

    #[test]
    fn test_method_predicates() {
        let init = MethodNode::new(CONSTRUCTOR_NAME, "(I)V", MethodFlags::PUBLIC);
        assert!(init.is_constructor());
        assert!(!init.is_static());
        assert!(init.matches("<init>", "(I)V"));
        assert_eq!(init.descriptor().unwrap().params.len(), 1);
        assert_eq!(init.to_string(), "<init>(I)V");

        let clinit = MethodNode::new(STATIC_INITIALIZER_NAME, "()V", MethodFlags::STATIC);
        assert!(clinit.is_static_initializer());
    }
}
