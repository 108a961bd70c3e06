//! The type universe seen by the analyses.

use std::collections::HashMap;

use log::debug;

use crate::{
    program::{ClassId, ClassNode, MethodId, MethodNode},
    Error, Result,
};

/// Provides classes and their declared methods by name and by handle.
///
/// The analyses never parse class files; they query a `ClassSource` for supertypes,
/// interfaces and method declarations. Library classes are known by name and signature
/// only, their method bodies are never descended into.
pub trait ClassSource {
    /// Looks a class up by internal name.
    fn find_class(&self, name: &str) -> Option<ClassId>;

    /// Returns the class with the given handle.
    fn class(&self, id: ClassId) -> Option<&ClassNode>;

    /// Returns the method with the given handle.
    fn method(&self, id: MethodId) -> Option<&MethodNode>;

    /// Returns every class handle, in insertion order.
    fn classes(&self) -> impl Iterator<Item = ClassId> + '_;

    /// Returns the declared methods of a class, or an empty slice for unknown handles.
    fn methods_of(&self, id: ClassId) -> &[MethodId] {
        self.class(id).map_or(&[][..], |class| class.methods.as_slice())
    }

    /// Returns `true` if the class is part of an external library.
    fn is_library(&self, id: ClassId) -> bool {
        self.class(id).is_some_and(ClassNode::is_library)
    }

    /// Returns the methods of `owner` whose name and descriptor equal `name` and `desc`.
    fn declared_methods<'a>(
        &'a self,
        owner: ClassId,
        name: &'a str,
        desc: &'a str,
    ) -> impl Iterator<Item = MethodId> + 'a {
        self.methods_of(owner).iter().copied().filter(move |&id| {
            self.method(id)
                .is_some_and(|method| method.matches(name, desc))
        })
    }
}

/// In-memory [`ClassSource`] holding application and library classes.
///
/// # Examples
///
/// ```rust
/// use flowscope::program::{ApplicationClassSource, ClassNode, ClassSource, MethodFlags, MethodNode};
///
/// let mut source = ApplicationClassSource::new();
/// source.add_class(ClassNode::new("java/lang/Object", None).library())?;
/// let app = source.add_class(ClassNode::new("app/Main", Some("java/lang/Object")))?;
/// let main = source.add_method(
///     app,
///     MethodNode::new("main", "([Ljava/lang/String;)V", MethodFlags::PUBLIC | MethodFlags::STATIC),
/// )?;
///
/// assert_eq!(source.find_class("app/Main"), Some(app));
/// assert_eq!(source.methods_of(app), &[main]);
/// # Ok::<(), flowscope::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct ApplicationClassSource {
    classes: Vec<ClassNode>,
    methods: Vec<MethodNode>,
    by_name: HashMap<String, ClassId>,
}

impl ApplicationClassSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class and returns its handle.
    ///
    /// Any methods listed on `class` are discarded; methods are added through
    /// [`ApplicationClassSource::add_method`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Structural`] if a class with the same name already exists.
    pub fn add_class(&mut self, mut class: ClassNode) -> Result<ClassId> {
        if self.by_name.contains_key(&class.name) {
            return Err(structural_error!("duplicate class {}", class.name));
        }
        let id = ClassId::new(self.classes.len());
        class.methods.clear();
        debug!("Adding class {} as {}", class.name, id);
        self.by_name.insert(class.name.clone(), id);
        self.classes.push(class);
        Ok(id)
    }

    /// Declares a method on `owner` and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] if `owner` is not a class of this source.
    pub fn add_method(&mut self, owner: ClassId, mut method: MethodNode) -> Result<MethodId> {
        let Some(class) = self.classes.get_mut(owner.index()) else {
            return Err(Error::GraphError(format!("unknown class {}", owner)));
        };
        let id = MethodId::new(self.methods.len());
        method.owner = Some(owner);
        class.methods.push(id);
        self.methods.push(method);
        Ok(id)
    }

    /// Returns a mutable reference to a method, e.g. to attach or rewrite its body.
    pub fn method_mut(&mut self, id: MethodId) -> Option<&mut MethodNode> {
        self.methods.get_mut(id.index())
    }

    /// Returns the first method of `owner` named `name` with descriptor `desc`.
    #[must_use]
    pub fn find_method(&self, owner: &str, name: &str, desc: &str) -> Option<MethodId> {
        let owner = self.find_class(owner)?;
        self.declared_methods(owner, name, desc).next()
    }

    /// Returns the number of classes.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Returns the number of methods.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Returns the handles of all methods, in insertion order.
    pub fn methods(&self) -> impl Iterator<Item = MethodId> + '_ {
        (0..self.methods.len()).map(MethodId::new)
    }
}

impl ClassSource for ApplicationClassSource {
    fn find_class(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    fn class(&self, id: ClassId) -> Option<&ClassNode> {
        self.classes.get(id.index())
    }

    fn method(&self, id: MethodId) -> Option<&MethodNode> {
        self.methods.get(id.index())
    }

    fn classes(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len()).map(ClassId::new)
    }
}
