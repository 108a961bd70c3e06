//! Invocation target resolution over the class hierarchy.
//!
//! This module resolves the methods an invocation may dispatch to:
//! - Constructor calls resolve to the exact `<init>` declared by the owner
//! - Virtual and interface calls resolve to every congruent override in a subtype plus
//!   the closest declaration found by walking up the hierarchy level by level
//! - Static calls resolve to the first static declaration up the superclass chain
//!
//! Resolution is purely query-driven. Lookups that cannot be satisfied yield empty results
//! unless the resolver was created from a strict
//! [`AnalysisConfig`](crate::config::AnalysisConfig).

use std::collections::{BTreeSet, HashSet};

use log::{debug, warn};

use crate::{
    analysis::{
        hierarchy::ClassTree,
        ssa::{Invocation, InvokeKind},
    },
    config::AnalysisConfig,
    program::{
        descriptor::{parse_method_descriptor, FieldType, MethodDescriptor, ReturnType},
        ClassId, ClassSource, MethodId, CONSTRUCTOR_NAME,
    },
    utils::graph::GraphBase,
    Error, Result,
};

/// A hierarchy level that declared more than one matching method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    /// Owner type of the resolved call.
    pub owner: String,
    /// Method name of the resolved call.
    pub name: String,
    /// Method descriptor of the resolved call.
    pub desc: String,
    /// Every method declared at the ambiguous level.
    pub candidates: BTreeSet<MethodId>,
}

/// Resolves invocation targets using a [`ClassSource`] and its [`ClassTree`].
///
/// The resolver materializes the hierarchy of every class of the source up front, so
/// subtype queries see the whole type universe.
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::InvocationResolver;
/// use flowscope::config::AnalysisConfig;
/// use flowscope::program::{ApplicationClassSource, ClassNode, MethodFlags, MethodNode};
///
/// let mut source = ApplicationClassSource::new();
/// source.add_class(ClassNode::new("java/lang/Object", None))?;
/// let a = source.add_class(ClassNode::new("A", Some("java/lang/Object")))?;
/// let b = source.add_class(ClassNode::new("B", Some("A")))?;
/// let a_f = source.add_method(a, MethodNode::new("f", "()V", MethodFlags::PUBLIC))?;
/// let b_f = source.add_method(b, MethodNode::new("f", "()V", MethodFlags::PUBLIC))?;
///
/// let mut resolver = InvocationResolver::new(&source, &AnalysisConfig::default())?;
/// let targets = resolver.resolve_virtual_calls("A", "f", "()V")?;
/// assert_eq!(targets.into_iter().collect::<Vec<_>>(), vec![a_f, b_f]);
/// # Ok::<(), flowscope::Error>(())
/// ```
pub struct InvocationResolver<'s, S> {
    source: &'s S,
    tree: ClassTree<'s, S>,
    strict: bool,
    record_ambiguities: bool,
    ambiguities: Vec<Ambiguity>,
    stats: ResolverStats,
}

impl<'s, S: ClassSource> InvocationResolver<'s, S> {
    /// Builds a resolver and materializes the hierarchy of every class of `source`.
    ///
    /// Classes whose supertypes cannot be found are skipped with a warning, unless the
    /// configuration is strict.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeNotFound`] if the root type is unknown, or in strict mode if
    /// any class references an unknown supertype.
    pub fn new(source: &'s S, config: &AnalysisConfig) -> Result<Self> {
        let mut tree = ClassTree::new(source, &config.root_type)?;
        let mut skipped_types = 0;
        for class in source.classes() {
            if let Err(err) = tree.add_vertex(class) {
                if config.strict {
                    return Err(err);
                }
                let name = source.class(class).map_or("?", |node| node.name.as_str());
                warn!("Leaving {} out of the class hierarchy: {}", name, err);
                skipped_types += 1;
            }
        }

        Ok(Self {
            source,
            tree,
            strict: config.strict,
            record_ambiguities: config.record_ambiguities,
            ambiguities: Vec::new(),
            stats: ResolverStats {
                skipped_types,
                ..ResolverStats::default()
            },
        })
    }

    /// Returns the class hierarchy.
    #[must_use]
    pub const fn tree(&self) -> &ClassTree<'s, S> {
        &self.tree
    }

    /// Returns the class source.
    #[must_use]
    pub const fn source(&self) -> &'s S {
        self.source
    }

    /// Returns the ambiguous hierarchy levels recorded so far.
    #[must_use]
    pub fn ambiguities(&self) -> &[Ambiguity] {
        &self.ambiguities
    }

    /// Resolves every method `invocation` may dispatch to, based on its kind.
    ///
    /// # Errors
    ///
    /// Fails as the kind-specific resolution does.
    pub fn resolve(&mut self, invocation: &Invocation) -> Result<BTreeSet<MethodId>> {
        let (owner, name, desc) = (
            invocation.owner.as_str(),
            invocation.name.as_str(),
            invocation.desc.as_str(),
        );
        match invocation.kind {
            InvokeKind::Static => Ok(self
                .resolve_static_call(owner, name, desc)?
                .into_iter()
                .collect()),
            InvokeKind::Special if invocation.is_constructor() => {
                self.resolve_virtual_init(owner, desc)
            }
            InvokeKind::Special => Ok(self
                .resolve_special_call(owner, name, desc)?
                .into_iter()
                .collect()),
            InvokeKind::Virtual | InvokeKind::Interface => {
                self.resolve_virtual_calls(owner, name, desc)
            }
        }
    }

    /// Resolves a constructor call to the owner's exactly matching `<init>`.
    ///
    /// # Errors
    ///
    /// - [`Error::Structural`] if the owner declares the constructor more than once
    /// - [`Error::TypeNotFound`] / [`Error::MethodNotFound`] in strict mode when the owner or
    ///   the constructor is missing
    pub fn resolve_virtual_init(&mut self, owner: &str, desc: &str) -> Result<BTreeSet<MethodId>> {
        self.stats.constructor_calls += 1;
        let Some(class) = self.owner_class(owner)? else {
            return Ok(BTreeSet::new());
        };

        let found: BTreeSet<MethodId> = self
            .source
            .declared_methods(class, CONSTRUCTOR_NAME, desc)
            .filter(|&id| self.source.method(id).is_some_and(|m| !m.is_static()))
            .collect();

        match found.len() {
            0 => self.not_found(owner, CONSTRUCTOR_NAME, desc).map(|()| found),
            1 => Ok(found),
            count => Err(structural_error!(
                "{}.{}{} is declared {} times",
                owner,
                CONSTRUCTOR_NAME,
                desc,
                count
            )),
        }
    }

    /// Resolves a virtual or interface call.
    ///
    /// The result is the union of two passes:
    ///
    /// 1. every non-static method with a congruent signature declared by a transitive
    ///    subtype of `owner`, since the receiver may be any subtype;
    /// 2. the closest declaration found by searching `owner`, then its direct supertypes,
    ///    and so on, one hierarchy level at a time. The first level with a match ends the
    ///    search, as it shadows every level above it.
    ///
    /// A level with several matches is ambiguous. Ambiguity never fails resolution; it is
    /// logged and, if configured, recorded in [`InvocationResolver::ambiguities`].
    ///
    /// Calls to `<init>` are resolved as [`InvocationResolver::resolve_virtual_init`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDescriptor`] if `desc` or a candidate's descriptor is malformed
    /// - [`Error::Structural`] if one class declares the same method twice
    /// - [`Error::TypeNotFound`] / [`Error::MethodNotFound`] in strict mode when nothing
    ///   can be resolved
    pub fn resolve_virtual_calls(
        &mut self,
        owner: &str,
        name: &str,
        desc: &str,
    ) -> Result<BTreeSet<MethodId>> {
        if name == CONSTRUCTOR_NAME {
            return self.resolve_virtual_init(owner, desc);
        }
        self.stats.virtual_calls += 1;
        let Some(class) = self.owner_class(owner)? else {
            return Ok(BTreeSet::new());
        };
        let expected = parse_method_descriptor(desc)?;

        let mut targets = BTreeSet::new();
        for subtype in self.tree.all_children(class) {
            for &id in self.source.methods_of(subtype) {
                let Some(method) = self.source.method(id) else {
                    continue;
                };
                if method.is_static() || method.name != name {
                    continue;
                }
                if self.descriptors_congruent(&expected, &method.descriptor()?) {
                    targets.insert(id);
                }
            }
        }

        let mut visited = HashSet::from([class]);
        let mut level = vec![class];
        while !level.is_empty() {
            let mut sites = BTreeSet::new();
            for &current in &level {
                if let Some(found) = self.find_class_method(current, name, desc)? {
                    sites.insert(found);
                }
            }

            if sites.len() > 1 {
                self.report_ambiguity(owner, name, desc, &sites);
            }
            if !sites.is_empty() {
                targets.extend(sites);
                break;
            }

            let mut next = Vec::new();
            for &current in &level {
                for parent in self.direct_supertypes(current) {
                    if visited.insert(parent) {
                        next.push(parent);
                    }
                }
            }
            level = next;
        }

        if targets.is_empty() {
            self.not_found(owner, name, desc)?;
        }
        Ok(targets)
    }

    /// Resolves a static call to the first static declaration on the superclass chain of
    /// `owner`, starting with `owner` itself.
    ///
    /// # Errors
    ///
    /// - [`Error::Structural`] if a class declares the method more than once
    /// - [`Error::TypeNotFound`] / [`Error::MethodNotFound`] in strict mode when the owner is
    ///   unknown or the chain is exhausted
    pub fn resolve_static_call(
        &mut self,
        owner: &str,
        name: &str,
        desc: &str,
    ) -> Result<Option<MethodId>> {
        self.stats.static_calls += 1;
        self.resolve_on_superclass_chain(owner, name, desc, true)
    }

    /// Resolves a non-virtual instance call (`super.f()`, private methods) on the superclass
    /// chain of `owner`.
    fn resolve_special_call(
        &mut self,
        owner: &str,
        name: &str,
        desc: &str,
    ) -> Result<Option<MethodId>> {
        self.stats.special_calls += 1;
        self.resolve_on_superclass_chain(owner, name, desc, false)
    }

    fn resolve_on_superclass_chain(
        &mut self,
        owner: &str,
        name: &str,
        desc: &str,
        want_static: bool,
    ) -> Result<Option<MethodId>> {
        let Some(start) = self.owner_class(owner)? else {
            return Ok(None);
        };
        let mut current = Some(start);
        let mut visited = HashSet::new();
        while let Some(class) = current {
            if !visited.insert(class) {
                break;
            }
            let found: Vec<MethodId> = self
                .source
                .declared_methods(class, name, desc)
                .filter(|&id| {
                    self.source
                        .method(id)
                        .is_some_and(|m| m.is_static() == want_static)
                })
                .collect();
            match found.as_slice() {
                [] => {}
                [single] => return Ok(Some(*single)),
                _ => {
                    return Err(structural_error!(
                        "{} declares {}{} {} times",
                        self.class_name(class),
                        name,
                        desc,
                        found.len()
                    ))
                }
            }
            current = self
                .source
                .class(class)
                .and_then(|node| node.super_name.as_deref())
                .and_then(|super_name| self.source.find_class(super_name));
        }

        self.not_found(owner, name, desc)?;
        Ok(None)
    }

    /// Returns `true` if a method declared with descriptor `actual` can override one
    /// declared with `expected`.
    ///
    /// Parameters must be identical. Identical return types are congruent; otherwise both
    /// returns must be references with the same number of array dimensions whose element
    /// type in `actual` is a subtype of the one in `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] if either descriptor is malformed.
    pub fn is_congruent(&self, expected: &str, actual: &str) -> Result<bool> {
        let expected = parse_method_descriptor(expected)?;
        let actual = parse_method_descriptor(actual)?;
        Ok(self.descriptors_congruent(&expected, &actual))
    }

    fn descriptors_congruent(&self, expected: &MethodDescriptor, actual: &MethodDescriptor) -> bool {
        if expected.params != actual.params {
            return false;
        }
        match (&expected.return_type, &actual.return_type) {
            (e, a) if e == a => true,
            (ReturnType::Type(e), ReturnType::Type(a)) => self.is_covariant(e, a),
            _ => false,
        }
    }

    fn is_covariant(&self, expected: &FieldType, actual: &FieldType) -> bool {
        if expected.dimensions() != actual.dimensions() {
            return false;
        }
        let (FieldType::Object(expected), FieldType::Object(actual)) =
            (expected.element(), actual.element())
        else {
            return false;
        };
        match (self.source.find_class(expected), self.source.find_class(actual)) {
            (Some(expected), Some(actual)) => self.tree.is_subtype(actual, expected),
            _ => false,
        }
    }

    /// Returns the single matching non-static declaration of `class`, preferring concrete
    /// methods over abstract ones.
    fn find_class_method(&self, class: ClassId, name: &str, desc: &str) -> Result<Option<MethodId>> {
        let (mut concrete, mut abstracts) = (Vec::new(), Vec::new());
        for id in self.source.declared_methods(class, name, desc) {
            match self.source.method(id) {
                Some(method) if method.is_static() => {}
                Some(method) if method.is_abstract() => abstracts.push(id),
                Some(_) => concrete.push(id),
                None => {}
            }
        }

        for found in [concrete, abstracts] {
            match found.as_slice() {
                [] => continue,
                [single] => return Ok(Some(*single)),
                [first, second, ..] => {
                    return Err(structural_error!(
                        "{} contains {} and {} for {}{}",
                        self.class_name(class),
                        first,
                        second,
                        name,
                        desc
                    ))
                }
            }
        }
        Ok(None)
    }

    fn direct_supertypes(&self, class: ClassId) -> Vec<ClassId> {
        if self.tree.contains(class) {
            return self.tree.parents(class);
        }
        let Some(node) = self.source.class(class) else {
            return Vec::new();
        };
        node.super_name
            .iter()
            .chain(&node.interfaces)
            .filter_map(|name| {
                let found = self.source.find_class(name);
                if found.is_none() {
                    debug!("Skipping unknown supertype {} of {}", name, node.name);
                }
                found
            })
            .collect()
    }

    fn owner_class(&self, owner: &str) -> Result<Option<ClassId>> {
        match self.source.find_class(owner) {
            Some(class) => Ok(Some(class)),
            None if self.strict => Err(Error::TypeNotFound(owner.to_string())),
            None => {
                debug!("Unknown owner type {}", owner);
                Ok(None)
            }
        }
    }

    fn not_found(&mut self, owner: &str, name: &str, desc: &str) -> Result<()> {
        self.stats.unresolved += 1;
        if self.strict {
            return Err(Error::MethodNotFound {
                owner: owner.to_string(),
                name: name.to_string(),
                desc: desc.to_string(),
            });
        }
        debug!("No declaration of {}.{}{}", owner, name, desc);
        Ok(())
    }

    fn report_ambiguity(
        &mut self,
        owner: &str,
        name: &str,
        desc: &str,
        candidates: &BTreeSet<MethodId>,
    ) {
        self.stats.ambiguous += 1;
        if self.strict {
            warn!("Resolved {}.{}{} to {:?}", owner, name, desc, candidates);
        } else {
            debug!("Resolved {}.{}{} to {:?}", owner, name, desc, candidates);
        }
        if self.record_ambiguities {
            self.ambiguities.push(Ambiguity {
                owner: owner.to_string(),
                name: name.to_string(),
                desc: desc.to_string(),
                candidates: candidates.clone(),
            });
        }
    }

    fn class_name(&self, class: ClassId) -> String {
        self.source
            .class(class)
            .map_or_else(|| class.to_string(), |node| node.name.clone())
    }

    /// Returns statistics about the resolutions performed so far.
    #[must_use]
    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            types: self.tree.vertex_count(),
            ..self.stats.clone()
        }
    }
}

/// Statistics about the resolver state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Number of types in the class hierarchy.
    pub types: usize,
    /// Number of types left out of the hierarchy.
    pub skipped_types: usize,
    /// Number of virtual and interface resolutions.
    pub virtual_calls: usize,
    /// Number of constructor resolutions.
    pub constructor_calls: usize,
    /// Number of static resolutions.
    pub static_calls: usize,
    /// Number of non-virtual instance resolutions.
    pub special_calls: usize,
    /// Number of resolutions that found nothing.
    pub unresolved: usize,
    /// Number of ambiguous hierarchy levels encountered.
    pub ambiguous: usize,
}
