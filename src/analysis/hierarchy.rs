//! Type hierarchy graph.
//!
//! [`ClassTree`] models inheritance as an anti-arborescence: every edge points from a type
//! to one of its direct supertypes, so all paths lead to the root type. Vertices are added
//! lazily the first time a type's edges are requested, pulling in the supertype closure
//! from the [`ClassSource`].

use std::{collections::HashSet, fmt};

use log::debug;

use crate::{
    program::{ClassId, ClassSource},
    utils::graph::{
        algorithms::preorder, FlowGraph, GraphBase, GraphEdge, MutableGraph, Predecessors,
        Successors, Transposed,
    },
    Error, Result,
};

/// How a type inherits from its supertype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InheritanceKind {
    /// Superclass edge, at most one per type.
    Extends,
    /// Implemented or extended interface.
    Implements,
}

/// An edge from a type to one of its direct supertypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InheritanceEdge {
    /// The subtype.
    pub src: ClassId,
    /// The direct supertype.
    pub dst: ClassId,
    /// The inheritance relation.
    pub kind: InheritanceKind,
}

impl InheritanceEdge {
    /// Creates an `extends` edge from `child` to `parent`.
    #[must_use]
    pub const fn extends(child: ClassId, parent: ClassId) -> Self {
        Self {
            src: child,
            dst: parent,
            kind: InheritanceKind::Extends,
        }
    }

    /// Creates an `implements` edge from `child` to `parent`.
    #[must_use]
    pub const fn implements(child: ClassId, parent: ClassId) -> Self {
        Self {
            src: child,
            dst: parent,
            kind: InheritanceKind::Implements,
        }
    }
}

impl GraphEdge for InheritanceEdge {
    type Vertex = ClassId;

    fn src(&self) -> ClassId {
        self.src
    }

    fn dst(&self) -> ClassId {
        self.dst
    }

    fn with_endpoints(&self, _src: ClassId, _dst: ClassId) -> Result<Self> {
        Err(Error::UnsupportedOperation("retargeting an inheritance edge"))
    }

    fn inverted(&self) -> Result<Self> {
        Err(Error::UnsupportedOperation("inverting an inheritance edge"))
    }
}

impl fmt::Display for InheritanceEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            InheritanceKind::Extends => write!(f, "{} extends {}", self.src, self.dst),
            InheritanceKind::Implements => write!(f, "{} implements {}", self.src, self.dst),
        }
    }
}

/// The inheritance graph of the types of a [`ClassSource`].
///
/// Requesting the edges of a type that is not yet in the graph materializes it together
/// with every supertype it transitively depends on. Materialization is all or nothing:
/// when any supertype cannot be found, the graph is left untouched.
///
/// Read-only queries such as [`ClassTree::children`] only see materialized types. Use
/// [`ClassTree::add_vertex`] (or let the
/// [`InvocationResolver`](crate::analysis::InvocationResolver) populate the tree) before
/// asking for subtypes.
///
/// The tree supports adding and removing vertices and edges, but none of the splice or
/// duplication operations of [`MutableGraph`]; those fail with
/// [`Error::UnsupportedOperation`].
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::ClassTree;
/// use flowscope::program::{ApplicationClassSource, ClassNode};
///
/// let mut source = ApplicationClassSource::new();
/// let object = source.add_class(ClassNode::new("java/lang/Object", None))?;
/// let list = source.add_class(ClassNode::new("a/List", Some("java/lang/Object")))?;
/// let array = source.add_class(ClassNode::new("a/ArrayList", Some("a/List")))?;
///
/// let mut tree = ClassTree::new(&source, "java/lang/Object")?;
/// assert_eq!(tree.edges(array)?.len(), 1);
/// assert_eq!(tree.all_parents(array), vec![list, object]);
/// assert!(tree.is_subtype(array, object));
/// # Ok::<(), flowscope::Error>(())
/// ```
pub struct ClassTree<'s, S> {
    source: &'s S,
    root: ClassId,
    graph: FlowGraph<ClassId, InheritanceEdge>,
}

impl<'s, S: ClassSource> ClassTree<'s, S> {
    /// Creates a tree containing only the root type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeNotFound`] if `root_name` is unknown to `source`.
    pub fn new(source: &'s S, root_name: &str) -> Result<Self> {
        let root = source
            .find_class(root_name)
            .ok_or_else(|| Error::TypeNotFound(root_name.to_string()))?;
        let mut graph = FlowGraph::new();
        graph.add_vertex(root);
        Ok(Self {
            source,
            root,
            graph,
        })
    }

    /// Returns the root type.
    #[must_use]
    pub const fn root(&self) -> ClassId {
        self.root
    }

    /// Returns the class source backing this tree.
    #[must_use]
    pub const fn source(&self) -> &'s S {
        self.source
    }

    /// Returns `true` if `class` has been materialized.
    #[must_use]
    pub fn contains(&self, class: ClassId) -> bool {
        self.graph.contains_vertex(class)
    }

    /// Returns the underlying graph of materialized types.
    #[must_use]
    pub const fn graph(&self) -> &FlowGraph<ClassId, InheritanceEdge> {
        &self.graph
    }

    /// Materializes `class` and its supertype closure.
    ///
    /// Returns `false` if the type was already part of the tree. A type without a declared
    /// superclass is attached to the root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeNotFound`] if `class` or any of its transitive supertypes is
    /// unknown to the source. The tree is unchanged in that case.
    pub fn add_vertex(&mut self, class: ClassId) -> Result<bool> {
        if self.graph.contains_vertex(class) {
            return Ok(false);
        }

        let mut planned = Vec::new();
        let mut seen = HashSet::from([class]);
        let mut pending = vec![class];
        while let Some(current) = pending.pop() {
            let edges = self.direct_edges(current)?;
            for edge in &edges {
                if !self.graph.contains_vertex(edge.dst) && seen.insert(edge.dst) {
                    pending.push(edge.dst);
                }
            }
            planned.push((current, edges));
        }

        for (vertex, _) in &planned {
            self.graph.add_vertex(*vertex);
        }
        for (_, edges) in planned {
            for edge in edges {
                self.graph.add_edge(edge)?;
            }
        }
        debug!("Materialized {} types for {}", seen.len(), class);
        Ok(true)
    }

    fn direct_edges(&self, class: ClassId) -> Result<Vec<InheritanceEdge>> {
        let node = self
            .source
            .class(class)
            .ok_or_else(|| Error::TypeNotFound(class.to_string()))?;

        let mut edges = Vec::with_capacity(node.interfaces.len() + 1);
        if class != self.root {
            let parent = match &node.super_name {
                Some(name) => self.lookup(name)?,
                None => self.root,
            };
            edges.push(InheritanceEdge::extends(class, parent));
        }
        for name in &node.interfaces {
            edges.push(InheritanceEdge::implements(class, self.lookup(name)?));
        }
        Ok(edges)
    }

    fn lookup(&self, name: &str) -> Result<ClassId> {
        self.source
            .find_class(name)
            .ok_or_else(|| Error::TypeNotFound(name.to_string()))
    }

    /// Returns the supertype edges of `class`, materializing it if needed.
    ///
    /// # Errors
    ///
    /// Fails as [`ClassTree::add_vertex`] does.
    pub fn edges(&mut self, class: ClassId) -> Result<&[InheritanceEdge]> {
        self.add_vertex(class)?;
        Ok(self.graph.edges(class))
    }

    /// Returns the subtype edges of `class`, materializing it if needed.
    ///
    /// Only subtypes that are already materialized are reported.
    ///
    /// # Errors
    ///
    /// Fails as [`ClassTree::add_vertex`] does.
    pub fn reverse_edges(&mut self, class: ClassId) -> Result<&[InheritanceEdge]> {
        self.add_vertex(class)?;
        Ok(self.graph.reverse_edges(class))
    }

    /// Returns the direct supertypes of a materialized type.
    #[must_use]
    pub fn parents(&self, class: ClassId) -> Vec<ClassId> {
        self.graph.successors(class).collect()
    }

    /// Returns the superclass of a materialized type, `None` for the root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Structural`] if a non-root type has no `extends` edge.
    pub fn super_class(&self, class: ClassId) -> Result<Option<ClassId>> {
        if class == self.root {
            return Ok(None);
        }
        self.graph
            .edges(class)
            .iter()
            .find(|edge| edge.kind == InheritanceKind::Extends)
            .map(|edge| Some(edge.dst))
            .ok_or_else(|| structural_error!("{} has no superclass edge", class))
    }

    /// Returns the directly implemented interfaces of a materialized type.
    #[must_use]
    pub fn interfaces(&self, class: ClassId) -> Vec<ClassId> {
        self.graph
            .edges(class)
            .iter()
            .filter(|edge| edge.kind == InheritanceKind::Implements)
            .map(|edge| edge.dst)
            .collect()
    }

    /// Returns the materialized direct subtypes of `class`.
    #[must_use]
    pub fn children(&self, class: ClassId) -> Vec<ClassId> {
        self.graph.predecessors(class).collect()
    }

    /// Returns every transitive supertype of `class` in depth-first preorder, excluding
    /// `class` itself.
    #[must_use]
    pub fn all_parents(&self, class: ClassId) -> Vec<ClassId> {
        if !self.contains(class) {
            return Vec::new();
        }
        preorder(&self.graph, class).into_iter().skip(1).collect()
    }

    /// Returns every materialized transitive subtype of `class` in depth-first preorder,
    /// excluding `class` itself.
    #[must_use]
    pub fn all_children(&self, class: ClassId) -> Vec<ClassId> {
        if !self.contains(class) {
            return Vec::new();
        }
        preorder(&Transposed::new(&self.graph), class)
            .into_iter()
            .skip(1)
            .collect()
    }

    /// Returns `true` if `sub` is `sup` or one of its materialized subtypes.
    #[must_use]
    pub fn is_subtype(&self, sub: ClassId, sup: ClassId) -> bool {
        sub == sup || self.all_parents(sub).contains(&sup)
    }
}

impl<S> fmt::Debug for ClassTree<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassTree")
            .field("root", &self.root)
            .field("graph", &self.graph)
            .finish()
    }
}

impl<S> fmt::Display for ClassTree<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for class in self.graph.vertices() {
            writeln!(f, "{}", class)?;
            for edge in self.graph.edges(class) {
                writeln!(f, "  ^ {}", edge)?;
            }
            for edge in self.graph.reverse_edges(class) {
                writeln!(f, "  v {}", edge)?;
            }
        }
        Ok(())
    }
}

impl<S> GraphBase for ClassTree<'_, S> {
    type Vertex = ClassId;

    fn vertex_count(&self) -> usize {
        self.graph.vertex_count()
    }

    fn vertices(&self) -> impl Iterator<Item = ClassId> {
        self.graph.vertices()
    }
}

impl<S> Successors for ClassTree<'_, S> {
    fn successors(&self, vertex: ClassId) -> impl Iterator<Item = ClassId> {
        self.graph.successors(vertex)
    }
}

impl<S> Predecessors for ClassTree<'_, S> {
    fn predecessors(&self, vertex: ClassId) -> impl Iterator<Item = ClassId> {
        self.graph.predecessors(vertex)
    }
}

impl<S: ClassSource> MutableGraph for ClassTree<'_, S> {
    type Edge = InheritanceEdge;

    fn add_vertex(&mut self, vertex: ClassId) -> Result<bool> {
        ClassTree::add_vertex(self, vertex)
    }

    fn remove_vertex(&mut self, vertex: ClassId) -> bool {
        self.graph.remove_vertex(vertex)
    }

    fn add_edge(&mut self, edge: InheritanceEdge) -> Result<bool> {
        self.graph.add_edge(edge)
    }

    fn remove_edge(&mut self, edge: &InheritanceEdge) -> bool {
        self.graph.remove_edge(edge)
    }

    fn excavate(&mut self, _vertex: ClassId) -> Result<bool> {
        Err(Error::UnsupportedOperation("excavate on the class tree"))
    }

    fn jam(&mut self, _pred: ClassId, _succ: ClassId, _vertex: ClassId) -> Result<bool> {
        Err(Error::UnsupportedOperation("jam on the class tree"))
    }

    fn clone_edge(
        &self,
        _edge: &InheritanceEdge,
        _old: ClassId,
        _new: ClassId,
    ) -> Result<InheritanceEdge> {
        Err(Error::UnsupportedOperation("clone_edge on the class tree"))
    }

    fn invert_edge(&self, _edge: &InheritanceEdge) -> Result<InheritanceEdge> {
        Err(Error::UnsupportedOperation("invert_edge on the class tree"))
    }

    fn copy(&self) -> Result<Self> {
        Err(Error::UnsupportedOperation("copy of the class tree"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{ApplicationClassSource, ClassFlags, ClassNode};

    /// Object <- A <- B <- C, B implements I, I extends J.
    fn source() -> ApplicationClassSource {
        let mut source = ApplicationClassSource::new();
        for class in [
            ClassNode::new("java/lang/Object", None),
            ClassNode::new("J", Some("java/lang/Object")).with_flags(ClassFlags::INTERFACE),
            ClassNode::new("I", Some("java/lang/Object"))
                .with_interface("J")
                .with_flags(ClassFlags::INTERFACE),
            ClassNode::new("A", Some("java/lang/Object")),
            ClassNode::new("B", Some("A")).with_interface("I"),
            ClassNode::new("C", Some("B")),
        ] {
            source.add_class(class).unwrap();
        }
        source
    }

    fn id(source: &ApplicationClassSource, name: &str) -> ClassId {
        source.find_class(name).unwrap()
    }

    #[test]
    fn test_lazy_materialization() {
        let source = source();
        let mut tree = ClassTree::new(&source, "java/lang/Object").unwrap();
        assert_eq!(tree.vertex_count(), 1);

        let c = id(&source, "C");
        let edges = tree.edges(c).unwrap().to_vec();
        assert_eq!(edges, vec![InheritanceEdge::extends(c, id(&source, "B"))]);
        // C, B, A, I, J and the root
        assert_eq!(tree.vertex_count(), 6);
        assert!(!tree.add_vertex(c).unwrap());
    }

    #[test]
    fn test_queries() {
        let source = source();
        let mut tree = ClassTree::new(&source, "java/lang/Object").unwrap();
        let [object, i, j, a, b, c] =
            ["java/lang/Object", "I", "J", "A", "B", "C"].map(|name| id(&source, name));
        tree.add_vertex(c).unwrap();

        assert_eq!(tree.super_class(b).unwrap(), Some(a));
        assert_eq!(tree.super_class(object).unwrap(), None);
        assert_eq!(tree.interfaces(b), vec![i]);
        assert_eq!(tree.parents(b), vec![a, i]);
        assert_eq!(tree.children(a), vec![b]);

        let parents: HashSet<_> = tree.all_parents(c).into_iter().collect();
        assert_eq!(parents, HashSet::from([b, a, i, j, object]));
        assert_eq!(tree.all_children(a), vec![b, c]);
        assert!(tree.is_subtype(c, j));
        assert!(tree.is_subtype(c, c));
        assert!(!tree.is_subtype(a, i));
        assert_eq!(tree.reverse_edges(j).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_supertype_leaves_tree_untouched() {
        let mut source = source();
        let broken = source
            .add_class(ClassNode::new("D", Some("C")).with_interface("Missing"))
            .unwrap();
        let mut tree = ClassTree::new(&source, "java/lang/Object").unwrap();

        let err = tree.add_vertex(broken).unwrap_err();
        assert!(matches!(err, Error::TypeNotFound(name) if name == "Missing"));
        assert_eq!(tree.vertex_count(), 1);
        assert!(matches!(
            ClassTree::new(&source, "java/lang/Nothing"),
            Err(Error::TypeNotFound(_))
        ));
    }

    #[test]
    fn test_splicing_is_unsupported() {
        let source = source();
        let mut tree = ClassTree::new(&source, "java/lang/Object").unwrap();
        let [object, a, b] = ["java/lang/Object", "A", "B"].map(|name| id(&source, name));
        tree.add_vertex(b).unwrap();
        let edge = InheritanceEdge::extends(b, a);

        assert!(matches!(tree.excavate(a), Err(Error::UnsupportedOperation(_))));
        assert!(matches!(tree.jam(b, a, object), Err(Error::UnsupportedOperation(_))));
        assert!(matches!(
            tree.clone_edge(&edge, b, a),
            Err(Error::UnsupportedOperation(_))
        ));
        assert!(matches!(tree.invert_edge(&edge), Err(Error::UnsupportedOperation(_))));
        assert!(matches!(tree.copy(), Err(Error::UnsupportedOperation(_))));
        assert_eq!(tree.parents(b), vec![a]);
    }

    #[test]
    fn test_class_without_superclass_attaches_to_root() {
        let mut source = source();
        let orphan = source.add_class(ClassNode::new("Orphan", None)).unwrap();
        let mut tree = ClassTree::new(&source, "java/lang/Object").unwrap();
        tree.add_vertex(orphan).unwrap();
        assert_eq!(tree.super_class(orphan).unwrap(), Some(tree.root()));

        tree.remove_edge(&InheritanceEdge::extends(orphan, tree.root()));
        assert!(matches!(
            tree.super_class(orphan),
            Err(Error::Structural { .. })
        ));
    }
}
