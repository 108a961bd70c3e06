//! Inter-procedural call tracing.
//!
//! [`CallTracer`] walks methods reachable from an entry point, visiting each one exactly
//! once per trace run. The walk keeps an explicit worklist, so neither deep call chains nor
//! recursive call cycles grow the native stack.

use std::collections::{BTreeSet, HashSet};

use log::debug;

use crate::{
    analysis::{
        callgraph::{CallGraph, EntryPoints, InvocationResolver},
        ssa::{Invocation, InvokeKind},
    },
    config::AnalysisConfig,
    program::{ClassSource, MethodId},
    Result,
};

/// An inter-procedural walk over resolved call targets.
///
/// Implementors provide the visited set, the library test and [`CallTracer::trace_impl`],
/// which scans one method and returns the targets to trace next. The provided
/// [`CallTracer::trace`] drives the walk:
///
/// 1. a method already in the visited set is skipped;
/// 2. otherwise it is marked visited and passed to [`CallTracer::visit_method`];
/// 3. unless it belongs to a library, [`CallTracer::trace_impl`] scans its body and the
///    returned targets are queued.
///
/// Library methods are visited but never scanned.
pub trait CallTracer {
    /// Returns the set of methods visited during the current run.
    fn visited_mut(&mut self) -> &mut HashSet<MethodId>;

    /// Returns `true` if `method` belongs to a library and must not be scanned.
    fn is_library(&self, method: MethodId) -> bool;

    /// Called once for every newly visited method, before its body is scanned.
    ///
    /// # Errors
    ///
    /// An error aborts the trace.
    fn visit_method(&mut self, _method: MethodId) -> Result<()> {
        Ok(())
    }

    /// Called once for every resolved target of an invocation in a scanned body.
    ///
    /// # Errors
    ///
    /// An error aborts the trace.
    fn processed_invocation(
        &mut self,
        _caller: MethodId,
        _callee: MethodId,
        _call: &Invocation,
    ) -> Result<()> {
        Ok(())
    }

    /// Scans `method` and returns the methods to trace from it.
    ///
    /// # Errors
    ///
    /// An error aborts the trace.
    fn trace_impl(&mut self, method: MethodId) -> Result<Vec<MethodId>>;

    /// Traces every method reachable from `method`.
    ///
    /// Methods are processed in depth-first order of discovery.
    ///
    /// # Errors
    ///
    /// Propagates the first error of a hook or of [`CallTracer::trace_impl`].
    fn trace(&mut self, method: MethodId) -> Result<()> {
        let mut worklist = vec![method];
        while let Some(current) = worklist.pop() {
            if !self.visited_mut().insert(current) {
                continue;
            }
            self.visit_method(current)?;
            if self.is_library(current) {
                continue;
            }
            let targets = self.trace_impl(current)?;
            worklist.extend(targets.into_iter().rev());
        }
        Ok(())
    }
}

/// Builds a [`CallGraph`] by tracing method bodies and resolving their invocations.
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::callgraph::{CallGraphBuilder, EntryPoints};
/// use flowscope::analysis::{ControlFlowGraph, Expr, Invocation, InvokeKind, Statement};
/// use flowscope::config::AnalysisConfig;
/// use flowscope::program::{ApplicationClassSource, ClassNode, MethodFlags, MethodNode};
///
/// let mut body = ControlFlowGraph::new();
/// let block = body.add_block("A");
/// let call = Invocation::new(InvokeKind::Static, "app/Main", "helper", "()V", Vec::new());
/// body.block_mut(block).unwrap().push(Statement::Eval(Expr::Invoke(call)));
///
/// let mut source = ApplicationClassSource::new();
/// source.add_class(ClassNode::new("java/lang/Object", None).library())?;
/// let app = source.add_class(ClassNode::new("app/Main", Some("java/lang/Object")))?;
/// let statik = MethodFlags::PUBLIC | MethodFlags::STATIC;
/// let main = source.add_method(
///     app,
///     MethodNode::new("main", "([Ljava/lang/String;)V", statik).with_body(body),
/// )?;
/// let helper = source.add_method(app, MethodNode::new("helper", "()V", statik))?;
///
/// let config = AnalysisConfig::default();
/// let graph = CallGraphBuilder::new(&source, &config)?.build(&EntryPoints::new(&source, &config))?;
/// assert_eq!(graph.callees(main), vec![helper]);
/// # Ok::<(), flowscope::Error>(())
/// ```
pub struct CallGraphBuilder<'s, S> {
    source: &'s S,
    resolver: InvocationResolver<'s, S>,
    visited: HashSet<MethodId>,
    graph: CallGraph,
    trace_libraries: bool,
}

impl<'s, S: ClassSource> CallGraphBuilder<'s, S> {
    /// Creates a builder with a fresh [`InvocationResolver`].
    ///
    /// # Errors
    ///
    /// Fails as [`InvocationResolver::new`] does.
    pub fn new(source: &'s S, config: &AnalysisConfig) -> Result<Self> {
        Ok(Self {
            source,
            resolver: InvocationResolver::new(source, config)?,
            visited: HashSet::new(),
            graph: CallGraph::new(),
            trace_libraries: config.trace_libraries,
        })
    }

    /// Traces every entry point and returns the resulting graph.
    ///
    /// # Errors
    ///
    /// Propagates resolution errors.
    pub fn build(mut self, entries: &EntryPoints<'_, S>) -> Result<CallGraph> {
        for method in entries.methods() {
            self.trace(method)?;
        }
        Ok(self.graph)
    }

    /// Returns the graph recorded so far.
    #[must_use]
    pub const fn graph(&self) -> &CallGraph {
        &self.graph
    }

    /// Returns the resolver.
    #[must_use]
    pub const fn resolver(&self) -> &InvocationResolver<'s, S> {
        &self.resolver
    }

    /// Returns the methods visited so far.
    #[must_use]
    pub const fn visited(&self) -> &HashSet<MethodId> {
        &self.visited
    }

    /// Consumes the builder and returns the graph recorded so far.
    #[must_use]
    pub fn into_graph(self) -> CallGraph {
        self.graph
    }
}

impl<S: ClassSource> CallTracer for CallGraphBuilder<'_, S> {
    fn visited_mut(&mut self) -> &mut HashSet<MethodId> {
        &mut self.visited
    }

    fn is_library(&self, method: MethodId) -> bool {
        self.source
            .method(method)
            .and_then(|node| node.owner)
            .is_some_and(|owner| self.source.is_library(owner))
    }

    fn visit_method(&mut self, method: MethodId) -> Result<()> {
        self.graph.add_method(method);
        Ok(())
    }

    fn processed_invocation(
        &mut self,
        caller: MethodId,
        callee: MethodId,
        call: &Invocation,
    ) -> Result<()> {
        self.graph.add_call(caller, callee, call.kind)?;
        Ok(())
    }

    fn trace_impl(&mut self, method: MethodId) -> Result<Vec<MethodId>> {
        let source = self.source;
        let Some(body) = source.method(method).and_then(|node| node.body.as_ref()) else {
            return Ok(Vec::new());
        };

        let mut targets = Vec::new();
        for block in body.blocks() {
            for stmt in block.statements() {
                for call in stmt.invocations() {
                    let resolved = self.resolver.resolve(call)?;
                    self.record_site(call, &resolved);
                    for callee in resolved {
                        if !self.trace_libraries && self.is_library(callee) {
                            debug!("Not recording library call {} -> {}", method, callee);
                            continue;
                        }
                        self.processed_invocation(method, callee, call)?;
                        targets.push(callee);
                    }
                }
            }
        }
        Ok(targets)
    }
}

impl<S> CallGraphBuilder<'_, S> {
    fn record_site(&mut self, call: &Invocation, resolved: &BTreeSet<MethodId>) {
        self.graph.call_sites += 1;
        if matches!(call.kind, InvokeKind::Virtual | InvokeKind::Interface) {
            self.graph.virtual_sites += 1;
        }
        if !resolved.is_empty() {
            self.graph.resolved_sites += 1;
        }
        if resolved.len() > 1 {
            self.graph.polymorphic_sites += 1;
        }
    }
}
