//! Call resolution and call graph integration tests.
//!
//! These tests build small type universes through the public API and verify:
//! 1. Virtual dispatch over shadowed and overriding subclasses
//! 2. Constructor resolution in strict and lenient mode
//! 3. Cycle safety and library handling of the call tracer
//! 4. Call graphs built from discovered entry points

use std::collections::BTreeSet;

use flowscope::{
    analysis::{
        callgraph::{CallGraphBuilder, CallTracer, EntryPoints, InvocationResolver},
        ControlFlowGraph, Expr, Invocation, InvokeKind, Statement,
    },
    config::AnalysisConfig,
    program::{
        ApplicationClassSource, ClassFlags, ClassId, ClassNode, MethodFlags, MethodId, MethodNode,
    },
    Error, Result,
};

const OBJECT: &str = "java/lang/Object";

/// Builds a single-block body that performs the given calls in order.
fn body(calls: &[(InvokeKind, &str, &str, &str)]) -> ControlFlowGraph {
    let mut cfg = ControlFlowGraph::new();
    let block = cfg.add_block("A");
    if let Some(block) = cfg.block_mut(block) {
        for &(kind, owner, name, desc) in calls {
            let call = Invocation::new(kind, owner, name, desc, Vec::new());
            block.push(Statement::Eval(Expr::Invoke(call)));
        }
        block.push(Statement::Return(None));
    }
    cfg
}

/// A universe holding only the library root type.
fn universe() -> Result<ApplicationClassSource> {
    let mut source = ApplicationClassSource::new();
    source.add_class(ClassNode::new(OBJECT, None).library())?;
    Ok(source)
}

/// Routes resolver and tracer logs to the test output.
fn init_logging() {
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

fn set(methods: &[MethodId]) -> BTreeSet<MethodId> {
    methods.iter().copied().collect()
}

/// `A` declares `f()`, `B extends A` does not override it, `C extends B` does.
#[test]
fn test_virtual_call_skips_shadowed_class() -> Result<()> {
    init_logging();
    let mut source = universe()?;
    let a = source.add_class(ClassNode::new("A", Some(OBJECT)))?;
    source.add_class(ClassNode::new("B", Some("A")))?;
    let c = source.add_class(ClassNode::new("C", Some("B")))?;
    let a_f = source.add_method(a, MethodNode::new("f", "()V", MethodFlags::PUBLIC))?;
    let c_f = source.add_method(c, MethodNode::new("f", "()V", MethodFlags::PUBLIC))?;

    let mut resolver = InvocationResolver::new(&source, &AnalysisConfig::strict())?;
    assert_eq!(resolver.resolve_virtual_calls("A", "f", "()V")?, set(&[a_f, c_f]));

    // From B the search has to ascend to A before it finds a declaration.
    assert_eq!(resolver.resolve_virtual_calls("B", "f", "()V")?, set(&[a_f, c_f]));

    // From C the override shadows A.f.
    assert_eq!(resolver.resolve_virtual_calls("C", "f", "()V")?, set(&[c_f]));
    assert!(resolver.ambiguities().is_empty());
    Ok(())
}

#[test]
fn test_interface_call_reaches_implementations() -> Result<()> {
    let mut source = universe()?;
    let shape = source.add_class(
        ClassNode::new("Shape", Some(OBJECT))
            .with_flags(ClassFlags::INTERFACE | ClassFlags::ABSTRACT),
    )?;
    let circle = source.add_class(ClassNode::new("Circle", Some(OBJECT)).with_interface("Shape"))?;
    let square = source.add_class(ClassNode::new("Square", Some(OBJECT)).with_interface("Shape"))?;
    let abstract_area = source.add_method(
        shape,
        MethodNode::new("area", "()D", MethodFlags::PUBLIC | MethodFlags::ABSTRACT),
    )?;
    let circle_area = source.add_method(circle, MethodNode::new("area", "()D", MethodFlags::PUBLIC))?;
    let square_area = source.add_method(square, MethodNode::new("area", "()D", MethodFlags::PUBLIC))?;

    let mut resolver = InvocationResolver::new(&source, &AnalysisConfig::default())?;
    let call = Invocation::new(InvokeKind::Interface, "Shape", "area", "()D", Vec::new());
    assert_eq!(
        resolver.resolve(&call)?,
        set(&[abstract_area, circle_area, square_area])
    );
    Ok(())
}

#[test]
fn test_constructor_resolution() -> Result<()> {
    let mut source = universe()?;
    let point = source.add_class(ClassNode::new("Point", Some(OBJECT)))?;
    let init = source.add_method(point, MethodNode::new("<init>", "(I)V", MethodFlags::PUBLIC))?;
    source.add_method(point, MethodNode::new("<init>", "()V", MethodFlags::PUBLIC))?;
    source.add_class(ClassNode::new("Empty", Some(OBJECT)))?;

    let mut lenient = InvocationResolver::new(&source, &AnalysisConfig::default())?;
    assert_eq!(lenient.resolve_virtual_init("Point", "(I)V")?, set(&[init]));
    assert!(lenient.resolve_virtual_init("Empty", "(I)V")?.is_empty());

    let mut strict = InvocationResolver::new(&source, &AnalysisConfig::strict())?;
    assert_eq!(strict.resolve_virtual_init("Point", "(I)V")?, set(&[init]));
    assert!(matches!(
        strict.resolve_virtual_init("Empty", "(I)V"),
        Err(Error::MethodNotFound { .. })
    ));
    Ok(())
}

#[test]
fn test_tracer_visits_mutual_recursion_once() -> Result<()> {
    init_logging();
    let mut source = universe()?;
    let app = source.add_class(ClassNode::new("app/Main", Some(OBJECT)))?;
    let statik = MethodFlags::PUBLIC | MethodFlags::STATIC;
    let p = source.add_method(
        app,
        MethodNode::new("p", "()V", statik)
            .with_body(body(&[(InvokeKind::Static, "app/Main", "q", "()V")])),
    )?;
    let q = source.add_method(
        app,
        MethodNode::new("q", "()V", statik)
            .with_body(body(&[(InvokeKind::Static, "app/Main", "p", "()V")])),
    )?;

    let mut builder = CallGraphBuilder::new(&source, &AnalysisConfig::default())?;
    builder.trace(p)?;
    builder.trace(p)?;

    assert_eq!(builder.visited().len(), 2);
    let graph = builder.into_graph();
    assert_eq!(graph.callees(p), vec![q]);
    assert_eq!(graph.callees(q), vec![p]);
    assert!(graph.is_recursive(p));
    assert_eq!(graph.stats().total_call_sites, 2);
    Ok(())
}

#[test]
fn test_build_from_discovered_entry_points() -> Result<()> {
    let mut source = universe()?;
    let object = ClassId::new(0);
    let to_string = source.add_method(
        object,
        MethodNode::new("toString", "()Ljava/lang/String;", MethodFlags::PUBLIC),
    )?;
    let app = source.add_class(ClassNode::new("app/Main", Some(OBJECT)))?;
    let main = source.add_method(
        app,
        MethodNode::new(
            "main",
            "([Ljava/lang/String;)V",
            MethodFlags::PUBLIC | MethodFlags::STATIC,
        )
        .with_body(body(&[
            (InvokeKind::Special, "app/Main", "<init>", "()V"),
            (InvokeKind::Virtual, "app/Main", "toString", "()Ljava/lang/String;"),
        ])),
    )?;
    let init = source.add_method(
        app,
        MethodNode::new("<init>", "()V", MethodFlags::PUBLIC).with_body(body(&[])),
    )?;
    let unreached = source.add_method(app, MethodNode::new("unused", "()V", MethodFlags::PUBLIC))?;

    let config = AnalysisConfig::default();
    let graph = CallGraphBuilder::new(&source, &config)?.build(&EntryPoints::new(&source, &config))?;

    assert_eq!(graph.callees(main), vec![to_string, init]);
    assert!(!graph.contains(unreached));
    assert_eq!(graph.entry_points(), vec![main]);

    let stats = graph.stats();
    assert_eq!(stats.total_call_sites, 2);
    assert_eq!(stats.resolved_calls, 2);
    assert!((stats.resolution_rate() - 100.0).abs() < f64::EPSILON);
    Ok(())
}

#[test]
fn test_library_calls_dropped_when_not_traced() -> Result<()> {
    init_logging();
    let mut source = universe()?;
    let hash = source.add_method(
        ClassId::new(0),
        MethodNode::new("hashCode", "()I", MethodFlags::PUBLIC),
    )?;
    let app = source.add_class(ClassNode::new("app/Main", Some(OBJECT)))?;
    let run = source.add_method(
        app,
        MethodNode::new("run", "()V", MethodFlags::PUBLIC)
            .with_body(body(&[(InvokeKind::Virtual, OBJECT, "hashCode", "()I")])),
    )?;

    let config = AnalysisConfig {
        trace_libraries: false,
        ..AnalysisConfig::default()
    };
    let mut entries = EntryPoints::new(&source, &config);
    entries.add(run);
    let graph = CallGraphBuilder::new(&source, &config)?.build(&entries)?;

    assert!(!graph.contains(hash));
    assert_eq!(graph.method_count(), 1);
    Ok(())
}
