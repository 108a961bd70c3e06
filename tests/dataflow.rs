//! Dataflow and def-use integration tests.
//!
//! These tests verify the analysis pipeline using the public API:
//! 1. Build a block graph with `ControlFlowGraph`
//! 2. Flatten it into a `StatementGraph`
//! 3. Solve reaching definitions and liveness to a fixed point
//! 4. Edit statements and check that def-use chains follow

use std::collections::BTreeSet;

use flowscope::{
    analysis::{
        dataflow::{DataflowSolver, LiveLocals, ReachingDefinitions, ReachingDefinitionsAnalyser},
        BlockId, Constant, ControlFlowGraph, DefUseAnalysis, Expr, FlowEdgeKind, Local, Statement,
        StatementGraph, StmtId,
    },
    utils::graph::GraphBase,
    Result,
};

fn push(cfg: &mut ControlFlowGraph, block: BlockId, stmt: Statement) {
    cfg.block_mut(block).expect("block exists").push(stmt);
}

/// A: s0 `i = 0`
/// B: s1 `if (i) goto D`
/// C: s2 `i = 1`, s3 `goto B`
/// D: s4 `return i`
fn counting_loop() -> Result<StatementGraph> {
    let i = Local::variable(0);
    let mut cfg = ControlFlowGraph::new();
    let a = cfg.add_block("A");
    let b = cfg.add_block("B");
    let c = cfg.add_block("C");
    let d = cfg.add_block("D");
    push(&mut cfg, a, Statement::copy(i, Constant::Int(0)));
    push(
        &mut cfg,
        b,
        Statement::Branch {
            cond: i.into(),
            target: d,
        },
    );
    push(&mut cfg, c, Statement::copy(i, Constant::Int(1)));
    push(&mut cfg, c, Statement::Goto(b));
    push(&mut cfg, d, Statement::Return(Some(i.into())));
    cfg.add_edge(a, b, FlowEdgeKind::Immediate)?;
    cfg.add_edge(b, c, FlowEdgeKind::Immediate)?;
    cfg.add_edge(b, d, FlowEdgeKind::ConditionalJump)?;
    cfg.add_edge(c, b, FlowEdgeKind::UnconditionalJump)?;
    StatementGraph::from_cfg(&cfg)
}

fn s(index: usize) -> StmtId {
    StmtId::new(index)
}

#[test]
fn test_fixed_point_is_stable() -> Result<()> {
    let graph = counting_loop()?;
    let i = Local::variable(0);

    let mut solver = DataflowSolver::new(ReachingDefinitions);
    solver.init(&graph, graph.entry());
    solver.commit(&graph);

    let first = solver.iterations();
    assert!(first <= graph.vertex_count() * graph.vertex_count());
    assert_eq!(
        solver.in_state(s(4)).and_then(|state| state.get(i)),
        Some(&BTreeSet::from([s(0), s(2)]))
    );

    // Draining an empty queue changes nothing.
    assert!(solver.commit(&graph).is_empty());
    assert_eq!(solver.iterations(), first);

    // A full re-run lands on the same states.
    let snapshot: Vec<_> = graph
        .vertices()
        .map(|v| solver.in_state(v).cloned())
        .collect();
    solver.init(&graph, graph.entry());
    solver.commit(&graph);
    let rerun: Vec<_> = graph
        .vertices()
        .map(|v| solver.in_state(v).cloned())
        .collect();
    assert_eq!(snapshot, rerun);
    Ok(())
}

#[test]
fn test_reaching_definitions_around_loop() -> Result<()> {
    let graph = counting_loop()?;
    let i = Local::variable(0);
    let definitions = ReachingDefinitionsAnalyser::new(&graph);

    assert_eq!(definitions.definitions_at(s(0), i), None);
    assert_eq!(
        definitions.definitions_at(s(1), i),
        Some(&BTreeSet::from([s(0), s(2)]))
    );
    assert_eq!(
        definitions.definitions_at(s(3), i),
        Some(&BTreeSet::from([s(2)]))
    );
    Ok(())
}

#[test]
fn test_liveness_around_loop() -> Result<()> {
    let graph = counting_loop()?;
    let i = Local::variable(0);
    let live = LiveLocals::compute(&graph);

    assert!(live.is_live_out(s(0), i));
    assert!(live.is_live_out(s(2), i));
    assert!(!live.is_live_out(s(4), i));
    assert!(live.dead_definitions(&graph).is_empty());
    Ok(())
}

#[test]
fn test_def_use_round_trip() -> Result<()> {
    // s0: x = 1, s1: y = 2, s2: return y
    let (x, y) = (Local::variable(0), Local::variable(1));
    let mut cfg = ControlFlowGraph::new();
    let block = cfg.add_block("A");
    push(&mut cfg, block, Statement::copy(x, Constant::Int(1)));
    push(&mut cfg, block, Statement::copy(y, Constant::Int(2)));
    push(&mut cfg, block, Statement::Return(Some(y.into())));

    let mut graph = StatementGraph::from_cfg(&cfg)?;
    let mut defuse = DefUseAnalysis::new(&graph);
    assert!(defuse.is_unused(s(0)));

    let read = graph.insert_between(s(1), s(2), Statement::Eval(Expr::Local(x)), &mut defuse)?;
    assert_eq!(defuse.uses_of(s(0)), BTreeSet::from([read]));
    assert_eq!(defuse.definitions_of(read, x), BTreeSet::from([s(0)]));
    assert_eq!(defuse.uses_of(s(1)), BTreeSet::from([s(2)]));

    assert!(graph.remove(read, &mut defuse)?);
    for (stmt, _) in graph.statements() {
        assert!(!defuse.uses_of(stmt).contains(&read));
    }
    assert!(defuse.is_unused(s(0)));
    assert!(defuse.reads_of(read).is_empty());
    Ok(())
}
