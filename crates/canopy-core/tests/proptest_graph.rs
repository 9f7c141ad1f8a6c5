//! Property tests for graph invariants.
//!
//! Graphs are grown from random operation scripts: each step either starts
//! a new root or attaches a child to a previously created vertex, drawing
//! frames from a small name pool so duplicate siblings are common.
//! Reconvergent edges are layered on separately where a property allows
//! arbitrary DAGs.

use std::collections::BTreeSet;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use canopy_core::{Frame, Graph, TraversalOrder, VertexId};

const NAMES: &[&str] = &["main", "solve", "io", "fmt", "gc"];

/// One growth step: (parent selector, frame name index).
type Op = (usize, usize);

fn ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec((0usize..100, 0usize..NAMES.len()), 1..40)
}

fn extra_edges() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0usize..100, 0usize..100), 0..15)
}

/// Grow a forest from an operation script.
///
/// Step `i` picks `slot = selector % (i + 1)`; `slot == i` starts a new
/// root, anything else attaches a child to the `slot`-th created vertex.
fn build_forest(ops: &[Op]) -> (Graph, Vec<VertexId>) {
    let mut graph = Graph::new();
    let mut created: Vec<VertexId> = Vec::with_capacity(ops.len());
    for (i, &(selector, name)) in ops.iter().enumerate() {
        let frame = Frame::name(NAMES[name]);
        let slot = selector % (i + 1);
        let node = if slot == i {
            graph.add_node(frame)
        } else {
            graph
                .add_child(created[slot], frame)
                .expect("parent was created earlier")
        };
        created.push(node.id);
    }
    (graph, created)
}

/// Layer reconvergent edges on top; rejected inserts (cycles, duplicates)
/// are expected and must leave the graph consistent.
fn add_extra_edges(graph: &mut Graph, created: &[VertexId], extra: &[(usize, usize)]) {
    for &(a, b) in extra {
        let parent = created[a % created.len()];
        let child = created[b % created.len()];
        let _ = graph.add_edge(parent, child);
    }
}

fn assert_root_invariant(graph: &Graph) -> Result<(), TestCaseError> {
    let root_ids: BTreeSet<VertexId> = graph.roots().iter().map(|n| n.id).collect();
    for id in graph.node_ids() {
        let in_degree = graph.in_degree(id).expect("vertex exists");
        prop_assert_eq!(
            root_ids.contains(&id),
            in_degree == 0,
            "root set and in-degree disagree for {}",
            id
        );
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn root_set_always_matches_in_degrees(ops in ops(), extra in extra_edges()) {
        let (mut graph, created) = build_forest(&ops);
        assert_root_invariant(&graph)?;

        add_extra_edges(&mut graph, &created, &extra);
        assert_root_invariant(&graph)?;
    }

    #[test]
    fn traversal_reaches_every_vertex(ops in ops(), extra in extra_edges()) {
        let (mut graph, created) = build_forest(&ops);
        add_extra_edges(&mut graph, &created, &extra);

        let mut walk = graph.traverse(TraversalOrder::Pre);
        for _ in walk.by_ref() {}
        let counts = walk.into_visit_counts();

        prop_assert_eq!(counts.len(), graph.node_count());
        prop_assert!(counts.values().all(|&c| c >= 1));

        let pre: BTreeSet<VertexId> =
            graph.traverse(TraversalOrder::Pre).map(|n| n.id).collect();
        let post: BTreeSet<VertexId> =
            graph.traverse(TraversalOrder::Post).map(|n| n.id).collect();
        prop_assert_eq!(pre, post);
    }

    #[test]
    fn normalize_is_idempotent(ops in ops()) {
        let (mut graph, _) = build_forest(&ops);
        graph.normalize().expect("first normalize");
        let second = graph.normalize().expect("second normalize");
        prop_assert!(second.is_empty(), "second normalize found {:?}", second);
    }

    #[test]
    fn normalize_leaves_distinct_sibling_frames(ops in ops()) {
        let (mut graph, _) = build_forest(&ops);
        graph.normalize().expect("normalize");
        assert_root_invariant(&graph)?;

        let root_frames: Vec<_> = graph.roots().iter().map(|n| n.frame().clone()).collect();
        let distinct: BTreeSet<_> = root_frames.iter().collect();
        prop_assert_eq!(distinct.len(), root_frames.len(), "duplicate root frames remain");

        for id in graph.node_ids() {
            let children = graph.get_children(id).expect("vertex exists");
            let frames: Vec<_> = children.iter().map(|c| c.frame().clone()).collect();
            let distinct: BTreeSet<_> = frames.iter().collect();
            prop_assert_eq!(distinct.len(), frames.len(), "duplicate sibling frames under {}", id);
        }
    }

    #[test]
    fn normalize_retires_exactly_the_mapped_ids(ops in ops()) {
        let (mut graph, _) = build_forest(&ops);
        let before: BTreeSet<VertexId> = graph.node_ids().into_iter().collect();
        let merges = graph.normalize().expect("normalize");
        let after: BTreeSet<VertexId> = graph.node_ids().into_iter().collect();

        for (old, new) in &merges {
            prop_assert!(!after.contains(old), "retired id {} still present", old);
            prop_assert!(after.contains(new), "representative {} missing", new);
        }
        prop_assert_eq!(after.len() + merges.len(), before.len());
    }

    #[test]
    fn copy_is_a_bijection_preserving_structure(ops in ops(), extra in extra_edges()) {
        let (mut graph, created) = build_forest(&ops);
        add_extra_edges(&mut graph, &created, &extra);

        let (copied, old_to_new) = graph.copy();

        prop_assert_eq!(copied.node_count(), graph.node_count());
        prop_assert_eq!(copied.edge_count(), graph.edge_count());
        prop_assert_eq!(copied.root_count(), graph.root_count());

        prop_assert_eq!(old_to_new.len(), graph.node_count());
        let distinct: BTreeSet<VertexId> = old_to_new.values().copied().collect();
        prop_assert_eq!(distinct.len(), old_to_new.len());

        // Frames carried across the id translation.
        for (old, new) in &old_to_new {
            let original = graph.node(*old).expect("old id exists");
            let translated = copied.node(*new).expect("new id exists");
            prop_assert_eq!(original.frame(), translated.frame());
        }
    }
}
