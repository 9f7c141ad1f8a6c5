//! Known-topology scenario tests for the call-tree engine.
//!
//! Each test builds a hand-crafted graph with known structure and asserts
//! the exact post-condition — true regression tests for the mutation,
//! traversal, and normalization pipeline working together.

use std::collections::BTreeSet;

use canopy_core::{Frame, Graph, GraphError, Node, TraversalOrder, VertexId};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn frame(name: &str) -> Frame {
    Frame::name(name)
}

fn names(nodes: &[Node]) -> Vec<String> {
    nodes
        .iter()
        .map(|n| {
            n.frame()
                .get("name")
                .map(ToString::to_string)
                .unwrap_or_default()
        })
        .collect()
}

fn assert_root_invariant(graph: &Graph) {
    let root_ids: BTreeSet<VertexId> = graph.roots().iter().map(|n| n.id).collect();
    for id in graph.node_ids() {
        let in_degree = graph.in_degree(id).expect("vertex exists");
        assert_eq!(
            root_ids.contains(&id),
            in_degree == 0,
            "root set and in-degree disagree for {id}"
        );
    }
}

// ---------------------------------------------------------------------------
// Scenario: two "main" roots with "foo" children collapse to one subtree
// ---------------------------------------------------------------------------

#[test]
fn duplicate_roots_collapse_recursively() {
    // A {main}            B {main}
    //   └─ foo              └─ foo
    //       ├─ x                ├─ y
    //       └─ shared           └─ shared
    let mut graph = Graph::new();
    let root_a = graph.add_node(frame("main"));
    let foo_a = graph.add_child(&root_a, frame("foo")).expect("add");
    let x = graph.add_child(&foo_a, frame("x")).expect("add");
    let shared_a = graph.add_child(&foo_a, frame("shared")).expect("add");
    let root_b = graph.add_node(frame("main"));
    let foo_b = graph.add_child(&root_b, frame("foo")).expect("add");
    let y = graph.add_child(&foo_b, frame("y")).expect("add");
    graph.add_child(&foo_b, frame("shared")).expect("add");

    let merges = graph.normalize().expect("normalize");

    // Retired: root B, foo B, and B's duplicate "shared" grandchild.
    assert_eq!(merges.len(), 3);
    assert_eq!(merges[&root_b.id], root_a.id);
    assert_eq!(merges[&foo_b.id], foo_a.id);

    // Exactly one root remains, with exactly one "foo" child.
    assert_eq!(graph.root_count(), 1);
    assert_eq!(graph.roots()[0].id, root_a.id);
    let root_children = graph.get_children(&root_a).expect("exists");
    assert_eq!(names(&root_children), vec!["foo"]);

    // foo's children are the union of both originals, "shared" merged.
    let foo_children = graph.get_children(&foo_a).expect("exists");
    assert_eq!(names(&foo_children), vec!["x", "shared", "y"]);
    assert!(foo_children.contains(&x));
    assert!(foo_children.contains(&shared_a));
    assert!(foo_children.contains(&y));

    assert_eq!(graph.node_count(), 5);
    assert_root_invariant(&graph);
    assert!(graph.is_tree());
}

// ---------------------------------------------------------------------------
// Scenario: sibling "bar" duplicates with disjoint children {X} and {Y}
// ---------------------------------------------------------------------------

#[test]
fn sibling_duplicates_union_their_children() {
    let mut graph = Graph::new();
    let root = graph.add_node(frame("main"));
    let bar_a = graph.add_child(&root, frame("bar")).expect("add");
    let bar_b = graph.add_child(&root, frame("bar")).expect("add");
    let x = graph.add_child(&bar_a, frame("x")).expect("add");
    let y = graph.add_child(&bar_b, frame("y")).expect("add");

    graph.normalize().expect("normalize");

    let root_children = graph.get_children(&root).expect("exists");
    assert_eq!(names(&root_children), vec!["bar"]);
    assert_eq!(root_children[0].id, bar_a.id, "lowest id survives");

    let bar_children = graph.get_children(&bar_a).expect("exists");
    assert_eq!(bar_children, vec![x, y]);
    assert!(!graph.contains(&bar_b));
    assert_root_invariant(&graph);
}

// ---------------------------------------------------------------------------
// Structural error handling
// ---------------------------------------------------------------------------

#[test]
fn cycle_rejection_leaves_graph_unchanged() {
    let mut graph = Graph::new();
    let main = graph.add_node(frame("main"));
    let solve = graph.add_child(&main, frame("solve")).expect("add");
    let io = graph.add_child(&solve, frame("io")).expect("add");

    let edges_before = graph.edge_count();
    let err = graph.add_edge(&io, &main).expect_err("descendant -> ancestor");
    assert!(matches!(err, GraphError::WouldCycle { .. }));
    assert_eq!(graph.edge_count(), edges_before);
    assert_root_invariant(&graph);
}

#[test]
fn repeated_edge_never_inflates_edge_count() {
    let mut graph = Graph::new();
    let main = graph.add_node(frame("main"));
    let solve = graph.add_node(frame("solve"));

    graph.add_edge(&main, &solve).expect("first insert");
    let err = graph.add_edge(&main, &solve).expect_err("second insert");
    assert_eq!(
        err,
        GraphError::DuplicateEdge {
            from: main.id,
            to: solve.id,
        }
    );
    assert_eq!(graph.edge_count(), 1);
}

// ---------------------------------------------------------------------------
// Traversal over multiple roots
// ---------------------------------------------------------------------------

#[test]
fn traversal_covers_every_root_reachable_vertex() {
    let mut graph = Graph::new();
    let a = graph.add_node(frame("a"));
    graph.add_child(&a, frame("a1")).expect("add");
    let b = graph.add_node(frame("b"));
    let b1 = graph.add_child(&b, frame("b1")).expect("add");
    graph.add_child(&b1, frame("b2")).expect("add");

    let pre: BTreeSet<VertexId> = graph
        .traverse(TraversalOrder::Pre)
        .map(|n| n.id)
        .collect();
    let post: BTreeSet<VertexId> = graph
        .traverse(TraversalOrder::Post)
        .map(|n| n.id)
        .collect();

    let all: BTreeSet<VertexId> = graph.node_ids().into_iter().collect();
    assert_eq!(pre, all);
    assert_eq!(post, all);
}

#[test]
fn traversal_projects_selected_attributes() {
    let mut graph = Graph::new();
    let main = graph.add_node(Frame::new([
        ("name", canopy_core::AttrValue::from("main")),
        ("line", canopy_core::AttrValue::from(10)),
    ]));
    graph
        .add_child(&main, Frame::new([
            ("name", canopy_core::AttrValue::from("solve")),
            ("line", canopy_core::AttrValue::from(22)),
        ]))
        .expect("add");

    let projected: Vec<String> = graph
        .traverse(TraversalOrder::Pre)
        .map(|n| {
            n.frame()
                .values(&["name", "line"])
                .iter()
                .map(|v| v.map(ToString::to_string).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(":")
        })
        .collect();
    assert_eq!(projected, vec!["main:10", "solve:22"]);
}

// ---------------------------------------------------------------------------
// Copy after normalization
// ---------------------------------------------------------------------------

#[test]
fn normalized_graph_copies_into_bijective_map() {
    let mut graph = Graph::new();
    let root_a = graph.add_node(frame("main"));
    graph.add_child(&root_a, frame("foo")).expect("add");
    let root_b = graph.add_node(frame("main"));
    graph.add_child(&root_b, frame("foo")).expect("add");
    graph.normalize().expect("normalize");

    let (copied, old_to_new) = graph.copy();

    assert_eq!(copied.node_count(), graph.node_count());
    assert_eq!(copied.edge_count(), graph.edge_count());
    assert_eq!(copied.root_count(), graph.root_count());

    assert_eq!(old_to_new.len(), graph.node_count());
    let distinct_new: BTreeSet<VertexId> = old_to_new.values().copied().collect();
    assert_eq!(distinct_new.len(), old_to_new.len(), "map is a bijection");

    // A second normalize on the copy finds nothing left to merge.
    let mut copied = copied;
    assert!(copied.normalize().expect("normalize copy").is_empty());
}
