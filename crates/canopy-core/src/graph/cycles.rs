//! Incremental cycle detection for edge insertion.
//!
//! # Edge Direction
//!
//! Edges run caller → callee. Adding a new edge `from -> to` would create a
//! cycle exactly when `from` is already reachable from `to` through
//! existing edges. The check runs before every `add_edge` commit and is
//! re-run defensively for every edge fused during merge application.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;

use super::VertexData;
use crate::node::VertexId;

/// Check whether adding `from -> to` would introduce a cycle.
///
/// Returns the concrete cycle path when a cycle would be created, as vertex
/// ids formatted `from -> to -> ... -> from`.
///
/// If the edge already exists, this returns `None` (no *new* cycle is
/// created).
#[must_use]
pub(crate) fn would_create_cycle(
    dag: &StableDiGraph<VertexData, ()>,
    from: NodeIndex,
    to: NodeIndex,
) -> Option<Vec<VertexId>> {
    if from == to {
        let id = dag[from].id;
        return Some(vec![id, id]);
    }

    if dag.contains_edge(from, to) {
        return None;
    }

    // BFS from `to` looking for `from`.
    // If reachable, then adding `from -> to` closes a cycle.
    let mut queue: VecDeque<NodeIndex> = VecDeque::from([to]);
    let mut visited: HashSet<NodeIndex> = HashSet::from([to]);
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();

    while let Some(current) = queue.pop_front() {
        if current == from {
            return Some(reconstruct_cycle_path(dag, from, to, &parent));
        }

        for edge in dag.edges(current) {
            let next = edge.target();
            if visited.insert(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    None
}

fn reconstruct_cycle_path(
    dag: &StableDiGraph<VertexData, ()>,
    from: NodeIndex,
    to: NodeIndex,
    parent: &HashMap<NodeIndex, NodeIndex>,
) -> Vec<VertexId> {
    // Parent links represent a path: to -> ... -> from.
    // Rebuild that path and then prepend `from` to represent the newly
    // added edge `from -> to` that closes the cycle.
    let mut to_to_from: Vec<NodeIndex> = vec![from];
    let mut cursor = from;

    while cursor != to {
        if let Some(next) = parent.get(&cursor) {
            cursor = *next;
            to_to_from.push(cursor);
        } else {
            break;
        }
    }

    to_to_from.reverse();

    let mut cycle: Vec<VertexId> = Vec::with_capacity(to_to_from.len() + 1);
    cycle.push(dag[from].id);
    cycle.extend(to_to_from.into_iter().map(|idx| dag[idx].id));
    cycle
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
