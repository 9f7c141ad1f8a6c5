//! Ordered multi-root depth-first traversal.
//!
//! # Overview
//!
//! [`Graph::traverse`] walks the DAG depth-first from every root, roots in
//! ascending id order and children in edge-insertion order, yielding a
//! lazy, finite, non-restartable sequence of vertex handles.
//!
//! - **Pre-order**: a vertex is yielded the first time it is discovered.
//! - **Post-order**: a vertex is yielded after all its descendants.
//!
//! A vertex reachable along more than one path is discovered once per
//! encounter but expanded and yielded only on the first; the per-vertex
//! discovery counts are an explicit output of the traversal
//! ([`Traversal::visit_counts`]), which is what [`Graph::is_tree`] uses to
//! detect shared descendants.
//!
//! The iterator borrows the graph, so mutating the graph while a traversal
//! is outstanding is rejected at compile time — drain or drop the iterator
//! before further mutation.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use crate::error::GraphError;
use crate::node::{Node, VertexId};

use super::Graph;

// ---------------------------------------------------------------------------
// TraversalOrder
// ---------------------------------------------------------------------------

/// Yield discipline for [`Graph::traverse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraversalOrder {
    /// Yield each vertex the first time it is discovered.
    Pre,
    /// Yield each vertex after all of its descendants.
    Post,
}

impl TraversalOrder {
    /// The canonical string form (`"pre"` / `"post"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pre => "pre",
            Self::Post => "post",
        }
    }
}

impl fmt::Display for TraversalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TraversalOrder {
    type Err = GraphError;

    /// Parse `"pre"` or `"post"`; anything else fails before a traversal
    /// can be constructed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre" => Ok(Self::Pre),
            "post" => Ok(Self::Post),
            other => Err(GraphError::UnknownTraversalOrder(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

/// One DFS frame: a vertex and its remaining unexpanded children.
#[derive(Debug)]
struct StackEntry {
    id: VertexId,
    children: Vec<VertexId>,
    next: usize,
}

/// A lazy depth-first walk over a [`Graph`].
///
/// Produced by [`Graph::traverse`]. Finite and non-restartable: once
/// drained it yields `None` forever. Drop it to abandon the walk.
#[derive(Debug)]
pub struct Traversal<'g> {
    graph: &'g Graph,
    order: TraversalOrder,
    pending_roots: VecDeque<VertexId>,
    stack: Vec<StackEntry>,
    visits: BTreeMap<VertexId, usize>,
}

impl<'g> Traversal<'g> {
    fn new(graph: &'g Graph, order: TraversalOrder) -> Self {
        Self {
            graph,
            order,
            pending_roots: graph.roots.iter().copied().collect(),
            stack: Vec::new(),
            visits: BTreeMap::new(),
        }
    }

    /// Per-vertex discovery counts observed so far.
    ///
    /// After the iterator is drained this is the full visit-count table:
    /// every root-reachable vertex maps to the number of times the walk
    /// encountered it (1 for tree-shaped regions, more where paths
    /// reconverge).
    #[must_use]
    pub fn visit_counts(&self) -> &BTreeMap<VertexId, usize> {
        &self.visits
    }

    /// Consume the traversal and take the visit-count table.
    #[must_use]
    pub fn into_visit_counts(self) -> BTreeMap<VertexId, usize> {
        self.visits
    }

    /// Record an encounter. Returns `true` on first discovery.
    fn discover(&mut self, id: VertexId) -> bool {
        let count = self.visits.entry(id).or_insert(0);
        *count += 1;
        *count == 1
    }

    fn push_entry(&mut self, id: VertexId) {
        let children = self
            .graph
            .resolve(id.into())
            .map(|idx| self.graph.child_ids(idx))
            .unwrap_or_default();
        self.stack.push(StackEntry {
            id,
            children,
            next: 0,
        });
    }

    fn node(&self, id: VertexId) -> Option<Node> {
        self.graph.node(id).ok()
    }
}

impl Iterator for Traversal<'_> {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        loop {
            if let Some(top) = self.stack.last_mut() {
                if top.next < top.children.len() {
                    let child = top.children[top.next];
                    top.next += 1;
                    if self.discover(child) {
                        self.push_entry(child);
                        if self.order == TraversalOrder::Pre {
                            return self.node(child);
                        }
                    }
                    continue;
                }
                let finished = self.stack.pop()?;
                if self.order == TraversalOrder::Post {
                    return self.node(finished.id);
                }
                continue;
            }

            let root = self.pending_roots.pop_front()?;
            if self.discover(root) {
                self.push_entry(root);
                if self.order == TraversalOrder::Pre {
                    return self.node(root);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Graph traversal API
// ---------------------------------------------------------------------------

impl Graph {
    /// Walk the graph depth-first from every root.
    ///
    /// Roots are visited in ascending id order, children in edge-insertion
    /// order — deterministic for a fixed graph state.
    #[must_use]
    pub fn traverse(&self, order: TraversalOrder) -> Traversal<'_> {
        Traversal::new(self, order)
    }

    /// Returns `true` iff the DAG degenerates to a simple tree: exactly
    /// one root and no vertex reachable along more than one path.
    #[must_use]
    pub fn is_tree(&self) -> bool {
        if self.roots.len() != 1 {
            return false;
        }
        let mut walk = self.traverse(TraversalOrder::Pre);
        for _ in walk.by_ref() {}
        walk.visit_counts().values().all(|&count| count == 1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
