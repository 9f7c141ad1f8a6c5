//! Call-tree DAG storage and mutation.
//!
//! # Overview
//!
//! [`Graph`] owns a multi-root directed acyclic graph of call-tree vertices.
//! Each vertex binds a monotonically assigned [`VertexId`] to one
//! [`Frame`]; edges are caller→callee relations. Storage is a petgraph
//! [`StableDiGraph`] plus an id→index side map, so vertex retirement during
//! merge application never shifts surviving indices.
//!
//! ## Pipeline
//!
//! ```text
//! add_node / add_parent / add_child / add_edge
//!        ↓  incremental root tracking, cycle + duplicate guards
//! Graph (multi-root DAG)
//!        ↓  traverse()            ordered DFS with visit counts
//!        ↓  normalize()           collapse duplicate sibling subtrees
//!        ↓  copy()                independent clone + old→new id map
//! ```
//!
//! ## Invariants
//!
//! - The edge relation is acyclic; violating inserts fail before commit.
//! - No parallel edges between the same ordered pair.
//! - `roots` is exactly the zero-in-degree vertex set, maintained
//!   incrementally by every mutation and recomputed once after merge
//!   application.
//!
//! ## Typical Usage
//!
//! ```rust,ignore
//! use canopy_core::{Frame, Graph, TraversalOrder};
//!
//! let mut graph = Graph::new();
//! let main = graph.add_node(Frame::name("main"));
//! let solve = graph.add_child(&main, Frame::name("solve"))?;
//! graph.add_child(&solve, Frame::name("io"))?;
//!
//! let merges = graph.normalize()?;
//! for node in graph.traverse(TraversalOrder::Pre) {
//!     println!("{node}");
//! }
//! ```

mod cycles;
pub mod normalize;
pub mod stats;
pub mod traverse;

pub use normalize::MergeMap;
pub use stats::GraphStats;
pub use traverse::{Traversal, TraversalOrder};

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use tracing::instrument;

use crate::error::{GraphError, Result};
use crate::frame::Frame;
use crate::node::{Node, VertexId, VertexRef};

// ---------------------------------------------------------------------------
// VertexData
// ---------------------------------------------------------------------------

/// Vertex payload: identity, frame, and caller-maintained depth.
#[derive(Debug, Clone)]
pub(crate) struct VertexData {
    pub(crate) id: VertexId,
    pub(crate) frame: Arc<Frame>,
    pub(crate) depth: Option<u32>,
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// A multi-root call-tree DAG.
///
/// Vertices are created only through [`Graph::add_node`],
/// [`Graph::add_parent`], and [`Graph::add_child`]; they are never deleted
/// individually — a vertex id is only retired when
/// [`Graph::merge_nodes`] folds it into a surviving representative.
#[derive(Debug, Default, Clone)]
pub struct Graph {
    /// Vertex and edge storage. Stable indices survive removals.
    pub(crate) dag: StableDiGraph<VertexData, ()>,
    /// Mapping from vertex id to petgraph index.
    pub(crate) index: HashMap<VertexId, NodeIndex>,
    /// Exactly the zero-in-degree vertex ids, in ascending order.
    pub(crate) roots: BTreeSet<VertexId>,
    /// Monotone id source; never decremented, ids never reused.
    next_id: u64,
}

impl Graph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Mutation primitives
    // -----------------------------------------------------------------------

    /// Create a new vertex with no edges.
    ///
    /// The vertex starts as a root (it has no incoming edges).
    pub fn add_node(&mut self, frame: Frame) -> Node {
        let (id, idx) = self.insert_vertex(Arc::new(frame), None);
        self.roots.insert(id);
        self.handle(idx)
    }

    /// Create a new vertex for `parent_frame` and an edge from it to `child`.
    ///
    /// The new parent joins the root set; `child` leaves it if it was a
    /// root (it now has an incoming edge).
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownVertex`] if `child` is not in this graph.
    pub fn add_parent(
        &mut self,
        child: impl Into<VertexRef>,
        parent_frame: Frame,
    ) -> Result<Node> {
        let child_ref = child.into();
        let child_idx = self.resolve(child_ref)?;

        let (parent_id, parent_idx) = self.insert_vertex(Arc::new(parent_frame), None);
        self.dag.add_edge(parent_idx, child_idx, ());
        self.roots.insert(parent_id);
        self.roots.remove(&child_ref.id());
        Ok(self.handle(parent_idx))
    }

    /// Create a new vertex for `child_frame` and an edge from `parent` to it.
    ///
    /// The new child is never a root — it has an incoming edge by
    /// construction.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownVertex`] if `parent` is not in this graph.
    pub fn add_child(
        &mut self,
        parent: impl Into<VertexRef>,
        child_frame: Frame,
    ) -> Result<Node> {
        let parent_idx = self.resolve(parent.into())?;

        let (_, child_idx) = self.insert_vertex(Arc::new(child_frame), None);
        self.dag.add_edge(parent_idx, child_idx, ());
        Ok(self.handle(child_idx))
    }

    /// Add a directed edge between two existing vertices.
    ///
    /// Models reconvergent call paths: the child gains a second parent.
    /// If `child` was a root, it leaves the root set.
    ///
    /// # Errors
    ///
    /// - [`GraphError::UnknownVertex`] if either endpoint is missing.
    /// - [`GraphError::DuplicateEdge`] if the ordered pair already has an
    ///   edge.
    /// - [`GraphError::WouldCycle`] if `parent` is reachable from `child`;
    ///   the error carries the concrete cycle path. The graph is unchanged.
    pub fn add_edge(
        &mut self,
        parent: impl Into<VertexRef>,
        child: impl Into<VertexRef>,
    ) -> Result<()> {
        let parent_ref = parent.into();
        let child_ref = child.into();
        let parent_idx = self.resolve(parent_ref)?;
        let child_idx = self.resolve(child_ref)?;

        if self.dag.contains_edge(parent_idx, child_idx) {
            return Err(GraphError::DuplicateEdge {
                from: parent_ref.id(),
                to: child_ref.id(),
            });
        }
        if let Some(cycle) = cycles::would_create_cycle(&self.dag, parent_idx, child_idx) {
            return Err(GraphError::WouldCycle {
                from: parent_ref.id(),
                to: child_ref.id(),
                cycle,
            });
        }

        self.dag.add_edge(parent_idx, child_idx, ());
        self.roots.remove(&child_ref.id());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Neighbor queries
    // -----------------------------------------------------------------------

    /// The parents of `v`, in edge-insertion order.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownVertex`] if `v` is not in this graph.
    pub fn get_parents(&self, v: impl Into<VertexRef>) -> Result<Vec<Node>> {
        let idx = self.resolve(v.into())?;
        Ok(self
            .neighbor_indices(idx, Direction::Incoming)
            .into_iter()
            .map(|i| self.handle(i))
            .collect())
    }

    /// The children of `v`, in edge-insertion order.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownVertex`] if `v` is not in this graph.
    pub fn get_children(&self, v: impl Into<VertexRef>) -> Result<Vec<Node>> {
        let idx = self.resolve(v.into())?;
        Ok(self
            .neighbor_indices(idx, Direction::Outgoing)
            .into_iter()
            .map(|i| self.handle(i))
            .collect())
    }

    /// Number of incoming edges on `v`.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownVertex`] if `v` is not in this graph.
    pub fn in_degree(&self, v: impl Into<VertexRef>) -> Result<usize> {
        let idx = self.resolve(v.into())?;
        Ok(self.dag.neighbors_directed(idx, Direction::Incoming).count())
    }

    /// Number of outgoing edges on `v`.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownVertex`] if `v` is not in this graph.
    pub fn out_degree(&self, v: impl Into<VertexRef>) -> Result<usize> {
        let idx = self.resolve(v.into())?;
        Ok(self.dag.neighbors_directed(idx, Direction::Outgoing).count())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Look up the handle for a vertex.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownVertex`] if `v` is not in this graph.
    pub fn node(&self, v: impl Into<VertexRef>) -> Result<Node> {
        let idx = self.resolve(v.into())?;
        Ok(self.handle(idx))
    }

    /// Returns `true` if `v` resolves to a vertex in this graph.
    pub fn contains(&self, v: impl Into<VertexRef>) -> bool {
        self.index.contains_key(&v.into().id())
    }

    /// Number of vertices.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.dag.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.dag.edge_count()
    }

    /// Number of roots (zero-in-degree vertices).
    #[must_use]
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Returns `true` if the graph has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dag.node_count() == 0
    }

    /// Root handles in ascending id order.
    #[must_use]
    pub fn roots(&self) -> Vec<Node> {
        self.roots
            .iter()
            .filter_map(|id| self.index.get(id).map(|&idx| self.handle(idx)))
            .collect()
    }

    /// All vertex ids in ascending order.
    #[must_use]
    pub fn node_ids(&self) -> Vec<VertexId> {
        let mut ids: Vec<VertexId> = self
            .dag
            .node_indices()
            .map(|idx| self.dag[idx].id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Store a caller-computed depth on `v`.
    ///
    /// Depth is not maintained by the graph; it is whatever the caller
    /// last wrote.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownVertex`] if `v` is not in this graph.
    pub fn set_depth(&mut self, v: impl Into<VertexRef>, depth: u32) -> Result<()> {
        let idx = self.resolve(v.into())?;
        self.dag[idx].depth = Some(depth);
        Ok(())
    }

    /// Read back the caller-computed depth of `v`, if any.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownVertex`] if `v` is not in this graph.
    pub fn depth(&self, v: impl Into<VertexRef>) -> Result<Option<u32>> {
        let idx = self.resolve(v.into())?;
        Ok(self.dag[idx].depth)
    }

    // -----------------------------------------------------------------------
    // Copy
    // -----------------------------------------------------------------------

    /// Produce a structurally identical, fully independent graph.
    ///
    /// Every vertex gets a fresh id (assigned from 0 in ascending
    /// original-id order), every frame is deep-copied, and all edges,
    /// depths, and roots are translated. Returns the old→new id map — a
    /// bijection over this graph's vertex ids.
    #[must_use]
    pub fn copy(&self) -> (Self, BTreeMap<VertexId, VertexId>) {
        let mut old_to_new = BTreeMap::new();
        let copied = self.copy_with_map(&mut old_to_new);
        (copied, old_to_new)
    }

    /// Like [`Graph::copy`], but merges the fresh old→new pairs into a
    /// caller-supplied map so provenance can be tracked across chained
    /// copies.
    #[instrument(skip(self, old_to_new))]
    pub fn copy_with_map(&self, old_to_new: &mut BTreeMap<VertexId, VertexId>) -> Self {
        let mut copied = Self::new();
        let mut new_indices: HashMap<VertexId, NodeIndex> =
            HashMap::with_capacity(self.dag.node_count());

        let ids = self.node_ids();
        for &old_id in &ids {
            let Some(&old_idx) = self.index.get(&old_id) else {
                continue;
            };
            let data = &self.dag[old_idx];
            let (new_id, new_idx) =
                copied.insert_vertex(Arc::new(Frame::clone(&data.frame)), data.depth);
            new_indices.insert(old_id, new_idx);
            old_to_new.insert(old_id, new_id);
        }

        for &old_id in &ids {
            let Some(&old_idx) = self.index.get(&old_id) else {
                continue;
            };
            let Some(&src) = new_indices.get(&old_id) else {
                continue;
            };
            for child_id in self.child_ids(old_idx) {
                if let Some(&tgt) = new_indices.get(&child_id) {
                    copied.dag.add_edge(src, tgt, ());
                }
            }
        }

        copied.roots = self
            .roots
            .iter()
            .filter_map(|id| old_to_new.get(id).copied())
            .collect();
        copied
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Resolve a vertex reference to its storage index.
    pub(crate) fn resolve(&self, v: VertexRef) -> Result<NodeIndex> {
        self.index
            .get(&v.id())
            .copied()
            .ok_or(GraphError::UnknownVertex(v.id()))
    }

    /// Materialize a handle from a storage index.
    pub(crate) fn handle(&self, idx: NodeIndex) -> Node {
        let data = &self.dag[idx];
        Node {
            id: data.id,
            frame: Arc::clone(&data.frame),
            depth: data.depth,
        }
    }

    /// The frame stored for `id`, if the vertex exists.
    pub(crate) fn frame_of(&self, id: VertexId) -> Option<&Frame> {
        self.index.get(&id).map(|&idx| self.dag[idx].frame.as_ref())
    }

    /// Neighbor indices in edge-insertion order.
    ///
    /// petgraph walks adjacency most-recent-first; reversing restores
    /// insertion order.
    pub(crate) fn neighbor_indices(&self, idx: NodeIndex, dir: Direction) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> = self.dag.neighbors_directed(idx, dir).collect();
        neighbors.reverse();
        neighbors
    }

    /// Child ids in edge-insertion order.
    pub(crate) fn child_ids(&self, idx: NodeIndex) -> Vec<VertexId> {
        self.neighbor_indices(idx, Direction::Outgoing)
            .into_iter()
            .map(|i| self.dag[i].id)
            .collect()
    }

    /// Allocate a fresh id and insert a vertex with the given payload.
    fn insert_vertex(&mut self, frame: Arc<Frame>, depth: Option<u32>) -> (VertexId, NodeIndex) {
        let id = VertexId::new(self.next_id);
        self.next_id += 1;
        let idx = self.dag.add_node(VertexData { id, frame, depth });
        self.index.insert(id, idx);
        (id, idx)
    }

    /// Recompute `roots` from scratch as the zero-in-degree vertex set.
    ///
    /// Used after bulk structural changes (merge application); every other
    /// mutation maintains `roots` incrementally.
    pub(crate) fn update_roots(&mut self) {
        self.roots = self
            .dag
            .node_indices()
            .filter(|&idx| {
                self.dag
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|idx| self.dag[idx].id)
            .collect();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
