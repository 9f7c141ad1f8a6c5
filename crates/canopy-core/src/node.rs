//! Vertex identity and handles.
//!
//! # Overview
//!
//! Every vertex in a [`crate::graph::Graph`] is addressed by a [`VertexId`]:
//! a unique integer assigned monotonically by the owning graph and never
//! reused. Ids are stable for the vertex's lifetime; a merge retires the
//! duplicate's id and a copy remaps ids through an explicit old→new map.
//!
//! A [`Node`] is a plain value handle — id, a shared reference to the
//! frame, and the depth observed when the handle was produced. Handles
//! compare, order, and hash by id alone, so the total order over ids is the
//! tie-break order used wherever the engine needs determinism.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::frame::Frame;

// ---------------------------------------------------------------------------
// VertexId
// ---------------------------------------------------------------------------

/// Graph-assigned vertex identity.
///
/// Unique within its graph, monotonically assigned, never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VertexId(u64);

impl VertexId {
    /// Wrap a raw id value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for VertexId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A value handle for one vertex: identity plus frame reference.
///
/// The frame is shared with graph storage via `Arc` — handles are cheap to
/// clone and never alias mutable graph state. `depth` is whatever the
/// caller last stored via [`crate::graph::Graph::set_depth`] at the time
/// the handle was produced; the graph does not maintain it.
#[derive(Debug, Clone)]
pub struct Node {
    /// Graph-assigned identity.
    pub id: VertexId,
    /// The call-site identity this vertex carries.
    pub frame: Arc<Frame>,
    /// Caller-computed depth, if any.
    pub depth: Option<u32>,
}

impl Node {
    /// The frame carried by this vertex.
    #[must_use]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.frame)
    }
}

// ---------------------------------------------------------------------------
// VertexRef
// ---------------------------------------------------------------------------

/// A vertex argument: either a raw id or a [`Node`] handle.
///
/// Graph operations accept `impl Into<VertexRef>`, so callers pass ids,
/// handles, or handle references interchangeably. Resolution against a
/// specific graph happens inside the operation and fails with
/// [`crate::error::GraphError::UnknownVertex`] when the id is not present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexRef(VertexId);

impl VertexRef {
    /// The referenced id.
    #[must_use]
    pub const fn id(self) -> VertexId {
        self.0
    }
}

impl From<VertexId> for VertexRef {
    fn from(id: VertexId) -> Self {
        Self(id)
    }
}

impl From<u64> for VertexRef {
    fn from(id: u64) -> Self {
        Self(VertexId::new(id))
    }
}

impl From<Node> for VertexRef {
    fn from(node: Node) -> Self {
        Self(node.id)
    }
}

impl From<&Node> for VertexRef {
    fn from(node: &Node) -> Self {
        Self(node.id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
