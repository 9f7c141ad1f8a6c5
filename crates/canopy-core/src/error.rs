//! Error types for the call-tree graph engine.
//!
//! All errors are programmer-error-class failures surfaced synchronously to
//! the caller. Mutation primitives check their preconditions before the
//! commit point, so a returned error never leaves the graph partially
//! modified.

use crate::node::VertexId;

/// Errors from graph construction, traversal, and normalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A vertex reference did not resolve to a vertex in this graph.
    #[error("unknown vertex {0} (not in this graph)")]
    UnknownVertex(VertexId),

    /// Inserting the edge would make the graph cyclic.
    ///
    /// `cycle` is the concrete path the insertion would close, starting and
    /// ending at `from`.
    #[error("edge {from} -> {to} would close a cycle")]
    WouldCycle {
        /// Source vertex of the rejected edge.
        from: VertexId,
        /// Target vertex of the rejected edge.
        to: VertexId,
        /// The cycle path `from -> to -> ... -> from`.
        cycle: Vec<VertexId>,
    },

    /// The ordered (parent, child) pair already has an edge.
    #[error("duplicate edge {from} -> {to}")]
    DuplicateEdge {
        /// Source vertex of the rejected edge.
        from: VertexId,
        /// Target vertex of the rejected edge.
        to: VertexId,
    },

    /// A traversal order string was neither `"pre"` nor `"post"`.
    #[error("unknown traversal order '{0}' (expected \"pre\" or \"post\")")]
    UnknownTraversalOrder(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GraphError>;
