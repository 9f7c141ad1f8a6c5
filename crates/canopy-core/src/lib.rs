#![forbid(unsafe_code)]
//! canopy-core: call-tree graph engine.
//!
//! Builds and normalizes the directed acyclic graphs behind call-tree
//! profiling analysis: multi-root DAG storage with incremental root
//! tracking, ordered depth-first traversal with visit counting, and a
//! normalization pass that collapses structurally duplicate subtrees.
//!
//! # Conventions
//!
//! - **Errors**: typed [`GraphError`] results, propagated with `?`.
//! - **Logging**: `tracing` macros (`debug!`, `trace!`).

pub mod error;
pub mod frame;
pub mod graph;
pub mod node;

pub use error::{GraphError, Result};
pub use frame::{AttrValue, Frame};
pub use graph::{Graph, GraphStats, MergeMap, Traversal, TraversalOrder};
pub use node::{Node, VertexId, VertexRef};
