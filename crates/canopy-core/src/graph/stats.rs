//! Basic graph statistics for call-tree DAGs.
//!
//! Diagnostic summary only — metric aggregation over profiling data is a
//! consumer concern, not part of the engine.

use petgraph::Direction;

use super::Graph;

// ---------------------------------------------------------------------------
// GraphStats
// ---------------------------------------------------------------------------

/// Summary statistics for a call-tree graph.
///
/// Computed by [`GraphStats::from_graph`]; useful for logging and for
/// sanity checks after ingestion or normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphStats {
    /// Number of vertices.
    pub node_count: usize,
    /// Number of caller→callee edges.
    pub edge_count: usize,
    /// Number of roots (zero-in-degree vertices).
    pub root_count: usize,
    /// Graph density: `edge_count / (node_count * (node_count - 1))`.
    /// Ranges from 0.0 (no edges) to 1.0 (all possible edges present).
    /// Zero for graphs with 0 or 1 vertex.
    pub density: f64,
    /// Maximum in-degree (most reconvergent call paths into one vertex).
    pub max_in_degree: usize,
    /// Maximum out-degree (widest fan-out from one vertex).
    pub max_out_degree: usize,
    /// Whether the DAG degenerates to a simple tree.
    pub is_tree: bool,
}

impl GraphStats {
    /// Compute statistics from a [`Graph`].
    #[must_use]
    pub fn from_graph(graph: &Graph) -> Self {
        let node_count = graph.node_count();
        let edge_count = graph.edge_count();

        let max_in_degree = graph
            .dag
            .node_indices()
            .map(|idx| {
                graph
                    .dag
                    .neighbors_directed(idx, Direction::Incoming)
                    .count()
            })
            .max()
            .unwrap_or(0);

        let max_out_degree = graph
            .dag
            .node_indices()
            .map(|idx| {
                graph
                    .dag
                    .neighbors_directed(idx, Direction::Outgoing)
                    .count()
            })
            .max()
            .unwrap_or(0);

        Self {
            node_count,
            edge_count,
            root_count: graph.root_count(),
            density: compute_density(node_count, edge_count),
            max_in_degree,
            max_out_degree,
            is_tree: graph.is_tree(),
        }
    }
}

/// Density for a simple directed graph; 0.0 when fewer than two vertices.
#[allow(clippy::cast_precision_loss)]
fn compute_density(node_count: usize, edge_count: usize) -> f64 {
    if node_count < 2 {
        return 0.0;
    }
    edge_count as f64 / (node_count as f64 * (node_count as f64 - 1.0))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    #[test]
    fn empty_graph_stats() {
        let stats = GraphStats::from_graph(&Graph::new());
        assert_eq!(stats.node_count, 0);
        assert_eq!(stats.edge_count, 0);
        assert_eq!(stats.root_count, 0);
        assert!((stats.density - 0.0).abs() < f64::EPSILON);
        assert!(!stats.is_tree);
    }

    #[test]
    fn chain_stats() {
        let mut graph = Graph::new();
        let main = graph.add_node(Frame::name("main"));
        let solve = graph.add_child(&main, Frame::name("solve")).expect("add");
        graph.add_child(&solve, Frame::name("io")).expect("add");

        let stats = GraphStats::from_graph(&graph);
        assert_eq!(stats.node_count, 3);
        assert_eq!(stats.edge_count, 2);
        assert_eq!(stats.root_count, 1);
        assert_eq!(stats.max_in_degree, 1);
        assert_eq!(stats.max_out_degree, 1);
        assert!((stats.density - 2.0 / 6.0).abs() < f64::EPSILON);
        assert!(stats.is_tree);
    }

    #[test]
    fn reconvergence_shows_in_degrees_and_tree_flag() {
        let mut graph = Graph::new();
        let main = graph.add_node(Frame::name("main"));
        let a = graph.add_child(&main, Frame::name("a")).expect("add");
        let b = graph.add_child(&main, Frame::name("b")).expect("add");
        let leaf = graph.add_child(&a, Frame::name("leaf")).expect("add");
        graph.add_edge(&b, &leaf).expect("add edge");

        let stats = GraphStats::from_graph(&graph);
        assert_eq!(stats.max_in_degree, 2);
        assert_eq!(stats.max_out_degree, 2);
        assert!(!stats.is_tree);
    }
}
