//! Duplicate-subtree detection and merging.
//!
//! # Overview
//!
//! Profiling samples frequently observe the same call path more than once,
//! producing sibling vertices that carry equal frames. Normalization
//! collapses them: [`Graph::find_merges`] computes a mapping from every
//! duplicate vertex to a single surviving representative, and
//! [`Graph::merge_nodes`] applies it by re-pointing the duplicate's edges
//! and retiring its id. [`Graph::normalize`] runs both and returns the
//! applied map so callers can translate externally held vertex ids.
//!
//! # Algorithm
//!
//! Merging is level-synchronized. The root set is partitioned by frame
//! first; then one pre-order traversal walks the graph, and whenever it
//! reaches a vertex whose merge group was already decided, the union of
//! all group members' children becomes the next candidate pool. Children
//! of merged duplicates are therefore re-partitioned *together*, so
//! identical subtree shapes collapse recursively rather than one level at
//! a time.
//!
//! # Determinism
//!
//! The representative of a duplicate group is the member with the lowest
//! vertex id, and chained mappings are resolved to their fixpoint before
//! the map is returned. Ids strictly decrease along a chain, so resolution
//! terminates and no value of the returned map is also a key.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use petgraph::Direction;
use tracing::{debug, instrument};

use crate::error::{GraphError, Result};
use crate::frame::Frame;
use crate::node::VertexId;

use super::{Graph, TraversalOrder, cycles};

/// Mapping from retired vertex ids to their surviving representatives.
///
/// Produced by [`Graph::find_merges`]; every value is fully resolved (no
/// value is also a key) and identity entries are excluded.
pub type MergeMap = BTreeMap<VertexId, VertexId>;

impl Graph {
    /// Find sibling vertices with equal frames and compute a mapping from
    /// each duplicate to its surviving representative.
    ///
    /// The graph is not modified; apply the result with
    /// [`Graph::merge_nodes`] or use [`Graph::normalize`] for both steps.
    #[must_use]
    #[instrument(skip(self))]
    pub fn find_merges(&self) -> MergeMap {
        // candidate -> current representative (may include identity entries
        // for representatives themselves; filtered before returning).
        let mut merges: BTreeMap<VertexId, VertexId> = BTreeMap::new();
        // representative -> every vertex folded into it, itself included.
        let mut inverted: BTreeMap<VertexId, BTreeSet<VertexId>> = BTreeMap::new();
        let mut processed: HashSet<VertexId> = HashSet::new();

        let root_ids: Vec<VertexId> = self.roots.iter().copied().collect();
        group_merge(self, &root_ids, &mut merges, &mut inverted);

        let visit_order: Vec<VertexId> =
            self.traverse(TraversalOrder::Pre).map(|n| n.id).collect();
        for id in visit_order {
            if processed.contains(&id) {
                continue;
            }
            // If this vertex belongs to a merge group, pool the children of
            // every member so equivalent children of merged vertices also
            // get merged. Otherwise its own children are the candidates.
            let target = merges.get(&id).copied().unwrap_or(id);
            let candidates: Vec<VertexId> = match inverted.get(&target) {
                Some(group) => {
                    let members: Vec<VertexId> = group.iter().copied().collect();
                    let mut pooled = Vec::new();
                    for member in members {
                        if let Ok(idx) = self.resolve(member.into()) {
                            pooled.extend(self.child_ids(idx));
                        }
                        processed.insert(member);
                    }
                    pooled
                }
                None => {
                    processed.insert(id);
                    self.resolve(id.into())
                        .map(|idx| self.child_ids(idx))
                        .unwrap_or_default()
                }
            };
            group_merge(self, &candidates, &mut merges, &mut inverted);
        }

        let resolved: MergeMap = merges
            .iter()
            .map(|(&old, &target)| (old, resolve_target(&merges, target)))
            .filter(|&(old, target)| old != target)
            .collect();
        debug!(
            groups = inverted.len(),
            retired = resolved.len(),
            "merge detection complete"
        );
        resolved
    }

    /// Fold each `(old, new)` pair of `merges` into one vertex.
    ///
    /// Every parent and child edge of `old` is re-pointed at `new`;
    /// duplicate resulting edges and would-be self-loops are skipped, and
    /// each re-pointed edge is re-checked against cycle creation. `old` is
    /// then retired: removed from storage, the id index, and the root set.
    /// After all fusions the root set is recomputed from scratch.
    ///
    /// # Errors
    ///
    /// - [`GraphError::UnknownVertex`] if a pair references a vertex not in
    ///   this graph.
    /// - [`GraphError::WouldCycle`] if a re-pointed edge would close a
    ///   cycle. Maps produced by [`Graph::find_merges`] fold siblings and
    ///   cannot trigger this; the check guards hand-built maps.
    #[instrument(skip(self, merges))]
    pub fn merge_nodes(&mut self, merges: &MergeMap) -> Result<()> {
        for (&old, &target) in merges {
            let new = resolve_target(merges, target);
            if old == new {
                continue;
            }
            let old_idx = self.resolve(old.into())?;
            let new_idx = self.resolve(new.into())?;

            for parent_idx in self.neighbor_indices(old_idx, Direction::Incoming) {
                if parent_idx == new_idx || self.dag.contains_edge(parent_idx, new_idx) {
                    continue;
                }
                if let Some(cycle) = cycles::would_create_cycle(&self.dag, parent_idx, new_idx) {
                    return Err(GraphError::WouldCycle {
                        from: self.dag[parent_idx].id,
                        to: new,
                        cycle,
                    });
                }
                self.dag.add_edge(parent_idx, new_idx, ());
            }

            for child_idx in self.neighbor_indices(old_idx, Direction::Outgoing) {
                if child_idx == new_idx || self.dag.contains_edge(new_idx, child_idx) {
                    continue;
                }
                if let Some(cycle) = cycles::would_create_cycle(&self.dag, new_idx, child_idx) {
                    return Err(GraphError::WouldCycle {
                        from: new,
                        to: self.dag[child_idx].id,
                        cycle,
                    });
                }
                self.dag.add_edge(new_idx, child_idx, ());
            }

            self.dag.remove_node(old_idx);
            self.index.remove(&old);
            self.roots.remove(&old);
        }

        self.update_roots();
        Ok(())
    }

    /// Detect and apply all duplicate-sibling merges.
    ///
    /// Returns the applied [`MergeMap`] so externally held vertex ids can
    /// be translated. Idempotent: a second call returns an empty map.
    ///
    /// # Errors
    ///
    /// Propagates [`Graph::merge_nodes`] failures.
    #[instrument(skip(self))]
    pub fn normalize(&mut self) -> Result<MergeMap> {
        let merges = self.find_merges();
        self.merge_nodes(&merges)?;
        Ok(merges)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Partition `candidates` by frame and record a lowest-id representative
/// for every partition with at least two members.
///
/// A vertex pooled through two merged parents may appear twice in
/// `candidates`; duplicates are dropped so a vertex is never grouped with
/// itself.
fn group_merge(
    graph: &Graph,
    candidates: &[VertexId],
    merges: &mut BTreeMap<VertexId, VertexId>,
    inverted: &mut BTreeMap<VertexId, BTreeSet<VertexId>>,
) {
    let mut seen = HashSet::new();
    let unique: Vec<VertexId> = candidates
        .iter()
        .copied()
        .filter(|&v| seen.insert(v))
        .collect();

    let mut by_frame: BTreeMap<&Frame, Vec<VertexId>> = BTreeMap::new();
    for &v in &unique {
        if let Some(frame) = graph.frame_of(v) {
            by_frame.entry(frame).or_default().push(v);
        }
    }

    for (_, mut group) in by_frame {
        if group.len() < 2 {
            continue;
        }
        group.sort_unstable();
        let min_id = group[0];
        for &member in &group {
            // Lower any pre-existing mapping so merges stay transitively
            // consistent across levels.
            let prev = merges.get(&member).copied().unwrap_or(min_id);
            let new_min = min_id.min(prev);
            merges.insert(member, new_min);
            inverted.entry(new_min).or_default().insert(member);
        }
    }
}

/// Follow a mapping chain to its fixpoint.
///
/// Representatives always have lower ids than the vertices folded into
/// them, so chains strictly descend; the hop guard only protects against
/// malformed hand-built maps.
fn resolve_target(merges: &BTreeMap<VertexId, VertexId>, start: VertexId) -> VertexId {
    let mut target = start;
    let mut hops = 0;
    while let Some(&next) = merges.get(&target) {
        if next == target || hops >= merges.len() {
            break;
        }
        target = next;
        hops += 1;
    }
    target
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
