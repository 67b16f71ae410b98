//! Time-respecting paths of length two.
//!
//! A two-path `(s, v, d)` is inferred whenever an edge `(s, v, t)` is followed
//! by an edge `(v, d, t')` with `t < t' <= t + delta`. All incoming edges of
//! `v` at `t` are paired with all outgoing edges of `v` at `t'`, and every pair
//! receives weight `1 / (indeg * outdeg)`, so each join block `(v, t, t')`
//! carries exactly unit mass.
//!
//! # Example
//!
//! ```text
//! (a, b, 1)  (b, c, 2)      delta = 1
//!      a -> b -> c          weight 1.0
//! ```

use crate::edge::{NodeId, Timestamp};
use crate::store::{EdgeList, EdgeStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A weighted time-respecting path `source -> mid -> dest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoPath {
    /// First node.
    pub source: NodeId,
    /// Node the path passes through.
    pub mid: NodeId,
    /// Last node.
    pub dest: NodeId,
    /// Apportioned weight.
    pub weight: f64,
}

impl TwoPath {
    /// Create a new two-path.
    pub fn new(
        source: impl Into<NodeId>,
        mid: impl Into<NodeId>,
        dest: impl Into<NodeId>,
        weight: f64,
    ) -> Self {
        Self {
            source: source.into(),
            mid: mid.into(),
            dest: dest.into(),
            weight,
        }
    }

    /// Whether the path returns to where it started.
    pub fn is_self_return(&self) -> bool {
        self.source == self.dest
    }
}

impl<S, M, D> From<(S, M, D, f64)> for TwoPath
where
    S: Into<NodeId>,
    M: Into<NodeId>,
    D: Into<NodeId>,
{
    fn from((source, mid, dest, weight): (S, M, D, f64)) -> Self {
        Self::new(source, mid, dest, weight)
    }
}

/// Two-paths grouped first by one key, then by a second one.
pub type NestedIndex<A, B> = BTreeMap<A, BTreeMap<B, Vec<usize>>>;

/// Extracted two-paths together with their lookup indices.
///
/// Both indices key on the originating timestamp `t` of the incoming edge and
/// hold positions into [`TwoPathIndex::paths`].
#[derive(Debug, Clone, Default)]
pub struct TwoPathIndex {
    paths: Vec<TwoPath>,
    by_node: NestedIndex<NodeId, Timestamp>,
    by_time: NestedIndex<Timestamp, NodeId>,
}

impl TwoPathIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index pre-computed two-paths under artificial timestamps `0..n`.
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = TwoPath>,
    {
        let mut index = Self::new();
        for (t, tp) in paths.into_iter().enumerate() {
            index.push(tp, t as Timestamp);
        }
        index
    }

    pub(crate) fn push(&mut self, tp: TwoPath, time: Timestamp) {
        let pos = self.paths.len();
        self.by_node
            .entry(tp.mid.clone())
            .or_default()
            .entry(time)
            .or_default()
            .push(pos);
        self.by_time
            .entry(time)
            .or_default()
            .entry(tp.mid.clone())
            .or_default()
            .push(pos);
        self.paths.push(tp);
    }

    /// Number of two-paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no two-path was found.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// All two-paths in extraction order.
    pub fn paths(&self) -> &[TwoPath] {
        &self.paths
    }

    /// Index: mid node -> timestamp -> path positions.
    pub fn by_node(&self) -> &NestedIndex<NodeId, Timestamp> {
        &self.by_node
    }

    /// Index: timestamp -> mid node -> path positions.
    pub fn by_time(&self) -> &NestedIndex<Timestamp, NodeId> {
        &self.by_time
    }

    /// Two-paths passing through `mid`, in extraction order.
    pub fn through(&self, mid: &NodeId) -> Vec<&TwoPath> {
        self.by_node
            .get(mid)
            .map(|times| {
                times
                    .values()
                    .flatten()
                    .map(|&i| &self.paths[i])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Sum of all two-path weights.
    pub fn total_weight(&self) -> f64 {
        self.paths.iter().map(|tp| tp.weight).sum()
    }
}

/// Extract all two-paths of `store` with causal window `delta`.
///
/// Self-loop edges never take part in a join. Two-paths with
/// `source == dest` are kept unless `allow_self_returns` is false; dropping
/// them does not renormalise the remaining weights of their join block.
pub fn extract_two_paths(store: &EdgeStore, delta: u64, allow_self_returns: bool) -> TwoPathIndex {
    let mut index = TwoPathIndex::new();
    let delta = Timestamp::try_from(delta).unwrap_or(Timestamp::MAX);
    let times = store.ordered_times();

    for (pos, &t) in times.iter().enumerate() {
        let Some(targets) = store.targets_at(t) else {
            continue;
        };

        // Later timestamps inside (t, t + delta].
        let horizon = t.saturating_add(delta);
        let rest = &times[pos + 1..];
        let later = &rest[..rest.partition_point(|&x| x <= horizon)];
        if later.is_empty() {
            continue;
        }

        for (&v, in_ids) in targets {
            let incoming = non_loop_edges(store, in_ids);
            if incoming.is_empty() {
                continue;
            }

            for &t_out in later {
                let Some(out_ids) = store.sources_at(t_out).and_then(|m| m.get(&v)) else {
                    continue;
                };
                let outgoing = non_loop_edges(store, out_ids);
                if outgoing.is_empty() {
                    continue;
                }

                let weight = 1.0 / (incoming.len() * outgoing.len()) as f64;
                for &e_out in &outgoing {
                    let d = store.edge(e_out).dst;
                    for &e_in in &incoming {
                        let s = store.edge(e_in).src;
                        if !allow_self_returns && s == d {
                            continue;
                        }
                        let tp = TwoPath {
                            source: store.node(s).clone(),
                            mid: store.node(v).clone(),
                            dest: store.node(d).clone(),
                            weight,
                        };
                        index.push(tp, t);
                    }
                }
            }
        }
    }

    debug!(
        two_paths = index.len(),
        delta,
        edges = store.edge_count(),
        "extracted two-paths"
    );
    index
}

fn non_loop_edges(store: &EdgeStore, ids: &EdgeList) -> EdgeList {
    ids.iter()
        .copied()
        .filter(|&i| !store.edge(i).is_self_loop())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> EdgeStore {
        EdgeStore::from_edges([("A", "B", 1), ("B", "C", 2), ("A", "B", 3), ("B", "D", 4)])
    }

    #[test]
    fn test_scenario_delta_one() {
        let tps = extract_two_paths(&scenario(), 1, true);

        assert_eq!(tps.len(), 2);
        assert_eq!(tps.paths()[0], TwoPath::new("A", "B", "C", 1.0));
        assert_eq!(tps.paths()[1], TwoPath::new("A", "B", "D", 1.0));
    }

    #[test]
    fn test_scenario_delta_two() {
        // t=1: B is a target; B departs at t=2 only (A departs at t=3).
        // t=2: C never departs. t=3: B departs at t=4. t=4: D never departs.
        let tps = extract_two_paths(&scenario(), 2, true);
        assert_eq!(tps.len(), 2);
        assert!((tps.total_weight() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_wider_window_joins_non_consecutive_times() {
        let store = EdgeStore::from_edges([("a", "b", 1), ("x", "y", 2), ("b", "c", 3)]);

        assert!(extract_two_paths(&store, 1, true).is_empty());
        let tps = extract_two_paths(&store, 2, true);
        assert_eq!(tps.paths(), &[TwoPath::new("a", "b", "c", 1.0)]);
    }

    #[test]
    fn test_apportionment_fan() {
        // Two arrivals at b, three departures one step later.
        let store = EdgeStore::from_edges([
            ("a1", "b", 1),
            ("a2", "b", 1),
            ("b", "c1", 2),
            ("b", "c2", 2),
            ("b", "c3", 2),
        ]);
        let tps = extract_two_paths(&store, 1, true);

        assert_eq!(tps.len(), 6);
        for tp in tps.paths() {
            assert!((tp.weight - 1.0 / 6.0).abs() < 1e-12);
        }
        // Unit mass per join block.
        assert!((tps.total_weight() - 1.0).abs() < 1e-12);
        // Each arrival carries 1 / indeg of the block.
        let from_a1: f64 = tps
            .paths()
            .iter()
            .filter(|tp| tp.source.as_str() == "a1")
            .map(|tp| tp.weight)
            .sum();
        assert!((from_a1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_self_loops_excluded() {
        let store = EdgeStore::from_edges([("a", "b", 1), ("b", "b", 2), ("b", "c", 2)]);
        let tps = extract_two_paths(&store, 1, true);
        assert_eq!(tps.paths(), &[TwoPath::new("a", "b", "c", 1.0)]);
    }

    #[test]
    fn test_self_returns_configurable() {
        let store = EdgeStore::from_edges([("a", "b", 1), ("b", "a", 2)]);

        let kept = extract_two_paths(&store, 1, true);
        assert_eq!(kept.len(), 1);
        assert!(kept.paths()[0].is_self_return());

        let dropped = extract_two_paths(&store, 1, false);
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_indices() {
        let tps = extract_two_paths(&scenario(), 1, true);
        let b = NodeId::from("B");

        let by_b = &tps.by_node()[&b];
        assert_eq!(by_b.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(tps.by_time().keys().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(tps.through(&b).len(), 2);
        assert!(tps.through(&NodeId::from("C")).is_empty());
    }

    #[test]
    fn test_empty_store() {
        let tps = extract_two_paths(&EdgeStore::new(), 1, true);
        assert!(tps.is_empty());
        assert!(tps.by_time().is_empty());
    }

    #[test]
    fn test_from_paths_uses_artificial_times() {
        let tps = TwoPathIndex::from_paths([
            TwoPath::new("a", "b", "c", 0.5),
            TwoPath::new("x", "b", "y", 2.0),
        ]);
        assert_eq!(tps.len(), 2);
        assert_eq!(tps.by_time().keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(tps.by_node()[&NodeId::from("b")].len(), 2);
    }
}
