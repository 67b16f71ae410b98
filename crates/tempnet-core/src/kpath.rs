//! Time-respecting paths of arbitrary length.
//!
//! # Windowing
//!
//! Time is consumed in blocks. A block starts at the earliest timestamp not
//! yet covered and spans `delta` time units; the next block starts at the
//! first timestamp at or after `start + delta`. Within a block starting at
//! `t`:
//!
//! - depth 0 seeds one candidate `[src, dst]` per non-self-loop edge with a
//!   timestamp in `[t, t + delta - 1]`;
//! - depth `k` (for `1 <= k < order`) extends every candidate ending at a
//!   node `v` by every non-self-loop edge leaving `v` with a timestamp in
//!   `[t + k, t + k + delta - 1]`.
//!
//! Paths started strictly inside an already consumed block are not revisited.
//! This under-counts relative to a sliding origin and is kept as the
//! extraction policy.
//!
//! A path that reaches `order` edges at the final depth gets weight
//! `1 / (fan_out * siblings)`, where `fan_out` is the number of edges leaving
//! the extended node in that depth's window and `siblings` is the number of
//! length-`order` prefixes ending at that node. Duplicate node sequences of
//! one block are summed.

use crate::edge::{NodeId, Timestamp};
use crate::error::{require_positive, Result};
use crate::store::EdgeStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// A weighted time-respecting path of `order` edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KPath {
    /// Visited nodes, `order + 1` of them.
    pub nodes: Vec<NodeId>,
    /// Apportioned weight.
    pub weight: f64,
}

impl KPath {
    /// Create a new k-path.
    pub fn new<I, N>(nodes: I, weight: f64) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<NodeId>,
    {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
            weight,
        }
    }

    /// Number of edges on the path.
    pub fn order(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }
}

/// Node sequences with their weight contributions, in first-seen order.
#[derive(Default)]
struct PathAccumulator {
    paths: Vec<(Vec<u32>, Vec<f64>)>,
    position: HashMap<Vec<u32>, usize>,
}

impl PathAccumulator {
    fn add(&mut self, nodes: Vec<u32>, weight: f64) {
        if let Some(&pos) = self.position.get(&nodes) {
            self.paths[pos].1.push(weight);
            return;
        }
        self.position.insert(nodes.clone(), self.paths.len());
        self.paths.push((nodes, vec![weight]));
    }

    /// Summed paths. Contributions are added in sorted order.
    fn into_paths(self) -> impl Iterator<Item = (Vec<u32>, f64)> {
        self.paths.into_iter().map(|(nodes, mut contributions)| {
            contributions.sort_by(f64::total_cmp);
            (nodes, contributions.iter().sum())
        })
    }
}

/// Extract all time-respecting paths with `order` edges.
///
/// Returns `InvalidParameter` when `order` or `delta` is zero.
pub fn extract_k_paths(store: &EdgeStore, order: usize, delta: u64) -> Result<Vec<KPath>> {
    require_positive("order", order as u64)?;
    require_positive("delta", delta)?;
    let delta = Timestamp::try_from(delta).unwrap_or(Timestamp::MAX);

    let mut kpaths = Vec::new();
    let mut next_block: Option<Timestamp> = None;
    let mut blocks = 0usize;

    for &t in store.ordered_times() {
        if next_block.is_some_and(|next| t < next) {
            continue;
        }
        next_block = Some(t.saturating_add(delta));
        blocks += 1;

        let block = extract_block(store, t, order, delta);
        kpaths.extend(block.into_paths().map(|(nodes, weight)| KPath {
            nodes: nodes.into_iter().map(|n| store.node(n).clone()).collect(),
            weight,
        }));
    }

    debug!(k_paths = kpaths.len(), order, delta, blocks, "extracted k-paths");
    Ok(kpaths)
}

fn extract_block(store: &EdgeStore, t: Timestamp, order: usize, delta: Timestamp) -> PathAccumulator {
    let mut block = PathAccumulator::default();
    // Candidate paths of every length, keyed by their endpoint.
    let mut ending_at: BTreeMap<u32, Vec<Vec<u32>>> = BTreeMap::new();
    let mut candidates: BTreeSet<u32> = BTreeSet::new();

    for &tw in store.times_in_window(t, t.saturating_add(delta - 1)) {
        for &i in store.edge_ids_at(tw) {
            let e = store.edge(i);
            if e.is_self_loop() {
                continue;
            }
            if order == 1 {
                block.add(vec![e.src, e.dst], 1.0);
                continue;
            }
            ending_at.entry(e.dst).or_default().push(vec![e.src, e.dst]);
            candidates.insert(e.dst);
        }
    }

    for depth in 1..order {
        if candidates.is_empty() {
            break;
        }
        let start = t.saturating_add(depth as Timestamp);
        let window = store.times_in_window(start, start.saturating_add(delta - 1));
        let last_depth = depth + 1 == order;

        // Paths grown at this depth only become extendable at the next one.
        let mut grown: BTreeMap<u32, Vec<Vec<u32>>> = BTreeMap::new();
        let mut next_candidates = BTreeSet::new();

        for &node in &candidates {
            let new_edges: Vec<usize> = window
                .iter()
                .filter_map(|&tw| store.sources_at(tw)?.get(&node))
                .flatten()
                .copied()
                .filter(|&i| !store.edge(i).is_self_loop())
                .collect();
            if new_edges.is_empty() {
                continue;
            }
            let Some(prefixes) = ending_at.get(&node) else {
                continue;
            };
            let siblings = prefixes.iter().filter(|p| p.len() == order).count();

            for &i in &new_edges {
                let dst = store.edge(i).dst;
                for path in prefixes {
                    let mut new_path = path.clone();
                    new_path.push(dst);
                    if last_depth && new_path.len() == order + 1 {
                        let w = 1.0 / (new_edges.len() * siblings) as f64;
                        block.add(new_path.clone(), w);
                    }
                    grown.entry(dst).or_default().push(new_path);
                    next_candidates.insert(dst);
                }
            }
        }

        for (node, paths) in grown {
            ending_at.entry(node).or_default().extend(paths);
        }
        candidates = next_candidates;
    }

    block
}
