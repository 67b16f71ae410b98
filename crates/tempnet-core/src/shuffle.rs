//! Statistics-preserving randomizations of a temporal network.
//!
//! Both shuffles draw from a caller-supplied random source and build a fresh
//! [`EdgeStore`] stamped with synthetic timestamps starting at 0:
//!
//! - [`shuffle_edges`] keeps the frequency of every `(source, target)` pair
//!   and destroys all temporal order;
//! - [`shuffle_two_paths`] keeps the two-path statistics and destroys
//!   correlations beyond them.

use crate::edge::Timestamp;
use crate::store::EdgeStore;
use crate::twopath::TwoPathIndex;
use rand::Rng;
use tracing::debug;

/// Resample edges uniformly with replacement and re-stamp them `0..length`.
///
/// `length` defaults to the largest even number not above the edge count;
/// `Some(0)` selects the default as well. An empty store yields an empty store.
pub fn shuffle_edges<R: Rng + ?Sized>(store: &EdgeStore, length: Option<usize>, rng: &mut R) -> EdgeStore {
    let edges = store.indexed_edges();
    if edges.is_empty() {
        return EdgeStore::new();
    }
    let length = length.filter(|&l| l > 0).unwrap_or(2 * (edges.len() / 2));

    let mut shuffled = EdgeStore::with_capacity(length, store.vertex_count());
    for i in 0..length {
        let e = edges[rng.gen_range(0..edges.len())];
        shuffled.add_edge(store.node(e.src).clone(), store.node(e.dst).clone(), i as Timestamp);
    }

    debug!(edges = length, "shuffled edges");
    shuffled
}

/// Resample two-paths and emit each as two consecutive edges.
///
/// `length` counts emitted edges and defaults to `default_length`, the edge
/// count of the source network (also for `Some(0)`); `length / 2` two-paths
/// are drawn. Each draw picks a timestamp carrying two-paths, then a mid node
/// active at it, then one of that node's two-paths, all uniformly. Draw `i`
/// is stamped `(2i, 2i + 1)`.
pub fn shuffle_two_paths<R: Rng + ?Sized>(
    index: &TwoPathIndex,
    length: Option<usize>,
    default_length: usize,
    rng: &mut R,
) -> EdgeStore {
    let by_time = index.by_time();
    if by_time.is_empty() {
        return EdgeStore::new();
    }
    let draws = length.filter(|&l| l > 0).unwrap_or(default_length) / 2;
    let times: Vec<_> = by_time.values().collect();

    let mut shuffled = EdgeStore::with_capacity(2 * draws, 0);
    for i in 0..draws {
        let at_time = times[rng.gen_range(0..times.len())];
        let Some(positions) = at_time.values().nth(rng.gen_range(0..at_time.len())) else {
            continue;
        };
        let tp = &index.paths()[positions[rng.gen_range(0..positions.len())]];

        let t = 2 * i as Timestamp;
        shuffled.add_edge(tp.source.clone(), tp.mid.clone(), t);
        shuffled.add_edge(tp.mid.clone(), tp.dest.clone(), t + 1);
    }

    debug!(two_paths = draws, edges = 2 * draws, "shuffled two-paths");
    shuffled
}
