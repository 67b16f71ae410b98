//! Time-indexed storage of time-stamped edges.

use crate::edge::{IndexedEdge, NodeId, TimeStampedEdge, Timestamp};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};

/// Edge indices grouped under one key.
pub(crate) type EdgeList = SmallVec<[usize; 4]>;

/// Per-timestamp map from node to the edges it terminates (or originates).
pub(crate) type NodeEdges = BTreeMap<u32, EdgeList>;

/// Storage for a sequence of time-stamped edges.
///
/// Maintains the indices the path extractors join over:
/// - `by_time`: timestamp -> edges at that timestamp (insertion order)
/// - `targets_at`: timestamp -> node -> edges ending at the node
/// - `sources_at`: timestamp -> node -> edges starting at the node
/// - `ordered_times`: sorted distinct timestamps, for binary-searched windows
///
/// Nodes are interned in first-seen order, so vertex indices are
/// deterministic for a given insertion sequence. All indices are updated in
/// [`EdgeStore::add_edge`]; there is no deferred rebuild.
#[derive(Debug, Clone, Default)]
pub struct EdgeStore {
    /// All edges in insertion order.
    edges: Vec<IndexedEdge>,
    /// Interned nodes, first-seen order.
    nodes: Vec<NodeId>,
    /// Map from node ID to its interned index.
    node_index: HashMap<NodeId, u32>,
    by_time: HashMap<Timestamp, EdgeList>,
    targets_at: HashMap<Timestamp, NodeEdges>,
    sources_at: HashMap<Timestamp, NodeEdges>,
    /// Sorted distinct timestamps.
    ordered_times: Vec<Timestamp>,
}

impl EdgeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with estimated capacity.
    pub fn with_capacity(edges: usize, nodes: usize) -> Self {
        Self {
            edges: Vec::with_capacity(edges),
            nodes: Vec::with_capacity(nodes),
            node_index: HashMap::with_capacity(nodes),
            ..Self::default()
        }
    }

    /// Build a store from a sequence of edges.
    pub fn from_edges<I, S, T>(edges: I) -> Self
    where
        I: IntoIterator<Item = (S, T, Timestamp)>,
        S: Into<NodeId>,
        T: Into<NodeId>,
    {
        let mut store = Self::new();
        for (source, target, time) in edges {
            store.add_edge(source, target, time);
        }
        store
    }

    /// Add a time-stamped edge, updating the node set and every index.
    pub fn add_edge(&mut self, source: impl Into<NodeId>, target: impl Into<NodeId>, time: Timestamp) {
        let src = self.intern(source.into());
        let dst = self.intern(target.into());
        let idx = self.edges.len();
        self.edges.push(IndexedEdge::new(src, dst, time));

        self.by_time.entry(time).or_default().push(idx);
        self.targets_at
            .entry(time)
            .or_default()
            .entry(dst)
            .or_default()
            .push(idx);
        self.sources_at
            .entry(time)
            .or_default()
            .entry(src)
            .or_default()
            .push(idx);

        if let Err(pos) = self.ordered_times.binary_search(&time) {
            self.ordered_times.insert(pos, time);
        }
    }

    /// Register a node without adding an edge. Returns its interned index.
    pub(crate) fn intern(&mut self, id: NodeId) -> u32 {
        if let Some(&idx) = self.node_index.get(&id) {
            return idx;
        }
        let idx = self.nodes.len() as u32;
        self.node_index.insert(id.clone(), idx);
        self.nodes.push(id);
        idx
    }

    /// Number of distinct nodes.
    pub fn vertex_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of time-stamped edges (self-loops included).
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the store holds no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// All nodes in first-seen order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Interned index of a node, if present.
    pub fn node_index(&self, id: &NodeId) -> Option<u32> {
        self.node_index.get(id).copied()
    }

    pub(crate) fn node(&self, idx: u32) -> &NodeId {
        &self.nodes[idx as usize]
    }

    pub(crate) fn edge(&self, idx: usize) -> &IndexedEdge {
        &self.edges[idx]
    }

    pub(crate) fn indexed_edges(&self) -> &[IndexedEdge] {
        &self.edges
    }

    /// Iterator over all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = TimeStampedEdge> + '_ {
        self.edges.iter().map(|e| self.resolve(e))
    }

    fn resolve(&self, e: &IndexedEdge) -> TimeStampedEdge {
        TimeStampedEdge {
            source: self.node(e.src).clone(),
            target: self.node(e.dst).clone(),
            time: e.time,
        }
    }

    /// Edges occurring exactly at `time`, in insertion order.
    pub fn edges_at(&self, time: Timestamp) -> Vec<TimeStampedEdge> {
        self.by_time
            .get(&time)
            .map(|ids| ids.iter().map(|&i| self.resolve(&self.edges[i])).collect())
            .unwrap_or_default()
    }

    pub(crate) fn edge_ids_at(&self, time: Timestamp) -> &[usize] {
        self.by_time.get(&time).map(|ids| ids.as_slice()).unwrap_or(&[])
    }

    /// Sorted distinct timestamps.
    pub fn ordered_times(&self) -> &[Timestamp] {
        &self.ordered_times
    }

    /// Distinct timestamps within `[start, end]`, located by binary search.
    pub fn times_in_window(&self, start: Timestamp, end: Timestamp) -> &[Timestamp] {
        let lo = self.ordered_times.partition_point(|&t| t < start);
        let hi = self.ordered_times.partition_point(|&t| t <= end);
        if lo >= hi {
            return &[];
        }
        &self.ordered_times[lo..hi]
    }

    /// Earliest and latest timestamps, or `None` for an empty store.
    pub fn time_range(&self) -> Option<(Timestamp, Timestamp)> {
        Some((*self.ordered_times.first()?, *self.ordered_times.last()?))
    }

    /// Gaps between consecutive distinct timestamps.
    pub fn inter_event_times(&self) -> Vec<Timestamp> {
        self.ordered_times.windows(2).map(|w| w[1] - w[0]).collect()
    }

    pub(crate) fn targets_at(&self, time: Timestamp) -> Option<&NodeEdges> {
        self.targets_at.get(&time)
    }

    pub(crate) fn sources_at(&self, time: Timestamp) -> Option<&NodeEdges> {
        self.sources_at.get(&time)
    }

    /// Number of edges ending at `node` at exactly `time`.
    pub fn in_degree_at(&self, node: &NodeId, time: Timestamp) -> usize {
        self.degree_at(&self.targets_at, node, time)
    }

    /// Number of edges starting at `node` at exactly `time`.
    pub fn out_degree_at(&self, node: &NodeId, time: Timestamp) -> usize {
        self.degree_at(&self.sources_at, node, time)
    }

    fn degree_at(
        &self,
        index: &HashMap<Timestamp, NodeEdges>,
        node: &NodeId,
        time: Timestamp,
    ) -> usize {
        let Some(idx) = self.node_index(node) else {
            return 0;
        };
        index
            .get(&time)
            .and_then(|m| m.get(&idx))
            .map_or(0, |v| v.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EdgeStore {
        EdgeStore::from_edges([("a", "b", 1), ("b", "c", 2), ("a", "b", 3), ("b", "d", 4)])
    }

    #[test]
    fn test_store_basic() {
        let store = sample();

        assert_eq!(store.edge_count(), 4);
        assert_eq!(store.vertex_count(), 4);
        assert_eq!(store.time_range(), Some((1, 4)));
        let names: Vec<&str> = store.nodes().iter().map(NodeId::as_str).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_out_of_order_insertion_keeps_times_sorted() {
        let mut store = EdgeStore::new();
        store.add_edge("a", "b", 10);
        store.add_edge("b", "c", 3);
        store.add_edge("c", "d", 7);
        store.add_edge("d", "a", 3);

        assert_eq!(store.ordered_times(), &[3, 7, 10]);
        assert_eq!(store.edges_at(3).len(), 2);
        assert_eq!(store.inter_event_times(), vec![4, 3]);
    }

    #[test]
    fn test_indices_in_sync() {
        let mut store = sample();
        store.add_edge("x", "b", 3);

        let b = NodeId::from("b");
        assert_eq!(store.in_degree_at(&b, 3), 2);
        assert_eq!(store.out_degree_at(&b, 4), 1);
        assert_eq!(store.out_degree_at(&b, 3), 0);
        assert_eq!(store.in_degree_at(&NodeId::from("zzz"), 3), 0);

        for (i, e) in store.indexed_edges().iter().enumerate() {
            assert!(store.edge_ids_at(e.time).contains(&i));
            assert!(store.targets_at(e.time).unwrap()[&e.dst].contains(&i));
            assert!(store.sources_at(e.time).unwrap()[&e.src].contains(&i));
            assert!(store.ordered_times().binary_search(&e.time).is_ok());
        }
    }

    #[test]
    fn test_times_in_window() {
        let store = sample();
        assert_eq!(store.times_in_window(2, 3), &[2, 3]);
        assert_eq!(store.times_in_window(5, 9), &[] as &[Timestamp]);
        assert_eq!(store.times_in_window(3, 1), &[] as &[Timestamp]);
    }

    #[test]
    fn test_empty_store() {
        let store = EdgeStore::new();
        assert!(store.is_empty());
        assert_eq!(store.time_range(), None);
        assert!(store.inter_event_times().is_empty());
    }

    #[test]
    fn test_self_loops_are_stored() {
        let store = EdgeStore::from_edges([("a", "a", 1)]);
        assert_eq!(store.edge_count(), 1);
        assert_eq!(store.vertex_count(), 1);
    }
}
