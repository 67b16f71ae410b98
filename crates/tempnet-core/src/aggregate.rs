//! Time-aggregated networks of order 1, 2 and k.
//!
//! An order-k aggregate network has one vertex per observed sequence of `k`
//! nodes and one edge per pair of overlapping sequences, weighted by the
//! summed weight of the time-respecting paths that realise it. It is the
//! k-th order Markov approximation of the temporal process.
//!
//! Every builder accumulates parallel contributions into a single edge, and
//! sums each edge's contributions in sorted order so the resulting weights do
//! not depend on the order in which paths were produced.

use crate::edge::NodeId;
use crate::kpath::KPath;
use crate::store::EdgeStore;
use crate::twopath::TwoPath;
use crate::{Error, Result};
use ndarray::Array2;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A vertex of an aggregate network: a sequence of `order` nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HigherOrderNode {
    /// The node sequence (a single node for order 1).
    pub nodes: Vec<NodeId>,
    /// Display name: the nodes joined by the network's separator.
    pub name: String,
}

impl HigherOrderNode {
    fn new(nodes: Vec<NodeId>, separator: &str) -> Self {
        let name = nodes
            .iter()
            .map(NodeId::as_str)
            .collect::<Vec<_>>()
            .join(separator);
        Self { nodes, name }
    }

    /// First node of the sequence.
    pub fn first(&self) -> Option<&NodeId> {
        self.nodes.first()
    }

    /// Last node of the sequence.
    pub fn last(&self) -> Option<&NodeId> {
        self.nodes.last()
    }
}

/// A weighted directed aggregate network.
///
/// Uses petgraph's directed graph internally. Vertex order is the order in
/// which vertices were first encountered; for order 1 built from a temporal
/// network this is the network's node order.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateGraph {
    order: usize,
    graph: DiGraph<HigherOrderNode, f64>,
    #[serde(skip)]
    index: HashMap<String, NodeIndex>,
}

impl AggregateGraph {
    fn from_graph(order: usize, graph: DiGraph<HigherOrderNode, f64>) -> Self {
        let index = graph
            .node_indices()
            .map(|idx| (graph[idx].name.clone(), idx))
            .collect();
        Self {
            order,
            graph,
            index,
        }
    }

    /// Length of the node sequences represented by each vertex.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of (deduplicated) edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Iterate over vertices in index order.
    pub fn vertices(&self) -> impl Iterator<Item = &HigherOrderNode> {
        self.graph.node_weights()
    }

    /// Vertex names in index order.
    pub fn vertex_names(&self) -> Vec<&str> {
        self.graph.node_weights().map(|v| v.name.as_str()).collect()
    }

    /// Iterate over edges as `(from, to, weight)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.graph.edge_references().map(move |e| {
            (
                self.graph[e.source()].name.as_str(),
                self.graph[e.target()].name.as_str(),
                *e.weight(),
            )
        })
    }

    /// Index of a vertex by name.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.node_index(name).map(NodeIndex::index)
    }

    fn node_index(&self, name: &str) -> Result<NodeIndex> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownVertex(name.to_string()))
    }

    /// Look up a vertex by name.
    pub fn vertex(&self, name: &str) -> Result<&HigherOrderNode> {
        Ok(&self.graph[self.node_index(name)?])
    }

    /// Weight of the edge `from -> to`, `None` if both vertices exist but are not linked.
    pub fn edge_weight(&self, from: &str, to: &str) -> Result<Option<f64>> {
        let a = self.node_index(from)?;
        let b = self.node_index(to)?;
        Ok(self.graph.find_edge(a, b).map(|e| self.graph[e]))
    }

    /// Sum of outgoing edge weights of a vertex.
    pub fn out_strength(&self, name: &str) -> Result<f64> {
        let idx = self.node_index(name)?;
        Ok(self.strength(idx, Direction::Outgoing))
    }

    /// Sum of incoming edge weights of a vertex.
    pub fn in_strength(&self, name: &str) -> Result<f64> {
        let idx = self.node_index(name)?;
        Ok(self.strength(idx, Direction::Incoming))
    }

    fn strength(&self, idx: NodeIndex, dir: Direction) -> f64 {
        self.graph.edges_directed(idx, dir).map(|e| *e.weight()).sum()
    }

    /// Sum of all edge weights.
    pub fn total_weight(&self) -> f64 {
        self.graph.edge_weights().sum()
    }

    /// The underlying petgraph for advanced operations.
    pub fn as_petgraph(&self) -> &DiGraph<HigherOrderNode, f64> {
        &self.graph
    }

    /// The largest strongly connected component as its own graph.
    ///
    /// Ties between equally large components go to the one containing the
    /// lowest vertex index. Vertex order is preserved.
    pub fn giant_component(&self) -> AggregateGraph {
        let giant = tarjan_scc(&self.graph)
            .into_iter()
            .max_by(|a, b| {
                a.len().cmp(&b.len()).then_with(|| {
                    let min_a = a.iter().map(|i| i.index()).min();
                    let min_b = b.iter().map(|i| i.index()).min();
                    // Lower minimum index wins the tie.
                    min_b.cmp(&min_a)
                })
            })
            .unwrap_or_default();
        let keep: HashSet<NodeIndex> = giant.into_iter().collect();

        let sub = self.graph.filter_map(
            |idx, v| keep.contains(&idx).then(|| v.clone()),
            |_, &w| Some(w),
        );
        AggregateGraph::from_graph(self.order, sub)
    }

    /// Row-stochastic random-walk transition matrix.
    ///
    /// `T[i, j] = weight(i -> j) / out_strength(i)`, indexed by vertex index.
    /// Rows of vertices without outgoing weight are all zero.
    pub fn transition_matrix(&self) -> Array2<f64> {
        let n = self.graph.node_count();
        let mut t = Array2::<f64>::zeros((n, n));
        for (i, row) in self.transition_lists().into_iter().enumerate() {
            for (j, p) in row {
                t[[i, j]] += p;
            }
        }
        t
    }

    /// Sparse form of [`transition_matrix`](Self::transition_matrix): per
    /// vertex, the `(target index, probability)` pairs of its outgoing edges.
    pub fn transition_lists(&self) -> Vec<Vec<(usize, f64)>> {
        self.graph
            .node_indices()
            .map(|idx| {
                let out = self.strength(idx, Direction::Outgoing);
                if out <= 0.0 {
                    return Vec::new();
                }
                self.graph
                    .edges_directed(idx, Direction::Outgoing)
                    .map(|e| (e.target().index(), *e.weight() / out))
                    .collect()
            })
            .collect()
    }
}

/// Collects vertices and per-edge weight contributions before building the graph.
///
/// Vertices are keyed by name, so node sequences that join to the same name
/// (node ids containing the separator) share one vertex, the first one seen.
pub(crate) struct GraphAccumulator<'a> {
    order: usize,
    separator: &'a str,
    vertices: Vec<HigherOrderNode>,
    vertex_pos: HashMap<String, usize>,
    edges: Vec<(usize, usize, Vec<f64>)>,
    edge_pos: HashMap<(usize, usize), usize>,
}

impl<'a> GraphAccumulator<'a> {
    pub(crate) fn new(order: usize, separator: &'a str) -> Self {
        Self {
            order,
            separator,
            vertices: Vec::new(),
            vertex_pos: HashMap::new(),
            edges: Vec::new(),
            edge_pos: HashMap::new(),
        }
    }

    /// Get or insert the vertex for a node sequence.
    pub(crate) fn vertex(&mut self, nodes: &[NodeId]) -> usize {
        self.insert_vertex(HigherOrderNode::new(nodes.to_vec(), self.separator))
    }

    /// Insert an already named vertex, keeping an existing one with the same name.
    pub(crate) fn insert_vertex(&mut self, vertex: HigherOrderNode) -> usize {
        if let Some(&pos) = self.vertex_pos.get(&vertex.name) {
            return pos;
        }
        let pos = self.vertices.len();
        self.vertex_pos.insert(vertex.name.clone(), pos);
        self.vertices.push(vertex);
        pos
    }

    /// Add a weight contribution to the edge `a -> b`.
    pub(crate) fn add(&mut self, a: usize, b: usize, weight: f64) {
        match self.edge_pos.get(&(a, b)) {
            Some(&pos) => self.edges[pos].2.push(weight),
            None => {
                self.edge_pos.insert((a, b), self.edges.len());
                self.edges.push((a, b, vec![weight]));
            }
        }
    }

    pub(crate) fn finish(self) -> AggregateGraph {
        let mut graph = DiGraph::with_capacity(self.vertices.len(), self.edges.len());
        let ids: Vec<NodeIndex> = self
            .vertices
            .into_iter()
            .map(|v| graph.add_node(v))
            .collect();
        for (a, b, mut contributions) in self.edges {
            contributions.sort_by(f64::total_cmp);
            let weight: f64 = contributions.iter().sum();
            graph.add_edge(ids[a], ids[b], weight);
        }
        debug!(
            order = self.order,
            vertices = graph.node_count(),
            edges = graph.edge_count(),
            "built aggregate network"
        );
        AggregateGraph::from_graph(self.order, graph)
    }
}

/// First-order network from two-paths.
///
/// Every node becomes a vertex; each two-path `(s, v, d, w)` adds `w` to both
/// `s -> v` and `v -> d`.
pub fn first_order(nodes: &[NodeId], two_paths: &[TwoPath]) -> AggregateGraph {
    let mut acc = GraphAccumulator::new(1, "");
    for node in nodes {
        acc.vertex(std::slice::from_ref(node));
    }
    for tp in two_paths {
        let s = acc.vertex(std::slice::from_ref(&tp.source));
        let v = acc.vertex(std::slice::from_ref(&tp.mid));
        let d = acc.vertex(std::slice::from_ref(&tp.dest));
        acc.add(s, v, tp.weight);
        acc.add(v, d, tp.weight);
    }
    acc.finish()
}

/// First-order network straight from the raw edges, one unit per edge.
pub fn first_order_from_edges(store: &EdgeStore) -> AggregateGraph {
    let mut acc = GraphAccumulator::new(1, "");
    let ids: Vec<usize> = store
        .nodes()
        .iter()
        .map(|n| acc.vertex(std::slice::from_ref(n)))
        .collect();
    for e in store.indexed_edges() {
        acc.add(ids[e.src as usize], ids[e.dst as usize], 1.0);
    }
    acc.finish()
}

/// Second-order network from two-paths.
///
/// Vertices are node pairs `(x, y)`; each two-path `(s, v, d, w)` adds `w` to
/// the edge `(s, v) -> (v, d)`.
pub fn second_order(two_paths: &[TwoPath], separator: &str) -> AggregateGraph {
    let mut acc = GraphAccumulator::new(2, separator);
    for tp in two_paths {
        let a = acc.vertex(&[tp.source.clone(), tp.mid.clone()]);
        let b = acc.vertex(&[tp.mid.clone(), tp.dest.clone()]);
        acc.add(a, b, tp.weight);
    }
    acc.finish()
}

/// Order-k network from k-paths with `order` edges.
///
/// A path `(n0, .., nk)` adds its weight to the edge from the vertex
/// `(n0, .., n(k-1))` to the vertex `(n1, .., nk)`. Paths of another length
/// are ignored.
pub fn k_order(kpaths: &[KPath], order: usize, separator: &str) -> AggregateGraph {
    let mut acc = GraphAccumulator::new(order, separator);
    for path in kpaths.iter().filter(|p| p.nodes.len() == order + 1) {
        let a = acc.vertex(&path.nodes[..order]);
        let b = acc.vertex(&path.nodes[1..]);
        acc.add(a, b, path.weight);
    }
    acc.finish()
}
