//! The temporal network: an edge store plus lazily derived, cached views.
//!
//! Every derived artifact (two-paths, k-paths, aggregate networks, the null
//! model) is computed on first access and kept until the edge set or the
//! causal window changes. Mutators invalidate the whole cache before they
//! return, so no accessor ever observes a view computed under a superseded
//! edge set or delta.
//!
//! A `TemporalNetwork` is not meant to be shared between threads while being
//! mutated; callers serialize access.

use crate::aggregate::{first_order, first_order_from_edges, k_order, second_order, AggregateGraph};
use crate::edge::{NodeId, Timestamp};
use crate::error::{require_positive, Result};
use crate::kpath::{extract_k_paths, KPath};
use crate::null_model::{second_order_null, NullModel, StationaryConfig};
use crate::shuffle;
use crate::store::EdgeStore;
use crate::twopath::{extract_two_paths, TwoPath, TwoPathIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::trace;

/// How the first-order network is weighted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FirstOrderMode {
    /// Sum two-path weights onto both of their edges.
    #[default]
    TwoPaths,
    /// Count every raw time-stamped edge once.
    RawEdges,
}

/// Configuration of a [`TemporalNetwork`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Causal window `delta`: the largest lag between consecutive edges of a path.
    pub max_time_diff: u64,
    /// Separator joining node names into higher-order vertex names.
    pub separator: String,
    /// Keep two-paths that return to their source node.
    pub allow_self_returns: bool,
    /// Weighting of the first-order network.
    pub first_order_mode: FirstOrderMode,
    /// Stationary-distribution solver settings.
    pub stationary: StationaryConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_time_diff: 1,
            separator: ",".to_string(),
            allow_self_returns: true,
            first_order_mode: FirstOrderMode::TwoPaths,
            stationary: StationaryConfig::default(),
        }
    }
}

impl NetworkConfig {
    /// Set the causal window.
    pub fn with_max_time_diff(mut self, delta: u64) -> Self {
        self.max_time_diff = delta;
        self
    }

    /// Set the vertex-name separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Keep or drop two-paths with `source == dest`.
    pub fn with_self_returns(mut self, allow: bool) -> Self {
        self.allow_self_returns = allow;
        self
    }

    /// Set the first-order weighting.
    pub fn with_first_order_mode(mut self, mode: FirstOrderMode) -> Self {
        self.first_order_mode = mode;
        self
    }

    /// Set the stationary solver configuration.
    pub fn with_stationary(mut self, stationary: StationaryConfig) -> Self {
        self.stationary = stationary;
        self
    }

    fn validate(&self) -> Result<()> {
        require_positive("delta", self.max_time_diff)
    }
}

/// Derived views, all invalidated together.
#[derive(Debug, Clone, Default)]
struct DerivedCache {
    two_paths: Option<TwoPathIndex>,
    first_order: Option<AggregateGraph>,
    second_order: Option<AggregateGraph>,
    null_model: Option<NullModel>,
    k_paths: HashMap<(usize, u64), Vec<KPath>>,
    k_order: HashMap<(usize, u64), AggregateGraph>,
}

impl DerivedCache {
    fn invalidate_all(&mut self) {
        trace!("invalidating derived network views");
        *self = Self::default();
    }
}

/// Summary statistics of a temporal network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkSummary {
    /// Number of nodes.
    pub vertices: usize,
    /// Number of time-stamped edges.
    pub edges: usize,
    /// Current causal window.
    pub max_time_diff: u64,
    /// Number of two-paths, if already extracted.
    pub two_paths: Option<usize>,
    /// Earliest and latest timestamps.
    pub time_range: Option<(Timestamp, Timestamp)>,
}

/// A sequence of time-stamped edges with cached higher-order views.
///
/// # Example
///
/// ```
/// use tempnet_core::TemporalNetwork;
///
/// let mut tn = TemporalNetwork::from_edges([("A", "B", 1), ("B", "C", 2), ("A", "B", 3), ("B", "D", 4)]);
/// assert_eq!(tn.two_path_count(), 2);
/// assert_eq!(tn.first_order_graph().edge_weight("A", "B").unwrap(), Some(2.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemporalNetwork {
    store: EdgeStore,
    config: NetworkConfig,
    /// Two-paths given at construction; used instead of extraction until the first edge is added.
    seeded: Option<TwoPathIndex>,
    cache: DerivedCache,
}

impl TemporalNetwork {
    /// Create an empty network with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty network. Fails when `max_time_diff` is zero.
    pub fn with_config(config: NetworkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Build a network from `(source, target, time)` triples.
    pub fn from_edges<I, S, T>(edges: I) -> Self
    where
        I: IntoIterator<Item = (S, T, Timestamp)>,
        S: Into<NodeId>,
        T: Into<NodeId>,
    {
        Self::from_store(EdgeStore::from_edges(edges), NetworkConfig::default())
    }

    /// Build a network from triples with an explicit configuration.
    pub fn from_edges_with_config<I, S, T>(edges: I, config: NetworkConfig) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T, Timestamp)>,
        S: Into<NodeId>,
        T: Into<NodeId>,
    {
        config.validate()?;
        Ok(Self::from_store(EdgeStore::from_edges(edges), config))
    }

    /// Build a network from pre-computed two-paths.
    ///
    /// The network has no edges; its nodes are those of the two-paths, and the
    /// two-paths are indexed under artificial timestamps `0..n`. Adding an edge
    /// discards them and returns to extraction from edges.
    pub fn from_two_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = TwoPath>,
    {
        let index = TwoPathIndex::from_paths(paths);
        let mut store = EdgeStore::new();
        for tp in index.paths() {
            store.intern(tp.source.clone());
            store.intern(tp.mid.clone());
            store.intern(tp.dest.clone());
        }
        Self {
            store,
            seeded: Some(index),
            ..Self::default()
        }
    }

    fn from_store(store: EdgeStore, config: NetworkConfig) -> Self {
        Self {
            store,
            config,
            seeded: None,
            cache: DerivedCache::default(),
        }
    }

    /// Append a time-stamped edge and invalidate every derived view.
    pub fn add_edge(&mut self, source: impl Into<NodeId>, target: impl Into<NodeId>, time: Timestamp) {
        self.store.add_edge(source, target, time);
        self.seeded = None;
        self.cache.invalidate_all();
    }

    /// Change the causal window. Derived views are invalidated only if it changes.
    pub fn set_max_time_diff(&mut self, delta: u64) -> Result<()> {
        require_positive("delta", delta)?;
        if delta != self.config.max_time_diff {
            self.config.max_time_diff = delta;
            self.cache.invalidate_all();
        }
        Ok(())
    }

    /// Current causal window.
    pub fn max_time_diff(&self) -> u64 {
        self.config.max_time_diff
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// The underlying edge store.
    pub fn store(&self) -> &EdgeStore {
        &self.store
    }

    pub fn vertex_count(&self) -> usize {
        self.store.vertex_count()
    }

    pub fn edge_count(&self) -> usize {
        self.store.edge_count()
    }

    /// Gaps between consecutive distinct timestamps.
    pub fn inter_event_times(&self) -> Vec<Timestamp> {
        self.store.inter_event_times()
    }

    /// Extracted (or seeded) two-paths with their indices.
    pub fn two_paths(&mut self) -> &TwoPathIndex {
        two_path_index(&self.seeded, &mut self.cache.two_paths, &self.store, &self.config)
    }

    /// Number of two-paths. Triggers extraction on first use.
    pub fn two_path_count(&mut self) -> usize {
        self.two_paths().len()
    }

    /// First-order aggregate network.
    pub fn first_order_graph(&mut self) -> &AggregateGraph {
        let graph = match self.cache.first_order.take() {
            Some(graph) => graph,
            None => match self.config.first_order_mode {
                FirstOrderMode::TwoPaths => {
                    let tps = two_path_index(&self.seeded, &mut self.cache.two_paths, &self.store, &self.config);
                    first_order(self.store.nodes(), tps.paths())
                }
                FirstOrderMode::RawEdges => first_order_from_edges(&self.store),
            },
        };
        self.cache.first_order.insert(graph)
    }

    /// Second-order aggregate network.
    pub fn second_order_graph(&mut self) -> &AggregateGraph {
        let graph = match self.cache.second_order.take() {
            Some(graph) => graph,
            None => {
                let tps = two_path_index(&self.seeded, &mut self.cache.two_paths, &self.store, &self.config);
                second_order(tps.paths(), &self.config.separator)
            }
        };
        self.cache.second_order.insert(graph)
    }

    /// Second-order null model with its stationary distribution.
    ///
    /// Failures are not cached; a later call retries.
    pub fn null_model(&mut self) -> Result<&NullModel> {
        let model = match self.cache.null_model.take() {
            Some(model) => model,
            None => {
                let stationary = self.config.stationary;
                second_order_null(self.second_order_graph(), &stationary)?
            }
        };
        Ok(&*self.cache.null_model.insert(model))
    }

    /// Second-order null network.
    pub fn second_order_null_graph(&mut self) -> Result<&AggregateGraph> {
        Ok(&self.null_model()?.graph)
    }

    /// Stationary probabilities of the second-order giant component, by vertex name.
    pub fn stationary_distribution(&mut self) -> Result<Vec<(&str, f64)>> {
        let model = self.null_model()?;
        Ok(model
            .graph
            .vertex_names()
            .into_iter()
            .zip(model.stationary.iter().copied())
            .collect())
    }

    /// Time-respecting paths with `order` edges under window `delta`.
    pub fn k_paths(&mut self, order: usize, delta: u64) -> Result<&[KPath]> {
        let paths = match self.cache.k_paths.entry((order, delta)) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(extract_k_paths(&self.store, order, delta)?),
        };
        Ok(paths.as_slice())
    }

    /// Number of k-paths with `order` edges under window `delta`.
    pub fn k_path_count(&mut self, order: usize, delta: u64) -> Result<usize> {
        Ok(self.k_paths(order, delta)?.len())
    }

    /// Order-k aggregate network built from k-paths.
    ///
    /// Fails with `InvalidParameter` when `order` or `delta` is zero.
    pub fn k_order_graph(&mut self, order: usize, delta: u64) -> Result<&AggregateGraph> {
        let key = (order, delta);
        let graph = match self.cache.k_order.remove(&key) {
            Some(graph) => graph,
            None => {
                let separator = self.config.separator.clone();
                k_order(self.k_paths(order, delta)?, order, &separator)
            }
        };
        Ok(&*self.cache.k_order.entry(key).or_insert(graph))
    }

    /// Network of `length` edges resampled uniformly from this one.
    ///
    /// `length` defaults to the largest even number not above the edge count;
    /// `Some(0)` also selects it.
    pub fn shuffle_edges<R: Rng + ?Sized>(&self, length: Option<usize>, rng: &mut R) -> TemporalNetwork {
        let store = shuffle::shuffle_edges(&self.store, length, rng);
        Self::from_store(store, self.config.clone())
    }

    /// Network of `length` edges built from resampled two-paths.
    ///
    /// `length` defaults to the edge count; `Some(0)` also selects it.
    pub fn shuffle_two_paths<R: Rng + ?Sized>(&mut self, length: Option<usize>, rng: &mut R) -> TemporalNetwork {
        let default_length = self.store.edge_count();
        let tps = two_path_index(&self.seeded, &mut self.cache.two_paths, &self.store, &self.config);
        let store = shuffle::shuffle_two_paths(tps, length, default_length, rng);
        Self::from_store(store, self.config.clone())
    }

    /// Summary statistics. Does not trigger extraction.
    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            vertices: self.vertex_count(),
            edges: self.edge_count(),
            max_time_diff: self.config.max_time_diff,
            two_paths: self
                .seeded
                .as_ref()
                .or(self.cache.two_paths.as_ref())
                .map(TwoPathIndex::len),
            time_range: self.store.time_range(),
        }
    }
}

fn two_path_index<'a>(
    seeded: &'a Option<TwoPathIndex>,
    cached: &'a mut Option<TwoPathIndex>,
    store: &EdgeStore,
    config: &NetworkConfig,
) -> &'a TwoPathIndex {
    match seeded {
        Some(index) => index,
        None => cached.get_or_insert_with(|| {
            extract_two_paths(store, config.max_time_diff, config.allow_self_returns)
        }),
    }
}
