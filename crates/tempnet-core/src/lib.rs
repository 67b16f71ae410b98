// Allow minor clippy style warnings at crate level
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::derive_partial_eq_without_eq)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::module_name_repetitions)]

//! Higher-order analysis of temporal networks.
//!
//! A temporal network is a sequence of time-stamped directed edges
//! `(source, target, t)`. Aggregating it into a static graph throws away the
//! order in which edges occur, and with it the causal structure: in
//! `(a, b, 1), (b, c, 2)` a walker can travel from `a` to `c`, in
//! `(b, c, 1), (a, b, 2)` it cannot.
//!
//! This crate recovers that structure:
//!
//! - [`EdgeStore`] - time-indexed storage of time-stamped edges
//! - [`extract_two_paths`] / [`extract_k_paths`] - time-respecting paths
//!   within a causal window `delta`, with apportioned weights
//! - [`AggregateGraph`] - first-, second- and k-th order aggregate networks
//! - [`second_order_null`] - a second-order null model that keeps
//!   first-order statistics and forgets order correlations
//! - [`shuffle_edges`] / [`shuffle_two_paths`] - randomized networks for
//!   null-hypothesis testing
//! - [`TemporalNetwork`] - all of the above behind a cache that is
//!   invalidated on every mutation
//!
//! # Time-Respecting Paths
//!
//! ```text
//! (a, b, 1)  (b, c, 2)  (b, d, 2)         delta = 1
//!
//!     a -> b -> c   weight 1/2
//!     a -> b -> d   weight 1/2
//! ```
//!
//! A path `s -> v -> d` exists when an edge into `v` is followed by an edge
//! out of `v` at most `delta` time units later. When several edges arrive at
//! and leave `v` at the same pair of timestamps, the unit of evidence is split
//! evenly among all combinations so no interaction is counted twice.
//!
//! # Example
//!
//! ```
//! use tempnet_core::TemporalNetwork;
//!
//! let mut tn = TemporalNetwork::from_edges([("a", "b", 1), ("b", "c", 2), ("b", "d", 2)]);
//! let g2 = tn.second_order_graph();
//! assert_eq!(g2.edge_weight("a,b", "b,c").unwrap(), Some(0.5));
//! ```

pub mod aggregate;
pub mod edge;
pub mod error;
pub mod kpath;
pub mod network;
pub mod null_model;
pub mod shuffle;
pub mod store;
pub mod twopath;

pub use aggregate::{
    first_order, first_order_from_edges, k_order, second_order, AggregateGraph, HigherOrderNode,
};
pub use edge::{NodeId, TimeStampedEdge, Timestamp};
pub use error::{Error, Result};
pub use kpath::{extract_k_paths, KPath};
pub use network::{FirstOrderMode, NetworkConfig, NetworkSummary, TemporalNetwork};
pub use null_model::{second_order_null, stationary_distribution, NullModel, StationaryConfig};
pub use shuffle::{shuffle_edges, shuffle_two_paths};
pub use store::EdgeStore;
pub use twopath::{extract_two_paths, NestedIndex, TwoPath, TwoPathIndex};

pub use ndarray;
pub use petgraph;
