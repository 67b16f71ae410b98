//! `tempnet`: higher-order aggregate networks from time-stamped interactions.
//!
//! This is the facade crate. Everything lives in [`tempnet_core`]; the
//! [`prelude`] gathers the types most programs need.
//!
//! ```
//! use tempnet::prelude::*;
//!
//! let mut tn = TemporalNetwork::from_edges([("A", "B", 1), ("B", "C", 2), ("A", "B", 3), ("B", "D", 4)]);
//! assert_eq!(tn.two_path_count(), 2);
//! assert_eq!(tn.second_order_graph().vertex_count(), 3);
//! ```

pub use tempnet_core::*;

/// Commonly used types.
pub mod prelude {
    pub use tempnet_core::{
        AggregateGraph, EdgeStore, Error, FirstOrderMode, KPath, NetworkConfig, NodeId, Result,
        StationaryConfig, TemporalNetwork, TimeStampedEdge, Timestamp, TwoPath,
    };
}
