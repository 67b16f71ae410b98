//! Node identifiers and time-stamped edges.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type (integer ticks, seconds since epoch, or arbitrary units).
pub type Timestamp = i64;

/// Opaque identifier for a node in a temporal network.
///
/// Integers and strings both convert into a `NodeId`; integer ids are stored
/// by their decimal representation so `1u32` and `"1"` name the same node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new node ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&String> for NodeId {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

impl From<char> for NodeId {
    fn from(c: char) -> Self {
        Self(c.to_string())
    }
}

macro_rules! node_id_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for NodeId {
                fn from(v: $t) -> Self {
                    Self(v.to_string())
                }
            }
        )*
    };
}

node_id_from_int!(u8, u16, u32, u64, usize, i32, i64);

/// A directed edge observed at a single point in time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeStampedEdge {
    /// Source node.
    pub source: NodeId,
    /// Target node.
    pub target: NodeId,
    /// Time when the interaction occurred.
    pub time: Timestamp,
}

impl TimeStampedEdge {
    /// Create a new time-stamped edge.
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, time: Timestamp) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            time,
        }
    }

    /// Whether source and target coincide.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

impl<S: Into<NodeId>, T: Into<NodeId>> From<(S, T, Timestamp)> for TimeStampedEdge {
    fn from((source, target, time): (S, T, Timestamp)) -> Self {
        Self::new(source, target, time)
    }
}

/// Edge with interned endpoints, as held by the [`EdgeStore`](crate::EdgeStore).
///
/// Endpoints index into the store's node list, which keeps insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct IndexedEdge {
    pub src: u32,
    pub dst: u32,
    pub time: Timestamp,
}

impl IndexedEdge {
    pub fn new(src: u32, dst: u32, time: Timestamp) -> Self {
        Self { src, dst, time }
    }

    pub fn is_self_loop(&self) -> bool {
        self.src == self.dst
    }
}
