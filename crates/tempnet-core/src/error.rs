//! Error types for tempnet-core.

use thiserror::Error;

/// Error type for temporal network operations.
///
/// Path extraction and graph construction never fail on empty input; they
/// return empty results instead. Errors are reserved for invalid parameters,
/// degenerate null models, unknown vertex names and solver failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A parameter is outside its valid range (e.g. `delta == 0`, `order == 0`).
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: u64,
        reason: &'static str,
    },

    /// The giant strongly connected component is too small for a stationary distribution.
    #[error("degenerate model: giant strongly connected component has {vertices} vertices (need at least 2)")]
    DegenerateModel { vertices: usize },

    /// A vertex name was not found in the graph being queried.
    #[error("unknown vertex: {0}")]
    UnknownVertex(String),

    /// The stationary-distribution solver did not converge.
    #[error("stationary distribution did not converge after {iterations} iterations (residual {residual:e})")]
    NumericalConvergence { iterations: usize, residual: f64 },
}

/// Result type for temporal network operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reject zero for a parameter that must be at least 1.
pub(crate) fn require_positive(name: &'static str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(Error::InvalidParameter {
            name,
            value,
            reason: "must be >= 1",
        });
    }
    Ok(())
}
