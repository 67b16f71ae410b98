//! Second-order null model.
//!
//! # Intuition
//!
//! The second-order network records which two-step transitions
//! `(x, y) -> (y, z)` actually occur. The null model keeps the same state
//! space but forgets the observed transition preferences: a walker in state
//! `(x, y)` moves to any possible successor `(y, z)` with a likelihood given
//! only by how much stationary mass `(y, z)` carries. Differences between the
//! empirical second-order network and this null model are the order
//! correlations of the temporal process.
//!
//! # Algorithm
//!
//! 1. Reduce the second-order network to its giant strongly connected
//!    component `G` (at least two vertices).
//! 2. Build the row-stochastic transition matrix `T` of `G`.
//! 3. Compute the stationary distribution `pi` (the leading left eigenvector
//!    of `T`). Up to [`StationaryConfig::direct_limit`] vertices this solves
//!    `pi (I - T) = 0` with `sum(pi) = 1` by dense LU decomposition, which is
//!    exact on slowly mixing graphs such as long rings. Larger graphs, or
//!    systems the direct solve cannot handle, use power iteration over the
//!    sparse transitions of the lazy chain `(I + T) / 2`, which shares its
//!    stationary vector with `T` and is aperiodic.
//! 4. Link every `(x, y)` to every `(y, z)` of `G` with weight `pi[(y, z)]`.

use crate::aggregate::{AggregateGraph, GraphAccumulator};
use crate::edge::NodeId;
use crate::{Error, Result};
use nalgebra::{DMatrix, DVector};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Configuration for the stationary-distribution solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationaryConfig {
    /// Maximum power-iteration steps before giving up.
    pub max_iterations: usize,
    /// Convergence tolerance on `||pi T - pi||_1`.
    pub tolerance: f64,
    /// Largest vertex count solved directly; bigger graphs iterate.
    pub direct_limit: usize,
}

impl Default for StationaryConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100_000,
            tolerance: 1e-12,
            direct_limit: 2_000,
        }
    }
}

impl StationaryConfig {
    /// Set the iteration limit.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the largest vertex count handled by the direct solver.
    pub fn with_direct_limit(mut self, direct_limit: usize) -> Self {
        self.direct_limit = direct_limit;
        self
    }
}

/// Residual accepted from the direct solver when `tolerance` is tighter.
const DIRECT_RESIDUAL: f64 = 1e-9;

/// The second-order null model and the stationary distribution it was built from.
#[derive(Debug, Clone)]
pub struct NullModel {
    /// Null graph on the vertices of the giant component.
    pub graph: AggregateGraph,
    /// Stationary probability per vertex, indexed like `graph`'s vertices.
    pub stationary: Vec<f64>,
}

impl NullModel {
    /// Stationary probability of a vertex by name.
    pub fn stationary_of(&self, name: &str) -> Result<f64> {
        Ok(self.stationary[self.graph.index_of(name)?])
    }
}

/// Stationary distribution of the random walk on `graph`.
///
/// Returns one probability per vertex (in vertex order) summing to 1.
/// Fails with `DegenerateModel` for an empty graph and with
/// `NumericalConvergence` when power iteration reaches its iteration limit.
pub fn stationary_distribution(graph: &AggregateGraph, config: &StationaryConfig) -> Result<Vec<f64>> {
    let n = graph.vertex_count();
    if n == 0 {
        return Err(Error::DegenerateModel { vertices: 0 });
    }

    if n <= config.direct_limit {
        if let Some(pi) = solve_direct(graph, config.tolerance.max(DIRECT_RESIDUAL)) {
            return Ok(pi);
        }
        debug!(vertices = n, "direct stationary solve rejected, iterating");
    }
    power_iteration(graph, config)
}

/// Solve `pi (I - T) = 0`, `sum(pi) = 1` by LU decomposition.
///
/// The transposed system has one redundant equation for an irreducible
/// chain; it is replaced by the normalisation row. Returns `None` when the
/// system is singular or the solution is not a distribution within `accept`.
fn solve_direct(graph: &AggregateGraph, accept: f64) -> Option<Vec<f64>> {
    let n = graph.vertex_count();
    let t = graph.transition_matrix();

    let a = DMatrix::from_fn(n, n, |i, j| {
        if i + 1 == n {
            1.0
        } else if i == j {
            1.0 - t[[j, i]]
        } else {
            -t[[j, i]]
        }
    });
    let mut b = DVector::<f64>::zeros(n);
    b[n - 1] = 1.0;

    let solution = a.lu().solve(&b)?;
    if solution.iter().any(|p| !p.is_finite() || *p < -accept) {
        return None;
    }

    let clamped = Array1::from_iter(solution.iter().map(|p| p.max(0.0)));
    let total = clamped.sum();
    if total <= 0.0 {
        return None;
    }
    let pi = clamped / total;

    let residual = (&pi.dot(&t) - &pi).mapv(f64::abs).sum();
    trace!(residual, "direct stationary residual");
    if residual > accept {
        return None;
    }
    debug!(vertices = n, residual, "stationary distribution solved directly");
    Some(pi.to_vec())
}

/// Power iteration on the lazy chain over the sparse transition lists.
fn power_iteration(graph: &AggregateGraph, config: &StationaryConfig) -> Result<Vec<f64>> {
    let n = graph.vertex_count();
    let transitions = graph.transition_lists();
    let mut pi = Array1::<f64>::from_elem(n, 1.0 / n as f64);
    let mut residual = f64::INFINITY;

    for iteration in 0..config.max_iterations {
        let mut step = Array1::<f64>::zeros(n);
        for (i, row) in transitions.iter().enumerate() {
            for &(j, p) in row {
                step[j] += pi[i] * p;
            }
        }
        residual = (&step - &pi).mapv(f64::abs).sum();
        trace!(iteration, residual, "stationary power iteration");

        if residual < config.tolerance {
            let total = pi.sum();
            debug!(iterations = iteration + 1, residual, vertices = n, "stationary distribution converged");
            return Ok(pi.iter().map(|p| p / total).collect());
        }

        pi = (&pi + &step) * 0.5;
        // Rows without outgoing weight leak mass; renormalise each step.
        let total = pi.sum();
        if total <= 0.0 {
            break;
        }
        pi /= total;
    }

    warn!(
        max_iterations = config.max_iterations,
        residual,
        "stationary distribution did not converge"
    );
    Err(Error::NumericalConvergence {
        iterations: config.max_iterations,
        residual,
    })
}

/// Build the second-order null model from a second-order network.
///
/// Fails with `DegenerateModel` when the giant strongly connected component
/// of `second_order` has fewer than two vertices.
pub fn second_order_null(second_order: &AggregateGraph, config: &StationaryConfig) -> Result<NullModel> {
    let giant = second_order.giant_component();
    if giant.vertex_count() < 2 {
        return Err(Error::DegenerateModel {
            vertices: giant.vertex_count(),
        });
    }

    let stationary = stationary_distribution(&giant, config)?;

    let mut acc = GraphAccumulator::new(second_order.order(), "");
    let mut by_first: HashMap<&NodeId, Vec<usize>> = HashMap::new();
    for (i, v) in giant.vertices().enumerate() {
        acc.insert_vertex(v.clone());
        if let Some(first) = v.first() {
            by_first.entry(first).or_default().push(i);
        }
    }

    for (i, a) in giant.vertices().enumerate() {
        let Some(successors) = a.last().and_then(|y| by_first.get(y)) else {
            continue;
        };
        for &j in successors {
            if stationary[j] > 0.0 {
                acc.add(i, j, stationary[j]);
            }
        }
    }

    let graph = acc.finish();
    debug!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "built second-order null model"
    );
    Ok(NullModel { graph, stationary })
}
