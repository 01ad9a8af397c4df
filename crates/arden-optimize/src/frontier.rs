//! Efficient-frontier tracing.

use crate::error::OptimizeError;
use crate::markowitz::{Constraints, Objective, achievable_return_range, mean_variance_optimize};
use ndarray::{ArrayView1, ArrayView2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One point on the frontier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    /// Portfolio volatility at this point
    pub risk: f64,
    /// Expected return at this point
    pub expected_return: f64,
    /// Weights achieving the point
    pub weights: Vec<f64>,
}

/// Trace the efficient frontier with `n_points` target returns linearly
/// spaced between the global-minimum-variance return and the maximum
/// achievable return.
///
/// Points come back ordered by target; risk and return are non-decreasing
/// along the result. Each point is an independent solve, so the targets are
/// processed in parallel.
///
/// # Errors
///
/// * [`OptimizeError::FrontierPointCount`] for `n_points < 2`
/// * Any error from the underlying solves
pub fn efficient_frontier(
    expected_returns: ArrayView1<'_, f64>,
    covariance: ArrayView2<'_, f64>,
    constraints: &Constraints,
    n_points: usize,
) -> Result<Vec<FrontierPoint>, OptimizeError> {
    if n_points < 2 {
        return Err(OptimizeError::FrontierPointCount(n_points));
    }

    let (min_return, max_return) = achievable_return_range(expected_returns, covariance, constraints)?;
    #[allow(clippy::cast_precision_loss)]
    let step = (max_return - min_return) / (n_points - 1) as f64;

    (0..n_points)
        .into_par_iter()
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let target = min_return + step * i as f64;
            let result = mean_variance_optimize(
                expected_returns,
                covariance,
                constraints,
                Objective::TargetReturn(target),
            )?;
            Ok(FrontierPoint {
                risk: result.expected_volatility,
                expected_return: result.expected_return,
                weights: result.weights,
            })
        })
        .collect()
}
