//! Quadratic-program backend.
//!
//! Problems are the standard mean-variance form
//!
//! ```text
//! minimize    (gamma / 2) w' S w  -  mu' w
//! subject to  sum(w) = 1,  lower <= w <= upper,
//!             sum(w[members]) <= cap   for each group cap
//! ```
//!
//! The [`Solver`] trait keeps the backend swappable. The default backend is
//! projected gradient descent: gradient steps at a fixed step size from a
//! Lipschitz bound, followed by exact Euclidean projection onto the
//! box-constrained budget simplex (bisection on the dual variable of the
//! budget constraint). Group caps are handled by a quadratic penalty whose
//! weight escalates across outer rounds until the caps hold.

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Feasibility slack on the budget and cap checks.
const FEASIBILITY_TOLERANCE: f64 = 1e-9;

/// Accepted residual violation of a group cap in the final iterate.
const CAP_TOLERANCE: f64 = 1e-6;

/// Errors raised while validating or solving a QP.
#[derive(Debug, Error)]
pub enum SolverError {
    /// An input's length does not match the number of assets.
    #[error("{field} has length {actual}, expected {expected}")]
    Dimension {
        /// Offending input
        field: &'static str,
        /// Number of assets
        expected: usize,
        /// Length actually supplied
        actual: usize,
    },

    /// The constraint set admits no fully invested portfolio.
    #[error("infeasible constraints: {reason}")]
    Infeasible {
        /// Which constraint combination rules out every feasible point
        reason: String,
    },
}

/// Upper bound on the combined weight of a group of assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCap {
    /// Human-readable label used in error messages
    pub label: String,
    /// Asset indices the cap covers
    pub members: Vec<usize>,
    /// Maximum combined weight
    pub cap: f64,
}

/// A mean-variance QP over `n` assets.
#[derive(Debug, Clone)]
pub struct QpProblem<'a> {
    /// Expected returns, length `n`
    pub expected_returns: ArrayView1<'a, f64>,
    /// Covariance matrix, `n x n`
    pub covariance: ArrayView2<'a, f64>,
    /// Risk-aversion coefficient, strictly positive
    pub risk_aversion: f64,
    /// Per-asset lower bounds
    pub lower: &'a [f64],
    /// Per-asset upper bounds
    pub upper: &'a [f64],
    /// Group exposure caps
    pub group_caps: &'a [GroupCap],
}

impl QpProblem<'_> {
    /// Number of assets.
    pub fn len(&self) -> usize {
        self.expected_returns.len()
    }

    /// Whether the problem has zero assets.
    pub fn is_empty(&self) -> bool {
        self.expected_returns.is_empty()
    }

    /// Check dimensions and up-front feasibility.
    ///
    /// # Errors
    ///
    /// [`SolverError::Dimension`] for shape mismatches,
    /// [`SolverError::Infeasible`] when the bounds or caps cannot hold a
    /// fully invested portfolio.
    pub fn validate(&self) -> Result<(), SolverError> {
        let n = self.len();
        if n == 0 {
            return Err(SolverError::Infeasible {
                reason: "no assets".to_string(),
            });
        }
        if self.covariance.nrows() != n || self.covariance.ncols() != n {
            return Err(SolverError::Dimension {
                field: "covariance",
                expected: n,
                actual: self.covariance.nrows(),
            });
        }
        if self.lower.len() != n {
            return Err(SolverError::Dimension {
                field: "lower bounds",
                expected: n,
                actual: self.lower.len(),
            });
        }
        if self.upper.len() != n {
            return Err(SolverError::Dimension {
                field: "upper bounds",
                expected: n,
                actual: self.upper.len(),
            });
        }

        for i in 0..n {
            if self.lower[i] > self.upper[i] {
                return Err(SolverError::Infeasible {
                    reason: format!(
                        "asset {i}: lower bound {} above upper bound {}",
                        self.lower[i], self.upper[i]
                    ),
                });
            }
        }
        let lower_sum: f64 = self.lower.iter().sum();
        let upper_sum: f64 = self.upper.iter().sum();
        if lower_sum > 1.0 + FEASIBILITY_TOLERANCE {
            return Err(SolverError::Infeasible {
                reason: format!("lower bounds sum to {lower_sum:.6} > 1"),
            });
        }
        if upper_sum < 1.0 - FEASIBILITY_TOLERANCE {
            return Err(SolverError::Infeasible {
                reason: format!("upper bounds sum to {upper_sum:.6} < 1"),
            });
        }

        for cap in self.group_caps {
            for &i in &cap.members {
                if i >= n {
                    return Err(SolverError::Dimension {
                        field: "group cap members",
                        expected: n,
                        actual: i + 1,
                    });
                }
            }
            let member_lower: f64 = cap.members.iter().map(|&i| self.lower[i]).sum();
            if cap.cap < member_lower - FEASIBILITY_TOLERANCE {
                return Err(SolverError::Infeasible {
                    reason: format!(
                        "cap {:.4} on '{}' below its members' lower bounds ({member_lower:.4})",
                        cap.cap, cap.label
                    ),
                });
            }
            let outside_upper: f64 = (0..n)
                .filter(|i| !cap.members.contains(i))
                .map(|i| self.upper[i])
                .sum();
            if outside_upper + cap.cap < 1.0 - FEASIBILITY_TOLERANCE {
                return Err(SolverError::Infeasible {
                    reason: format!(
                        "cap {:.4} on '{}' leaves at most {:.4} investable",
                        cap.cap,
                        cap.label,
                        outside_upper + cap.cap
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Solver output.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Optimal (or best-found) weights; satisfy the budget and bounds exactly
    pub weights: Array1<f64>,
    /// Gradient iterations consumed
    pub iterations: usize,
    /// False when the iteration budget ran out before the tolerance was met
    pub converged: bool,
}

/// A QP backend.
pub trait Solver {
    /// Solve the problem, returning the best iterate found.
    ///
    /// # Errors
    ///
    /// See [`QpProblem::validate`].
    fn solve(&self, problem: &QpProblem<'_>) -> Result<Solution, SolverError>;
}

/// Iteration budget and tolerances for [`ProjectedGradientSolver`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Gradient iterations per penalty round
    pub max_iterations: usize,
    /// Max-norm step change below which a round is converged
    pub tolerance: f64,
    /// Initial quadratic penalty weight for group caps
    pub penalty_weight: f64,
    /// Penalty escalation rounds before giving up on a violated cap
    pub penalty_rounds: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5_000,
            tolerance: 1e-9,
            penalty_weight: 100.0,
            penalty_rounds: 6,
        }
    }
}

/// Projected gradient descent with penalty-escalated group caps.
#[derive(Debug, Clone, Default)]
pub struct ProjectedGradientSolver {
    config: SolverConfig,
}

impl ProjectedGradientSolver {
    /// Build a solver with an explicit configuration.
    pub const fn new(config: SolverConfig) -> Self {
        Self { config }
    }
}

impl Solver for ProjectedGradientSolver {
    fn solve(&self, problem: &QpProblem<'_>) -> Result<Solution, SolverError> {
        problem.validate()?;
        let n = problem.len();

        #[allow(clippy::cast_precision_loss)]
        let start = Array1::from_elem(n, 1.0 / n as f64);
        let mut weights = project_budget_box(start, problem.lower, problem.upper);

        let base_lipschitz = problem.risk_aversion * matrix_inf_norm(&problem.covariance);
        let rounds = if problem.group_caps.is_empty() {
            1
        } else {
            self.config.penalty_rounds
        };
        let mut penalty = self.config.penalty_weight;
        let mut iterations = 0;
        let mut converged = false;

        for round in 0..rounds {
            #[allow(clippy::cast_precision_loss)]
            let lipschitz = if problem.group_caps.is_empty() {
                base_lipschitz
            } else {
                base_lipschitz + 2.0 * penalty * n as f64
            };
            let step = 1.0 / lipschitz.max(f64::EPSILON);

            converged = false;
            for _ in 0..self.config.max_iterations {
                iterations += 1;
                let mut gradient = problem.covariance.dot(&weights) * problem.risk_aversion;
                gradient -= &problem.expected_returns;
                for cap in problem.group_caps {
                    let excess = group_exposure(&weights, cap) - cap.cap;
                    if excess > 0.0 {
                        for &i in &cap.members {
                            gradient[i] += 2.0 * penalty * excess;
                        }
                    }
                }

                let next = project_budget_box(&weights - &(gradient * step), problem.lower, problem.upper);
                let delta = weights
                    .iter()
                    .zip(next.iter())
                    .map(|(a, b)| (a - b).abs())
                    .fold(0.0, f64::max);
                weights = next;
                if delta < self.config.tolerance {
                    converged = true;
                    break;
                }
            }

            let worst_violation = problem
                .group_caps
                .iter()
                .map(|cap| group_exposure(&weights, cap) - cap.cap)
                .fold(0.0, f64::max);
            if worst_violation <= CAP_TOLERANCE {
                break;
            }
            if round + 1 < rounds {
                penalty *= 10.0;
            } else {
                converged = false;
            }
        }

        Ok(Solution {
            weights,
            iterations,
            converged,
        })
    }
}

fn group_exposure(weights: &Array1<f64>, cap: &GroupCap) -> f64 {
    cap.members.iter().map(|&i| weights[i]).sum()
}

fn matrix_inf_norm(matrix: &ArrayView2<'_, f64>) -> f64 {
    matrix
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|x| x.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// Euclidean projection onto `{ w : sum(w) = 1, lower <= w <= upper }`.
///
/// The projection clamps `v - lambda` into the box, where the scalar
/// `lambda` is found by bisection: the clamped sum is continuous and
/// non-increasing in `lambda`, and feasibility guarantees a root.
fn project_budget_box(v: Array1<f64>, lower: &[f64], upper: &[f64]) -> Array1<f64> {
    let mut v = v;
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for (i, &vi) in v.iter().enumerate() {
        lo = lo.min(vi - upper[i]);
        hi = hi.max(vi - lower[i]);
    }

    for _ in 0..64 {
        let mid = 0.5 * (lo + hi);
        let sum: f64 = v
            .iter()
            .enumerate()
            .map(|(i, &vi)| (vi - mid).clamp(lower[i], upper[i]))
            .sum();
        if sum > 1.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let lambda = 0.5 * (lo + hi);
    for (i, vi) in v.iter_mut().enumerate() {
        *vi = (*vi - lambda).clamp(lower[i], upper[i]);
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr1, arr2};

    fn solve(
        mu: &Array1<f64>,
        cov: &ndarray::Array2<f64>,
        risk_aversion: f64,
        lower: &[f64],
        upper: &[f64],
        caps: &[GroupCap],
    ) -> Solution {
        ProjectedGradientSolver::default()
            .solve(&QpProblem {
                expected_returns: mu.view(),
                covariance: cov.view(),
                risk_aversion,
                lower,
                upper,
                group_caps: caps,
            })
            .unwrap()
    }

    #[test]
    fn test_symmetric_problem_gives_equal_weights() {
        let mu = arr1(&[0.06, 0.06, 0.06]);
        let cov = arr2(&[[0.04, 0.0, 0.0], [0.0, 0.04, 0.0], [0.0, 0.0, 0.04]]);
        let solution = solve(&mu, &cov, 2.0, &[0.0; 3], &[1.0; 3], &[]);

        assert!(solution.converged);
        for &w in &solution.weights {
            assert_abs_diff_eq!(w, 1.0 / 3.0, epsilon = 1e-6);
        }
        assert_abs_diff_eq!(solution.weights.sum(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_minimum_variance_with_diagonal_covariance() {
        // With mu = 0 and diagonal covariance, the optimum weights are
        // proportional to inverse variance.
        let mu = arr1(&[0.0, 0.0]);
        let cov = arr2(&[[0.04, 0.0], [0.0, 0.01]]);
        let solution = solve(&mu, &cov, 1.0, &[0.0; 2], &[1.0; 2], &[]);

        assert_abs_diff_eq!(solution.weights[0], 0.2, epsilon = 1e-5);
        assert_abs_diff_eq!(solution.weights[1], 0.8, epsilon = 1e-5);
    }

    #[test]
    fn test_bounds_are_respected() {
        // Asset 0 dominates on return but is capped at 40%.
        let mu = arr1(&[0.50, 0.01]);
        let cov = arr2(&[[0.04, 0.0], [0.0, 0.04]]);
        let solution = solve(&mu, &cov, 1.0, &[0.0; 2], &[0.4, 1.0], &[]);

        assert_abs_diff_eq!(solution.weights[0], 0.4, epsilon = 1e-9);
        assert_abs_diff_eq!(solution.weights[1], 0.6, epsilon = 1e-9);
    }

    #[test]
    fn test_group_cap_binds() {
        let mu = arr1(&[0.30, 0.30, 0.02]);
        let cov = arr2(&[[0.04, 0.0, 0.0], [0.0, 0.04, 0.0], [0.0, 0.0, 0.04]]);
        let caps = vec![GroupCap {
            label: "growth".to_string(),
            members: vec![0, 1],
            cap: 0.5,
        }];
        let solution = solve(&mu, &cov, 1.0, &[0.0; 3], &[1.0; 3], &caps);

        let exposure = solution.weights[0] + solution.weights[1];
        assert!(exposure <= 0.5 + 1e-4, "cap violated: {exposure}");
        assert_abs_diff_eq!(solution.weights.sum(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_upper_bounds_below_budget_rejected() {
        let mu = arr1(&[0.1, 0.1]);
        let cov = arr2(&[[0.04, 0.0], [0.0, 0.04]]);
        let err = ProjectedGradientSolver::default()
            .solve(&QpProblem {
                expected_returns: mu.view(),
                covariance: cov.view(),
                risk_aversion: 1.0,
                lower: &[0.0, 0.0],
                upper: &[0.3, 0.3],
                group_caps: &[],
            })
            .unwrap_err();
        assert!(matches!(err, SolverError::Infeasible { .. }));
    }

    #[test]
    fn test_projection_lands_on_budget() {
        let projected = project_budget_box(arr1(&[0.9, 0.9, -0.5]), &[0.0; 3], &[1.0; 3]);
        assert_abs_diff_eq!(projected.sum(), 1.0, epsilon = 1e-12);
        for &w in &projected {
            assert!((0.0..=1.0).contains(&w));
        }
    }
}
