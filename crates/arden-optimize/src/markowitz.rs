//! Mean-variance portfolio construction.

use crate::error::OptimizeError;
use crate::solver::{GroupCap, ProjectedGradientSolver, QpProblem, Solution, Solver};
use arden_model::Sector;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Slack when checking a target return against the achievable range.
const RANGE_TOLERANCE: f64 = 1e-9;

/// Risk-aversion bracket for the target-return bisection.
const GAMMA_MIN: f64 = 1e-6;
const GAMMA_MAX: f64 = 1e8;
const GAMMA_BISECTIONS: usize = 48;

/// Cap on the combined weight of one sector's assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorCap {
    /// Sector the cap applies to
    pub sector: Sector,
    /// Indices of this sector's assets in the optimization universe
    pub members: Vec<usize>,
    /// Maximum combined weight
    pub cap: f64,
}

/// Feasible region of the optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    /// Per-asset lower bounds
    pub lower: Vec<f64>,
    /// Per-asset upper bounds
    pub upper: Vec<f64>,
    /// Sector exposure caps
    pub sector_caps: Vec<SectorCap>,
}

impl Constraints {
    /// Long-only, fully investable: each weight in `[0, 1]`, no caps.
    pub fn long_only(n: usize) -> Self {
        Self {
            lower: vec![0.0; n],
            upper: vec![1.0; n],
            sector_caps: Vec::new(),
        }
    }

    /// Explicit box bounds, no caps.
    pub const fn with_bounds(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self {
            lower,
            upper,
            sector_caps: Vec::new(),
        }
    }

    fn group_caps(&self) -> Vec<GroupCap> {
        self.sector_caps
            .iter()
            .map(|cap| GroupCap {
                label: cap.sector.to_string(),
                members: cap.members.clone(),
                cap: cap.cap,
            })
            .collect()
    }
}

/// What the optimizer should aim for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Maximize `mu' w - (gamma / 2) w' S w` for the given `gamma`
    RiskAversion(f64),
    /// Minimize variance subject to hitting the given expected return
    TargetReturn(f64),
}

/// Optimized portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Weights in universe order; sum to 1 and satisfy the bounds
    pub weights: Vec<f64>,
    /// `mu' w`
    pub expected_return: f64,
    /// `sqrt(w' S w)`
    pub expected_volatility: f64,
    /// False when the solver's iteration budget ran out first
    pub converged: bool,
}

/// Solve a mean-variance problem under the given constraints and objective.
///
/// Target-return mode exploits that the achieved return of the
/// risk-aversion family is monotone non-increasing in `gamma`: it bisects
/// `gamma` until the achieved return matches the target, which yields the
/// minimum-variance portfolio at that return level.
///
/// # Errors
///
/// * [`OptimizeError::DimensionMismatch`] for shape mismatches
/// * [`OptimizeError::InfeasibleConstraints`] when no feasible portfolio
///   exists
/// * [`OptimizeError::InvalidRiskAversion`] for `gamma <= 0`
/// * [`OptimizeError::TargetReturnOutOfRange`] when the target lies outside
///   `[r_gmv, r_max]`
pub fn mean_variance_optimize(
    expected_returns: ArrayView1<'_, f64>,
    covariance: ArrayView2<'_, f64>,
    constraints: &Constraints,
    objective: Objective,
) -> Result<OptimizationResult, OptimizeError> {
    let caps = constraints.group_caps();
    let solver = ProjectedGradientSolver::default();

    let solution = match objective {
        Objective::RiskAversion(gamma) => {
            if !gamma.is_finite() || gamma <= 0.0 {
                return Err(OptimizeError::InvalidRiskAversion(gamma));
            }
            solver.solve(&problem(
                expected_returns.reborrow(),
                covariance.reborrow(),
                constraints,
                &caps,
                gamma,
            ))?
        }
        Objective::TargetReturn(target) => {
            let (min, _) = global_minimum_variance(expected_returns, covariance, constraints, &caps, &solver)?;
            let max = max_achievable_return(expected_returns, constraints);
            if target < min - RANGE_TOLERANCE || target > max + RANGE_TOLERANCE {
                return Err(OptimizeError::TargetReturnOutOfRange { target, min, max });
            }
            let target = target.clamp(min, max);
            solve_for_target(expected_returns, covariance, constraints, &caps, target, &solver)?
        }
    };

    Ok(result_from(&solution, expected_returns, covariance))
}

/// Return range achievable by the constrained frontier: the
/// global-minimum-variance return and the greedy maximum under the box
/// bounds.
pub(crate) fn achievable_return_range(
    expected_returns: ArrayView1<'_, f64>,
    covariance: ArrayView2<'_, f64>,
    constraints: &Constraints,
) -> Result<(f64, f64), OptimizeError> {
    let caps = constraints.group_caps();
    let solver = ProjectedGradientSolver::default();
    let (min, _) = global_minimum_variance(expected_returns, covariance, constraints, &caps, &solver)?;
    Ok((min, max_achievable_return(expected_returns, constraints)))
}

fn problem<'a>(
    expected_returns: ArrayView1<'a, f64>,
    covariance: ArrayView2<'a, f64>,
    constraints: &'a Constraints,
    caps: &'a [GroupCap],
    risk_aversion: f64,
) -> QpProblem<'a> {
    QpProblem {
        expected_returns,
        covariance,
        risk_aversion,
        lower: &constraints.lower,
        upper: &constraints.upper,
        group_caps: caps,
    }
}

fn global_minimum_variance(
    expected_returns: ArrayView1<'_, f64>,
    covariance: ArrayView2<'_, f64>,
    constraints: &Constraints,
    caps: &[GroupCap],
    solver: &ProjectedGradientSolver,
) -> Result<(f64, Solution), OptimizeError> {
    // Zero out the return term so the objective is pure variance.
    let zero = Array1::zeros(expected_returns.len());
    let solution = solver.solve(&QpProblem {
        expected_returns: zero.view(),
        covariance: covariance.reborrow(),
        risk_aversion: 1.0,
        lower: &constraints.lower,
        upper: &constraints.upper,
        group_caps: caps,
    })?;
    let gmv_return = expected_returns.dot(&solution.weights);
    Ok((gmv_return, solution))
}

/// Highest expected return reachable inside the box bounds: fill the
/// highest-return assets to their upper bounds until the budget is spent.
fn max_achievable_return(
    expected_returns: ArrayView1<'_, f64>,
    constraints: &Constraints,
) -> f64 {
    let n = expected_returns.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| expected_returns[b].total_cmp(&expected_returns[a]));

    let mut weights = constraints.lower.clone();
    let mut remaining = 1.0 - constraints.lower.iter().sum::<f64>();
    for i in order {
        let room = (constraints.upper[i] - constraints.lower[i]).min(remaining);
        weights[i] += room;
        remaining -= room;
        if remaining <= 0.0 {
            break;
        }
    }
    weights
        .iter()
        .zip(expected_returns.iter())
        .map(|(w, mu)| w * mu)
        .sum()
}

fn solve_for_target(
    expected_returns: ArrayView1<'_, f64>,
    covariance: ArrayView2<'_, f64>,
    constraints: &Constraints,
    caps: &[GroupCap],
    target: f64,
    solver: &ProjectedGradientSolver,
) -> Result<Solution, OptimizeError> {
    let mut gamma_low = GAMMA_MIN;
    let mut gamma_high = GAMMA_MAX;
    let mut best = solver.solve(&problem(
        expected_returns.reborrow(),
        covariance.reborrow(),
        constraints,
        caps,
        gamma_low,
    ))?;

    for _ in 0..GAMMA_BISECTIONS {
        let gamma = (gamma_low * gamma_high).sqrt();
        let solution = solver.solve(&problem(
            expected_returns.reborrow(),
            covariance.reborrow(),
            constraints,
            caps,
            gamma,
        ))?;
        let achieved = expected_returns.dot(&solution.weights);
        if achieved > target {
            // Still above target: can afford more risk aversion.
            gamma_low = gamma;
            best = solution;
        } else {
            gamma_high = gamma;
        }
    }
    Ok(best)
}

fn result_from(
    solution: &Solution,
    expected_returns: ArrayView1<'_, f64>,
    covariance: ArrayView2<'_, f64>,
) -> OptimizationResult {
    let expected_return = expected_returns.dot(&solution.weights);
    let variance = solution.weights.dot(&covariance.dot(&solution.weights));
    OptimizationResult {
        weights: solution.weights.to_vec(),
        expected_return,
        expected_volatility: variance.max(0.0).sqrt(),
        converged: solution.converged,
    }
}
