//! Optimization error taxonomy.

use crate::solver::SolverError;
use thiserror::Error;

/// Errors raised by the optimization engine.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The constraint set admits no fully invested portfolio.
    #[error("infeasible constraints: {reason}")]
    InfeasibleConstraints {
        /// Which constraint combination rules out every feasible point
        reason: String,
    },

    /// An input's length does not match the number of assets.
    #[error("{field} has length {actual}, expected {expected}")]
    DimensionMismatch {
        /// Offending input
        field: &'static str,
        /// Number of assets implied by the expected-returns vector
        expected: usize,
        /// Length actually supplied
        actual: usize,
    },

    /// Risk aversion must be strictly positive for the objective to be
    /// bounded.
    #[error("risk aversion must be > 0, got {0}")]
    InvalidRiskAversion(f64),

    /// A target return outside the achievable range under the constraints.
    #[error("target return {target} outside achievable range [{min:.6}, {max:.6}]")]
    TargetReturnOutOfRange {
        /// Requested target
        target: f64,
        /// Global-minimum-variance portfolio return
        min: f64,
        /// Maximum achievable return under the box bounds
        max: f64,
    },

    /// An efficient frontier needs at least two points to span a range.
    #[error("frontier needs at least 2 points, got {0}")]
    FrontierPointCount(usize),

    /// Rebalance target weights must sum to 1.
    #[error("target weights sum to {sum:.8}, expected 1.0")]
    TargetWeightSum {
        /// Observed sum
        sum: f64,
    },

    /// A rebalance target weight is negative or not finite.
    #[error("invalid target weight {weight} for '{ticker}'")]
    InvalidTargetWeight {
        /// Ticker with the bad weight
        ticker: String,
        /// Offending value
        weight: f64,
    },

    /// A target ticker is not held and no reference price was supplied, so
    /// the trade cannot be sized in shares.
    #[error("no price available for '{ticker}': not held and no reference price supplied")]
    MissingPrice {
        /// Ticker without a price
        ticker: String,
    },
}

impl From<SolverError> for OptimizeError {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::Infeasible { reason } => Self::InfeasibleConstraints { reason },
            SolverError::Dimension {
                field,
                expected,
                actual,
            } => Self::DimensionMismatch {
                field,
                expected,
                actual,
            },
        }
    }
}
