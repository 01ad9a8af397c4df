//! Error types for the risk engine.

use crate::covariance::CovarianceError;
use thiserror::Error;

/// Errors that can occur while computing risk statistics.
#[derive(Debug, Error)]
pub enum RiskError {
    /// Too few observations for a stable estimate.
    ///
    /// The default floor of 30 observations avoids unstable quantile
    /// estimates; it is configurable via `VarConfig::min_observations`.
    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Confidence level outside the open interval (0, 1)
    #[error("confidence level {0} must lie strictly between 0 and 1")]
    InvalidConfidence(f64),

    /// Horizon must be at least one day
    #[error("horizon of {0} days is not a valid risk horizon")]
    InvalidHorizon(u32),

    /// Portfolio and benchmark series must be aligned before any joint
    /// statistic is computed
    #[error("series are not aligned: {left} has {left_len} observations, {right} has {right_len}")]
    MisalignedSeries {
        /// Left series identifier
        left: String,
        /// Left series length
        left_len: usize,
        /// Right series identifier
        right: String,
        /// Right series length
        right_len: usize,
    },

    /// Covariance estimation or decomposition failure
    #[error("covariance error: {0}")]
    Covariance(#[from] CovarianceError),

    /// Monte Carlo VaR needs constituent returns and weights, not a
    /// pre-aggregated portfolio series
    #[error("monte carlo VaR requires constituent returns and weights")]
    ConstituentsRequired,

    /// Weights and return-matrix dimensions disagree
    #[error("weight vector has {weights} entries but return matrix has {columns} columns")]
    WeightDimension {
        /// Length of the weight vector
        weights: usize,
        /// Number of return-matrix columns
        columns: usize,
    },
}
