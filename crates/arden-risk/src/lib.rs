#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/ardenquant/arden/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod covariance;
pub mod error;
pub mod metrics;
pub mod stats;
pub mod var;

pub use covariance::{
    CovarianceError, cholesky, correlation_matrix, is_positive_definite, sample_covariance,
    sample_mean,
};
pub use error::RiskError;
pub use metrics::{MetricsConfig, RiskMetrics, max_drawdown, risk_metrics};
pub use var::{
    VarConfig, VarMethod, VarReport, historical_var, monte_carlo_var, parametric_var,
    value_at_risk,
};
