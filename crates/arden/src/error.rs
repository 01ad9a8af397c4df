//! Umbrella error type for the facade.

use crate::provider::ProviderError;
use arden_attribution::AttributionError;
use arden_model::{ModelError, SeriesError};
use arden_optimize::OptimizeError;
use arden_risk::RiskError;
use arden_stress::StressError;
use thiserror::Error;

/// Any error an analytics request can produce.
#[derive(Debug, Error)]
pub enum ArdenError {
    /// Portfolio object validation failure
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Return-series construction or alignment failure
    #[error(transparent)]
    Series(#[from] SeriesError),

    /// Risk engine failure
    #[error(transparent)]
    Risk(#[from] RiskError),

    /// Stress engine failure
    #[error(transparent)]
    Stress(#[from] StressError),

    /// Attribution engine failure
    #[error(transparent)]
    Attribution(#[from] AttributionError),

    /// Optimization engine failure
    #[error(transparent)]
    Optimize(#[from] OptimizeError),

    /// Data provider failure
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A named stress scenario not present in the catalog
    #[error("unknown stress scenario '{0}'")]
    UnknownScenario(String),
}
