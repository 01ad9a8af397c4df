//! Attribution error taxonomy.

use arden_model::Sector;
use thiserror::Error;

/// Errors raised by the attribution engine.
#[derive(Debug, Error)]
pub enum AttributionError {
    /// No sector observations were supplied for the period.
    #[error("no sector observations supplied")]
    Empty,

    /// A weight column does not sum to 1 within tolerance. Attribution
    /// effects are only meaningful over a fully allocated portfolio.
    #[error("{side} weights sum to {sum:.8}, expected 1.0 within {tolerance}")]
    WeightSum {
        /// Which column failed ("portfolio" or "benchmark")
        side: &'static str,
        /// Observed sum
        sum: f64,
        /// Accepted tolerance
        tolerance: f64,
    },

    /// The same sector appears in more than one observation.
    #[error("sector '{0}' appears more than once")]
    DuplicateSector(Sector),

    /// An empty period list was passed to the multi-period linker.
    #[error("no periods to link")]
    NoPeriods,

    /// A period return cannot be log-linked. Carino coefficients need
    /// returns strictly greater than -100% and finite.
    #[error("period {period} {side} return {value} is not linkable (must be finite and > -1)")]
    UnlinkableReturn {
        /// Zero-based period index
        period: usize,
        /// Which return failed ("portfolio" or "benchmark")
        side: &'static str,
        /// Offending value
        value: f64,
    },
}
