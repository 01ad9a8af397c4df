//! Error types for the data model and series construction.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while constructing or validating portfolio objects.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Snapshot was constructed without any positions
    #[error("snapshot for '{0}' has no positions")]
    EmptySnapshot(String),

    /// Total market value must be strictly positive for weights to be defined
    #[error("snapshot for '{portfolio}' has non-positive total value {total_value}")]
    NonPositiveValue {
        /// Portfolio identifier
        portfolio: String,
        /// Offending total market value
        total_value: f64,
    },

    /// The same ticker appears more than once in a snapshot
    #[error("duplicate ticker '{0}' in snapshot")]
    DuplicateTicker(String),

    /// A price or quantity was NaN or infinite
    #[error("non-finite {field} for '{ticker}'")]
    NonFinite {
        /// Ticker of the offending position
        ticker: String,
        /// Which field failed validation
        field: &'static str,
    },
}

/// Errors raised while building or aligning return series.
#[derive(Debug, Error)]
pub enum SeriesError {
    /// A held instrument has no price on a date required by the analysis.
    ///
    /// This is a hard error: forward-filling a gap would silently corrupt
    /// every downstream risk estimate.
    #[error("missing price for '{ticker}' on {date}")]
    DataGap {
        /// Instrument with the missing observation
        ticker: String,
        /// Date with no price
        date: NaiveDate,
    },

    /// Series has no observations (or too few to difference)
    #[error("series '{0}' has no usable observations")]
    Empty(String),

    /// Dates are not strictly increasing
    #[error("series '{series}' is not strictly increasing at {date}")]
    NonIncreasingDates {
        /// Series identifier
        series: String,
        /// First date that breaks monotonicity
        date: NaiveDate,
    },

    /// Two series share no dates after alignment
    #[error("'{left}' and '{right}' share no common dates")]
    DisjointDates {
        /// Left series identifier
        left: String,
        /// Right series identifier
        right: String,
    },

    /// Series lengths differ where aligned input was required
    #[error("misaligned series: {left_len} vs {right_len} observations")]
    Misaligned {
        /// Left series length
        left_len: usize,
        /// Right series length
        right_len: usize,
    },

    /// No price history supplied for a held instrument
    #[error("no price history supplied for held instrument '{0}'")]
    MissingHistory(String),

    /// A price observation was zero, negative, NaN or infinite
    #[error("invalid price {price} for '{ticker}' on {date}")]
    InvalidPrice {
        /// Instrument
        ticker: String,
        /// Observation date
        date: NaiveDate,
        /// Offending price
        price: f64,
    },
}
