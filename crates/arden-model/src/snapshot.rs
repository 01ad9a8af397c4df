//! Immutable point-in-time portfolio snapshots.

use crate::error::ModelError;
use crate::position::Position;
use chrono::NaiveDate;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Weight-sum tolerance used by [`PortfolioSnapshot::weights`] consumers.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// An immutable view of a portfolio's positions at a single timestamp.
///
/// Snapshots are built once per analysis call and never mutated. The
/// constructor validates everything the engines rely on later: positions
/// exist, tickers are unique, prices and quantities are finite, and total
/// market value is strictly positive so weights are well defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    portfolio: String,
    as_of: NaiveDate,
    positions: Vec<Position>,
    total_value: f64,
}

impl PortfolioSnapshot {
    /// Construct and validate a snapshot.
    ///
    /// # Errors
    ///
    /// * [`ModelError::EmptySnapshot`] when no positions are supplied
    /// * [`ModelError::DuplicateTicker`] when a ticker repeats
    /// * [`ModelError::NonFinite`] for NaN/infinite prices or quantities
    /// * [`ModelError::NonPositiveValue`] when total market value is <= 0
    pub fn new(
        portfolio: impl Into<String>,
        as_of: NaiveDate,
        positions: Vec<Position>,
    ) -> Result<Self, ModelError> {
        let portfolio = portfolio.into();

        if positions.is_empty() {
            return Err(ModelError::EmptySnapshot(portfolio));
        }

        let mut seen = HashSet::new();
        for pos in &positions {
            if !pos.quantity.is_finite() {
                return Err(ModelError::NonFinite {
                    ticker: pos.ticker().to_string(),
                    field: "quantity",
                });
            }
            if !pos.current_price.is_finite() {
                return Err(ModelError::NonFinite {
                    ticker: pos.ticker().to_string(),
                    field: "current_price",
                });
            }
            if !seen.insert(pos.ticker().to_string()) {
                return Err(ModelError::DuplicateTicker(pos.ticker().to_string()));
            }
        }

        let total_value: f64 = positions.iter().map(Position::market_value).sum();
        if total_value <= 0.0 {
            return Err(ModelError::NonPositiveValue {
                portfolio,
                total_value,
            });
        }

        Ok(Self {
            portfolio,
            as_of,
            positions,
            total_value,
        })
    }

    /// Portfolio identifier.
    pub fn portfolio(&self) -> &str {
        &self.portfolio
    }

    /// Valuation date of the snapshot.
    pub const fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// Positions in construction order.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Total market value (sum of position market values).
    pub const fn total_value(&self) -> f64 {
        self.total_value
    }

    /// Tickers in position order.
    pub fn tickers(&self) -> Vec<&str> {
        self.positions.iter().map(Position::ticker).collect()
    }

    /// Position lookup by ticker.
    pub fn position(&self, ticker: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.ticker() == ticker)
    }

    /// Portfolio weights in position order; sums to 1 within floating-point
    /// tolerance by construction.
    pub fn weights(&self) -> Array1<f64> {
        Array1::from_iter(
            self.positions
                .iter()
                .map(|p| p.market_value() / self.total_value),
        )
    }

    /// Weight of a single ticker, if held.
    pub fn weight_of(&self, ticker: &str) -> Option<f64> {
        self.position(ticker)
            .map(|p| p.market_value() / self.total_value)
    }
}
