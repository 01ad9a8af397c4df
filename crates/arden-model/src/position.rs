//! Portfolio positions.

use crate::instrument::Instrument;
use serde::{Deserialize, Serialize};

/// A single holding: instrument, signed quantity, cost basis and the price
/// used to mark it.
///
/// Positions are read-only inputs to the analytics engines; trade settlement
/// (which would mutate them) lives outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Instrument reference data
    pub instrument: Instrument,
    /// Signed quantity in units (negative for shorts)
    pub quantity: f64,
    /// Average cost per unit
    pub cost_basis: f64,
    /// Current mark price per unit
    pub current_price: f64,
}

impl Position {
    /// Create a new position.
    pub const fn new(
        instrument: Instrument,
        quantity: f64,
        cost_basis: f64,
        current_price: f64,
    ) -> Self {
        Self {
            instrument,
            quantity,
            cost_basis,
            current_price,
        }
    }

    /// Ticker of the underlying instrument.
    pub fn ticker(&self) -> &str {
        &self.instrument.ticker
    }

    /// Market value: quantity × current price (signed).
    pub fn market_value(&self) -> f64 {
        self.quantity * self.current_price
    }

    /// Unrealized P&L versus cost basis (signed).
    pub fn unrealized_pnl(&self) -> f64 {
        self.quantity * (self.current_price - self.cost_basis)
    }

    /// Unrealized P&L as a fraction of cost, when cost is non-zero.
    pub fn unrealized_pnl_pct(&self) -> Option<f64> {
        let cost = self.quantity * self.cost_basis;
        if cost.abs() < f64::EPSILON {
            None
        } else {
            Some(self.unrealized_pnl() / cost.abs())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sector::Sector;
    use approx::assert_abs_diff_eq;

    fn aapl(quantity: f64) -> Position {
        Position::new(
            Instrument::equity("AAPL".to_string(), Sector::InformationTechnology),
            quantity,
            150.0,
            180.0,
        )
    }

    #[test]
    fn test_market_value() {
        assert_abs_diff_eq!(aapl(100.0).market_value(), 18_000.0);
    }

    #[test]
    fn test_unrealized_pnl() {
        let pos = aapl(100.0);
        assert_abs_diff_eq!(pos.unrealized_pnl(), 3_000.0);
        assert_abs_diff_eq!(pos.unrealized_pnl_pct().unwrap(), 0.2);
    }

    #[test]
    fn test_short_position_is_signed() {
        let pos = aapl(-50.0);
        assert_abs_diff_eq!(pos.market_value(), -9_000.0);
        assert_abs_diff_eq!(pos.unrealized_pnl(), -1_500.0);
    }

    #[test]
    fn test_pnl_pct_none_for_zero_cost() {
        let pos = Position::new(Instrument::cash("USD".to_string()), 1_000.0, 0.0, 1.0);
        assert!(pos.unrealized_pnl_pct().is_none());
    }
}
