//! One-step scenario revaluation.

use crate::scenario::StressScenario;
use arden_model::{PortfolioSnapshot, Sector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while applying a stress scenario.
#[derive(Debug, Error)]
pub enum StressError {
    /// A position's sector has no shock entry and the scenario carries no
    /// default. The position cannot be silently excluded from the
    /// aggregate, so this is a hard error.
    #[error("scenario '{scenario}' has no shock for '{ticker}' (sector: {sector}) and no default")]
    UnmappedSector {
        /// Scenario name
        scenario: String,
        /// Position ticker
        ticker: String,
        /// Sector name, or "none" for sector-less positions
        sector: String,
    },
}

/// Impact of the scenario on a single position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionImpact {
    /// Position ticker
    pub ticker: String,
    /// Market value before the shock
    pub current_value: f64,
    /// Market value after the shock
    pub shocked_value: f64,
    /// Absolute impact: shocked − current
    pub impact: f64,
    /// Impact as a percentage of the position's current value
    pub impact_percentage: f64,
}

/// Aggregate result of a stress test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressTestResult {
    /// Scenario that was applied
    pub scenario: String,
    /// Portfolio value before the shock
    pub portfolio_value_before: f64,
    /// Portfolio value after the shock
    pub portfolio_value_after: f64,
    /// Aggregate P&L (after − before)
    pub pnl: f64,
    /// Aggregate P&L as a percentage of the starting value
    pub pnl_percentage: f64,
    /// Per-position impacts in snapshot order
    pub position_impacts: Vec<PositionImpact>,
}

/// Revalue every position under the scenario's shocks.
///
/// Each position's shock is resolved by sector lookup with fallback to the
/// scenario default; `shocked_value = market_value × (1 + shock)`. The
/// aggregate always includes every position — an unmapped sector with no
/// default fails the whole call rather than dropping the position.
pub fn apply_scenario(
    snapshot: &PortfolioSnapshot,
    scenario: &StressScenario,
) -> Result<StressTestResult, StressError> {
    let mut position_impacts = Vec::with_capacity(snapshot.positions().len());
    let mut portfolio_value_after = 0.0;

    for position in snapshot.positions() {
        let sector = position.instrument.sector;
        let shock = scenario
            .shock_for(sector)
            .ok_or_else(|| StressError::UnmappedSector {
                scenario: scenario.name.clone(),
                ticker: position.ticker().to_string(),
                sector: sector.map_or_else(|| "none".to_string(), |s: Sector| s.to_string()),
            })?;

        let current_value = position.market_value();
        let shocked_value = current_value * (1.0 + shock);
        portfolio_value_after += shocked_value;

        position_impacts.push(PositionImpact {
            ticker: position.ticker().to_string(),
            current_value,
            shocked_value,
            impact: shocked_value - current_value,
            impact_percentage: shock * 100.0,
        });
    }

    let portfolio_value_before = snapshot.total_value();
    let pnl = portfolio_value_after - portfolio_value_before;

    Ok(StressTestResult {
        scenario: scenario.name.clone(),
        portfolio_value_before,
        portfolio_value_after,
        pnl,
        pnl_percentage: pnl / portfolio_value_before * 100.0,
        position_impacts,
    })
}
