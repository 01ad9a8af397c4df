//! Trade-list generation against a live snapshot.

use crate::error::OptimizeError;
use arden_model::PortfolioSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Tolerance on target weights summing to 1.
const TARGET_WEIGHT_TOLERANCE: f64 = 1e-6;

/// Rebalance thresholds and cost assumptions.
#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceConfig {
    /// Weight drifts at or below this band generate no trade
    pub no_trade_band: f64,
    /// Commission as a fraction of traded value
    pub commission_rate: f64,
    /// Prices for target tickers not currently held
    pub reference_prices: HashMap<String, f64>,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            // 10 bp of weight
            no_trade_band: 0.001,
            // 1 bp of traded value
            commission_rate: 0.0001,
            reference_prices: HashMap::new(),
        }
    }
}

/// A single signed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Instrument being traded
    pub ticker: String,
    /// Signed share count; positive buys, negative sells
    pub shares: f64,
    /// Signed trade value in currency
    pub value: f64,
    /// Weight before the trade
    pub current_weight: f64,
    /// Weight the trade moves to
    pub target_weight: f64,
}

/// Output of a rebalance run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceResult {
    /// Trades in ticker order
    pub trades: Vec<Trade>,
    /// One-way turnover: half the sum of executed absolute weight changes
    pub turnover: f64,
    /// Commission estimate over the executed trades
    pub estimated_commission: f64,
    /// Snapshot value the weights refer to
    pub portfolio_value: f64,
}

/// Compute the signed trades moving the snapshot's weights to the targets.
///
/// The universe is the union of held and target tickers; a held ticker
/// absent from the targets is treated as a 0% target. Drifts inside the
/// no-trade band are skipped so rounding noise does not churn. Trade
/// sizing needs a price per ticker, taken from the held position or from
/// [`RebalanceConfig::reference_prices`] for new names.
///
/// # Errors
///
/// * [`OptimizeError::TargetWeightSum`] when targets do not sum to 1
/// * [`OptimizeError::InvalidTargetWeight`] for negative or non-finite
///   targets
/// * [`OptimizeError::MissingPrice`] when a new name has no reference price
pub fn rebalance(
    snapshot: &PortfolioSnapshot,
    targets: &HashMap<String, f64>,
    config: &RebalanceConfig,
) -> Result<RebalanceResult, OptimizeError> {
    for (ticker, &weight) in targets {
        if !weight.is_finite() || weight < 0.0 {
            return Err(OptimizeError::InvalidTargetWeight {
                ticker: ticker.clone(),
                weight,
            });
        }
    }
    let target_sum: f64 = targets.values().sum();
    if (target_sum - 1.0).abs() > TARGET_WEIGHT_TOLERANCE {
        return Err(OptimizeError::TargetWeightSum { sum: target_sum });
    }

    // BTreeMap keeps the trade list in a stable ticker order.
    let mut universe: BTreeMap<&str, f64> = targets
        .iter()
        .map(|(ticker, &weight)| (ticker.as_str(), weight))
        .collect();
    for position in snapshot.positions() {
        universe.entry(position.ticker()).or_insert(0.0);
    }

    let portfolio_value = snapshot.total_value();
    let mut trades = Vec::new();
    let mut executed_drift = 0.0;
    let mut traded_value = 0.0;

    for (ticker, target_weight) in universe {
        let current_weight = snapshot.weight_of(ticker).unwrap_or(0.0);
        let drift = target_weight - current_weight;
        if drift.abs() <= config.no_trade_band {
            continue;
        }

        let price = match snapshot.position(ticker) {
            Some(position) => position.current_price,
            None => *config.reference_prices.get(ticker).ok_or_else(|| {
                OptimizeError::MissingPrice {
                    ticker: ticker.to_string(),
                }
            })?,
        };

        let value = drift * portfolio_value;
        executed_drift += drift.abs();
        traded_value += value.abs();
        trades.push(Trade {
            ticker: ticker.to_string(),
            shares: value / price,
            value,
            current_weight,
            target_weight,
        });
    }

    Ok(RebalanceResult {
        trades,
        turnover: executed_drift / 2.0,
        estimated_commission: traded_value * config.commission_rate,
        portfolio_value,
    })
}
