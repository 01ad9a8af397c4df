//! Carino multi-period linking.
//!
//! Single-period effects are additive within their own period but additive
//! linking across periods does not reproduce the geometric active return.
//! Carino's logarithmic coefficients rescale each period's effects so the
//! linked totals satisfy
//!
//! ```text
//! sum_t (k_t / K) * effect_t  sums to  prod(1+r_p) - prod(1+r_b)
//! ```
//!
//! with `k_t = (ln(1+r_p,t) - ln(1+r_b,t)) / (r_p,t - r_b,t)` and `K` the
//! same expression over the cumulative returns. The degenerate case
//! `r_p = r_b` takes the limit `1 / (1 + r_p)`.

use crate::brinson::{AttributionResult, SectorAttribution};
use crate::error::AttributionError;
use arden_model::Sector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Multi-period attribution with Carino-linked effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedAttribution {
    /// Number of periods linked
    pub periods: usize,
    /// Geometric portfolio return over all periods
    pub portfolio_return: f64,
    /// Geometric benchmark return over all periods
    pub benchmark_return: f64,
    /// Geometric active return; equals the sum of the linked effects
    pub active_return: f64,
    /// Linked allocation effect
    pub allocation: f64,
    /// Linked selection effect
    pub selection: f64,
    /// Linked interaction effect
    pub interaction: f64,
    /// Per-sector linked effects, ordered by first appearance
    pub sectors: Vec<SectorAttribution>,
}

/// Link single-period attributions into one multi-period result.
///
/// # Errors
///
/// * [`AttributionError::NoPeriods`] for an empty slice
/// * [`AttributionError::UnlinkableReturn`] when any period return is not
///   finite or is at or below -100%
pub fn link_periods(periods: &[AttributionResult]) -> Result<LinkedAttribution, AttributionError> {
    if periods.is_empty() {
        return Err(AttributionError::NoPeriods);
    }

    let mut portfolio_growth = 1.0;
    let mut benchmark_growth = 1.0;
    for (index, period) in periods.iter().enumerate() {
        check_linkable(index, "portfolio", period.portfolio_return)?;
        check_linkable(index, "benchmark", period.benchmark_return)?;
        portfolio_growth *= 1.0 + period.portfolio_return;
        benchmark_growth *= 1.0 + period.benchmark_return;
    }
    let portfolio_return = portfolio_growth - 1.0;
    let benchmark_return = benchmark_growth - 1.0;
    let overall = carino_coefficient(portfolio_return, benchmark_return);

    let mut allocation = 0.0;
    let mut selection = 0.0;
    let mut interaction = 0.0;
    let mut sector_order: Vec<Sector> = Vec::new();
    let mut by_sector: HashMap<Sector, SectorAttribution> = HashMap::new();

    for period in periods {
        let scale = carino_coefficient(period.portfolio_return, period.benchmark_return) / overall;
        allocation += scale * period.allocation;
        selection += scale * period.selection;
        interaction += scale * period.interaction;

        for row in &period.sectors {
            let linked = by_sector.entry(row.sector).or_insert_with(|| {
                sector_order.push(row.sector);
                SectorAttribution {
                    sector: row.sector,
                    allocation: 0.0,
                    selection: 0.0,
                    interaction: 0.0,
                    total: 0.0,
                }
            });
            linked.allocation += scale * row.allocation;
            linked.selection += scale * row.selection;
            linked.interaction += scale * row.interaction;
            linked.total += scale * row.total;
        }
    }

    let sectors = sector_order
        .into_iter()
        .map(|sector| by_sector[&sector])
        .collect();

    Ok(LinkedAttribution {
        periods: periods.len(),
        portfolio_return,
        benchmark_return,
        active_return: portfolio_return - benchmark_return,
        allocation,
        selection,
        interaction,
        sectors,
    })
}

fn carino_coefficient(portfolio_return: f64, benchmark_return: f64) -> f64 {
    let spread = portfolio_return - benchmark_return;
    if spread.abs() < f64::EPSILON {
        1.0 / (1.0 + portfolio_return)
    } else {
        ((1.0 + portfolio_return).ln() - (1.0 + benchmark_return).ln()) / spread
    }
}

fn check_linkable(period: usize, side: &'static str, value: f64) -> Result<(), AttributionError> {
    if !value.is_finite() || value <= -1.0 {
        return Err(AttributionError::UnlinkableReturn {
            period,
            side,
            value,
        });
    }
    Ok(())
}
