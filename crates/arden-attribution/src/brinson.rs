//! Single-period Brinson-Fachler decomposition.
//!
//! For each sector with portfolio weight `w_p`, benchmark weight `w_b`,
//! portfolio return `r_p` and benchmark return `r_b`:
//!
//! ```text
//! allocation  = (w_p - w_b) * r_b
//! selection   =  w_b * (r_p - r_b)
//! interaction = (w_p - w_b) * (r_p - r_b)
//! ```
//!
//! Summed over sectors, the three effects recover the active return
//! `R_p - R_b` exactly, which is the identity every consumer relies on.

use crate::error::AttributionError;
use arden_model::Sector;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Tolerance on each weight column summing to 1.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// One sector's weights and returns for a single period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorObservation {
    /// GICS sector
    pub sector: Sector,
    /// Portfolio weight in the sector
    pub portfolio_weight: f64,
    /// Benchmark weight in the sector
    pub benchmark_weight: f64,
    /// Portfolio return within the sector over the period
    pub portfolio_return: f64,
    /// Benchmark return within the sector over the period
    pub benchmark_return: f64,
}

/// Decomposed active return contribution of one sector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorAttribution {
    /// GICS sector
    pub sector: Sector,
    /// Allocation effect: reward for over/underweighting the sector
    pub allocation: f64,
    /// Selection effect: reward for beating the benchmark within the sector
    pub selection: f64,
    /// Interaction effect: cross term of the two active decisions
    pub interaction: f64,
    /// Sum of the three effects
    pub total: f64,
}

/// Full single-period attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionResult {
    /// Per-sector rows in input order
    pub sectors: Vec<SectorAttribution>,
    /// Weighted portfolio return for the period
    pub portfolio_return: f64,
    /// Weighted benchmark return for the period
    pub benchmark_return: f64,
    /// Aggregate allocation effect
    pub allocation: f64,
    /// Aggregate selection effect
    pub selection: f64,
    /// Aggregate interaction effect
    pub interaction: f64,
    /// `portfolio_return - benchmark_return`
    pub active_return: f64,
}

/// Run the Brinson-Fachler decomposition over one period of sector data.
///
/// # Errors
///
/// * [`AttributionError::Empty`] when no observations are supplied
/// * [`AttributionError::DuplicateSector`] when a sector repeats
/// * [`AttributionError::WeightSum`] when either weight column does not sum
///   to 1 within [`WEIGHT_TOLERANCE`]
pub fn attribute(
    observations: &[SectorObservation],
) -> Result<AttributionResult, AttributionError> {
    if observations.is_empty() {
        return Err(AttributionError::Empty);
    }

    let mut seen = HashSet::new();
    for obs in observations {
        if !seen.insert(obs.sector) {
            return Err(AttributionError::DuplicateSector(obs.sector));
        }
    }
    check_weight_sum("portfolio", observations.iter().map(|o| o.portfolio_weight))?;
    check_weight_sum("benchmark", observations.iter().map(|o| o.benchmark_weight))?;

    let mut portfolio_return = 0.0;
    let mut benchmark_return = 0.0;
    let mut allocation = 0.0;
    let mut selection = 0.0;
    let mut interaction = 0.0;

    let sectors = observations
        .iter()
        .map(|obs| {
            portfolio_return += obs.portfolio_weight * obs.portfolio_return;
            benchmark_return += obs.benchmark_weight * obs.benchmark_return;

            let active_weight = obs.portfolio_weight - obs.benchmark_weight;
            let active_sector_return = obs.portfolio_return - obs.benchmark_return;

            let row = SectorAttribution {
                sector: obs.sector,
                allocation: active_weight * obs.benchmark_return,
                selection: obs.benchmark_weight * active_sector_return,
                interaction: active_weight * active_sector_return,
                total: active_weight * obs.benchmark_return
                    + obs.benchmark_weight * active_sector_return
                    + active_weight * active_sector_return,
            };
            allocation += row.allocation;
            selection += row.selection;
            interaction += row.interaction;
            row
        })
        .collect();

    Ok(AttributionResult {
        sectors,
        portfolio_return,
        benchmark_return,
        allocation,
        selection,
        interaction,
        active_return: portfolio_return - benchmark_return,
    })
}

fn check_weight_sum(
    side: &'static str,
    weights: impl Iterator<Item = f64>,
) -> Result<(), AttributionError> {
    let sum: f64 = weights.sum();
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(AttributionError::WeightSum {
            side,
            sum,
            tolerance: WEIGHT_TOLERANCE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn obs(
        sector: Sector,
        portfolio_weight: f64,
        benchmark_weight: f64,
        portfolio_return: f64,
        benchmark_return: f64,
    ) -> SectorObservation {
        SectorObservation {
            sector,
            portfolio_weight,
            benchmark_weight,
            portfolio_return,
            benchmark_return,
        }
    }

    fn three_sector_period() -> Vec<SectorObservation> {
        vec![
            obs(Sector::InformationTechnology, 0.5, 0.4, 0.08, 0.06),
            obs(Sector::Financials, 0.3, 0.35, 0.02, 0.03),
            obs(Sector::HealthCare, 0.2, 0.25, -0.01, -0.02),
        ]
    }

    #[test]
    fn test_effects_recover_active_return() {
        let result = attribute(&three_sector_period()).unwrap();
        let total: f64 = result.sectors.iter().map(|s| s.total).sum();
        assert_abs_diff_eq!(total, result.active_return, epsilon = 1e-12);
        assert_abs_diff_eq!(
            result.allocation + result.selection + result.interaction,
            result.active_return,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_identical_weights_give_pure_selection() {
        let result = attribute(&[
            obs(Sector::Energy, 0.6, 0.6, 0.05, 0.02),
            obs(Sector::Utilities, 0.4, 0.4, 0.01, 0.01),
        ])
        .unwrap();
        assert_abs_diff_eq!(result.allocation, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.interaction, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.selection, 0.6 * 0.03, epsilon = 1e-12);
    }

    #[test]
    fn test_identical_returns_give_pure_allocation() {
        let result = attribute(&[
            obs(Sector::Energy, 0.7, 0.5, 0.04, 0.04),
            obs(Sector::Utilities, 0.3, 0.5, -0.02, -0.02),
        ])
        .unwrap();
        assert_abs_diff_eq!(result.selection, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.interaction, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            result.allocation,
            0.2 * 0.04 + (-0.2) * (-0.02),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_known_single_sector_effects() {
        let result = attribute(&[obs(Sector::Industrials, 1.0, 1.0, 0.05, 0.03)]).unwrap();
        let row = &result.sectors[0];
        assert_abs_diff_eq!(row.allocation, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(row.selection, 0.02, epsilon = 1e-12);
        assert_abs_diff_eq!(row.interaction, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.active_return, 0.02, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_observations_rejected() {
        assert!(matches!(attribute(&[]), Err(AttributionError::Empty)));
    }

    #[test]
    fn test_duplicate_sector_rejected() {
        let err = attribute(&[
            obs(Sector::Energy, 0.5, 0.5, 0.01, 0.01),
            obs(Sector::Energy, 0.5, 0.5, 0.02, 0.02),
        ])
        .unwrap_err();
        assert!(matches!(err, AttributionError::DuplicateSector(Sector::Energy)));
    }

    #[test]
    fn test_portfolio_weights_must_sum_to_one() {
        let err = attribute(&[
            obs(Sector::Energy, 0.5, 0.6, 0.01, 0.01),
            obs(Sector::Utilities, 0.4, 0.4, 0.02, 0.02),
        ])
        .unwrap_err();
        match err {
            AttributionError::WeightSum { side, sum, .. } => {
                assert_eq!(side, "portfolio");
                assert_abs_diff_eq!(sum, 0.9, epsilon = 1e-12);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
