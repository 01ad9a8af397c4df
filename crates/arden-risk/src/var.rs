//! Value-at-Risk and expected shortfall.
//!
//! Three methodologies share one quantile convention (the lower empirical
//! quantile, see [`crate::stats::empirical_quantile`]) and one horizon
//! scaling (square-root-of-time). Results are reported as positive loss
//! amounts in portfolio currency.

use crate::covariance::{cholesky, sample_covariance, sample_mean};
use crate::error::RiskError;
use crate::stats::{empirical_quantile, inverse_normal_cdf, normal_pdf, tail_mean};
use arden_model::ReturnSeries;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Simulations per deterministic RNG batch.
///
/// Each batch owns an RNG seeded from `seed + batch index`, so the
/// simulated sample is identical no matter how rayon schedules the batches.
const SIMULATION_BATCH: usize = 2_048;

/// VaR estimation methodology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarMethod {
    /// Empirical quantile of observed returns
    Historical,
    /// Normal-distribution closed form
    Parametric,
    /// Correlated Monte Carlo simulation over constituents
    MonteCarlo,
}

impl std::fmt::Display for VarMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Historical => "historical",
            Self::Parametric => "parametric",
            Self::MonteCarlo => "monte_carlo",
        };
        write!(f, "{name}")
    }
}

/// Configuration for a VaR calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarConfig {
    /// Confidence level in (0, 1), e.g. 0.95
    pub confidence: f64,
    /// Horizon in trading days; losses scale with √horizon
    pub horizon_days: u32,
    /// Estimation methodology
    pub method: VarMethod,
    /// Monte Carlo scenario count (ignored by other methods)
    pub simulations: usize,
    /// RNG seed; fixed seed ⇒ bit-for-bit reproducible Monte Carlo output
    pub seed: u64,
    /// Minimum observations for a stable estimate.
    ///
    /// 30 by default — a stability choice, not a numerical constraint, and
    /// deliberately configurable.
    pub min_observations: usize,
}

impl Default for VarConfig {
    fn default() -> Self {
        Self {
            confidence: 0.95,
            horizon_days: 1,
            method: VarMethod::Historical,
            simulations: 10_000,
            seed: 42,
            min_observations: 30,
        }
    }
}

impl VarConfig {
    fn validate(&self) -> Result<(), RiskError> {
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(RiskError::InvalidConfidence(self.confidence));
        }
        if self.horizon_days == 0 {
            return Err(RiskError::InvalidHorizon(self.horizon_days));
        }
        Ok(())
    }

    fn horizon_scale(&self) -> f64 {
        f64::from(self.horizon_days).sqrt()
    }
}

/// Outcome of a VaR calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarReport {
    /// Value-at-Risk as a positive loss in portfolio currency
    pub var: f64,
    /// Expected shortfall (mean tail loss), same units as `var`
    pub cvar: f64,
    /// Methodology used
    pub method: VarMethod,
    /// Confidence level of the estimate
    pub confidence: f64,
    /// Horizon in trading days
    pub horizon_days: u32,
    /// Portfolio value the losses are measured against
    pub portfolio_value: f64,
}

/// Dispatch on `config.method` for methods that work from a portfolio
/// return series.
///
/// Monte Carlo needs constituent-level returns and weights; call
/// [`monte_carlo_var`] for it. Requesting it here is an input error.
pub fn value_at_risk(
    series: &ReturnSeries,
    portfolio_value: f64,
    config: &VarConfig,
) -> Result<VarReport, RiskError> {
    match config.method {
        VarMethod::Historical => historical_var(series, portfolio_value, config),
        VarMethod::Parametric => parametric_var(series, portfolio_value, config),
        VarMethod::MonteCarlo => Err(RiskError::ConstituentsRequired),
    }
}

/// Historical VaR: the (1 − confidence) empirical quantile of observed
/// returns, scaled by √horizon and the portfolio value.
pub fn historical_var(
    series: &ReturnSeries,
    portfolio_value: f64,
    config: &VarConfig,
) -> Result<VarReport, RiskError> {
    config.validate()?;
    require_observations(series.len(), config.min_observations)?;

    let (var_frac, cvar_frac) = empirical_var_cvar(series.values(), config.confidence);
    Ok(build_report(
        var_frac,
        cvar_frac,
        VarMethod::Historical,
        portfolio_value,
        config,
    ))
}

/// Parametric (variance-covariance) VaR under a normal-returns assumption:
/// `z(confidence) · σ · √horizon · value`, with the analytic normal
/// expected shortfall `σ · φ(z) / (1 − confidence)` for CVaR.
pub fn parametric_var(
    series: &ReturnSeries,
    portfolio_value: f64,
    config: &VarConfig,
) -> Result<VarReport, RiskError> {
    config.validate()?;
    require_observations(series.len(), config.min_observations)?;

    let sigma = series.std_dev();
    let z = inverse_normal_cdf(config.confidence);
    let var_frac = z * sigma;
    let cvar_frac = sigma * normal_pdf(z) / (1.0 - config.confidence);

    Ok(build_report(
        -var_frac,
        -cvar_frac,
        VarMethod::Parametric,
        portfolio_value,
        config,
    ))
}

/// Monte Carlo VaR over constituent returns.
///
/// Estimates the sample mean and covariance of the T×N constituent return
/// matrix, factorizes the covariance (Cholesky), draws `simulations`
/// correlated normal scenarios, aggregates them to portfolio returns with
/// the supplied weights, and applies the historical quantile rule to the
/// simulated sample.
///
/// Reproducibility: simulation batches are seeded deterministically from
/// `config.seed`, so two runs with identical inputs produce identical
/// output even with parallel batch execution.
///
/// # Errors
///
/// * [`RiskError::InsufficientData`] — fewer than `min_observations` rows
/// * [`RiskError::WeightDimension`] — weights don't match matrix columns
/// * [`RiskError::Covariance`] — covariance not positive definite
pub fn monte_carlo_var(
    constituent_returns: ArrayView2<'_, f64>,
    weights: ArrayView1<'_, f64>,
    portfolio_value: f64,
    config: &VarConfig,
) -> Result<VarReport, RiskError> {
    config.validate()?;
    require_observations(constituent_returns.nrows(), config.min_observations)?;
    if weights.len() != constituent_returns.ncols() {
        return Err(RiskError::WeightDimension {
            weights: weights.len(),
            columns: constituent_returns.ncols(),
        });
    }

    let means = sample_mean(constituent_returns);
    let cov = sample_covariance(constituent_returns)?;
    let lower = cholesky(&cov)?;

    let n_assets = weights.len();
    let n_batches = config.simulations.div_ceil(SIMULATION_BATCH);

    let simulated: Vec<f64> = (0..n_batches)
        .into_par_iter()
        .flat_map_iter(|batch| {
            let batch_size =
                SIMULATION_BATCH.min(config.simulations - batch * SIMULATION_BATCH);
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(batch as u64));
            let mut draws = Vec::with_capacity(batch_size);
            let mut shocks = Array1::<f64>::zeros(n_assets);
            for _ in 0..batch_size {
                for z in shocks.iter_mut() {
                    *z = rng.sample(StandardNormal);
                }
                let scenario = &means + &lower.dot(&shocks);
                draws.push(weights.dot(&scenario));
            }
            draws
        })
        .collect();

    let (var_frac, cvar_frac) = empirical_var_cvar(&simulated, config.confidence);
    Ok(build_report(
        var_frac,
        cvar_frac,
        VarMethod::MonteCarlo,
        portfolio_value,
        config,
    ))
}

/// Quantile and tail mean of a return sample, as (negative) fractions.
fn empirical_var_cvar(returns: &[f64], confidence: f64) -> (f64, f64) {
    let quantile = empirical_quantile(returns, 1.0 - confidence);
    let tail = tail_mean(returns, quantile);
    (quantile, tail)
}

fn build_report(
    var_frac: f64,
    cvar_frac: f64,
    method: VarMethod,
    portfolio_value: f64,
    config: &VarConfig,
) -> VarReport {
    let scale = config.horizon_scale() * portfolio_value;
    VarReport {
        var: (var_frac * scale).abs(),
        cvar: (cvar_frac * scale).abs(),
        method,
        confidence: config.confidence,
        horizon_days: config.horizon_days,
        portfolio_value,
    }
}

fn require_observations(actual: usize, required: usize) -> Result<(), RiskError> {
    if actual < required {
        Err(RiskError::InsufficientData { required, actual })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::NaiveDate;
    use ndarray::{Array2, array};

    fn series_from(values: &[f64]) -> ReturnSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let observations = values
            .iter()
            .enumerate()
            .map(|(i, &v)| (start + chrono::Duration::days(i as i64), v))
            .collect();
        ReturnSeries::new("test", observations).unwrap()
    }

    /// Deterministic synthetic normals via a seeded RNG.
    fn normal_sample(n: usize, mean: f64, sigma: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let z: f64 = rng.sample(StandardNormal);
                mean + sigma * z
            })
            .collect()
    }

    #[test]
    fn test_historical_var_fails_below_min_observations() {
        let series = series_from(&vec![0.01; 29]);
        let err = historical_var(&series, 1_000_000.0, &VarConfig::default()).unwrap_err();
        match err {
            RiskError::InsufficientData { required, actual } => {
                assert_eq!(required, 30);
                assert_eq!(actual, 29);
            }
            other => panic!("expected InsufficientData, got {other}"),
        }
    }

    #[test]
    fn test_min_observations_is_configurable() {
        let series = series_from(&vec![0.01; 29]);
        let config = VarConfig {
            min_observations: 10,
            ..VarConfig::default()
        };
        assert!(historical_var(&series, 1_000_000.0, &config).is_ok());
    }

    #[test]
    fn test_parametric_var_matches_closed_form() {
        // Zero-mean sample, sigma exactly computable.
        let values: Vec<f64> = (0..100)
            .map(|i| if i % 2 == 0 { 0.01 } else { -0.01 })
            .collect();
        let series = series_from(&values);
        let sigma = series.std_dev();

        let config = VarConfig {
            confidence: 0.975,
            method: VarMethod::Parametric,
            ..VarConfig::default()
        };
        let report = value_at_risk(&series, 1_000_000.0, &config).unwrap();

        let z = inverse_normal_cdf(0.975);
        assert_relative_eq!(report.var, z * sigma * 1_000_000.0, epsilon = 1e-6);
        // Expected shortfall always exceeds VaR.
        assert!(report.cvar > report.var);
    }

    #[test]
    fn test_horizon_scaling_is_sqrt_time() {
        let values = normal_sample(500, 0.0, 0.01, 7);
        let series = series_from(&values);

        let one_day = VarConfig::default();
        let ten_day = VarConfig {
            horizon_days: 10,
            ..VarConfig::default()
        };

        let var_1 = historical_var(&series, 1_000_000.0, &one_day).unwrap().var;
        let var_10 = historical_var(&series, 1_000_000.0, &ten_day).unwrap().var;
        assert_relative_eq!(var_10, var_1 * 10.0_f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_cvar_not_less_than_var() {
        let values = normal_sample(1_000, 0.0002, 0.012, 99);
        let series = series_from(&values);
        let report = historical_var(&series, 2_500_000.0, &VarConfig::default()).unwrap();
        assert!(report.cvar >= report.var);
        assert!(report.var > 0.0);
    }

    #[test]
    fn test_historical_converges_to_parametric_on_normal_data() {
        // Statistical round trip: on large i.i.d. normal samples the
        // empirical quantile approaches the normal closed form.
        let sigma = 0.01;
        let values = normal_sample(200_000, 0.0, sigma, 12345);
        let series = series_from(&values);

        let config = VarConfig {
            confidence: 0.95,
            ..VarConfig::default()
        };
        let historical = historical_var(&series, 1.0, &config).unwrap().var;
        let parametric = inverse_normal_cdf(0.95) * series.std_dev();

        assert_relative_eq!(historical, parametric, max_relative = 0.03);
    }

    #[test]
    fn test_monte_carlo_reproducible_with_fixed_seed() {
        let returns = build_two_asset_matrix();
        let weights = array![0.6, 0.4];
        let config = VarConfig {
            method: VarMethod::MonteCarlo,
            simulations: 5_000,
            seed: 31,
            ..VarConfig::default()
        };

        let a = monte_carlo_var(returns.view(), weights.view(), 1_000_000.0, &config).unwrap();
        let b = monte_carlo_var(returns.view(), weights.view(), 1_000_000.0, &config).unwrap();

        // Bit-for-bit, not approximately.
        assert_eq!(a.var.to_bits(), b.var.to_bits());
        assert_eq!(a.cvar.to_bits(), b.cvar.to_bits());
    }

    #[test]
    fn test_monte_carlo_seed_changes_output() {
        let returns = build_two_asset_matrix();
        let weights = array![0.6, 0.4];
        let base = VarConfig {
            method: VarMethod::MonteCarlo,
            simulations: 5_000,
            ..VarConfig::default()
        };
        let other = VarConfig { seed: base.seed + 1, ..base };

        let a = monte_carlo_var(returns.view(), weights.view(), 1_000_000.0, &base).unwrap();
        let b = monte_carlo_var(returns.view(), weights.view(), 1_000_000.0, &other).unwrap();
        assert_ne!(a.var.to_bits(), b.var.to_bits());
    }

    #[test]
    fn test_monte_carlo_weight_dimension_checked() {
        let returns = build_two_asset_matrix();
        let weights = array![1.0];
        let config = VarConfig {
            method: VarMethod::MonteCarlo,
            ..VarConfig::default()
        };
        assert!(matches!(
            monte_carlo_var(returns.view(), weights.view(), 1.0, &config),
            Err(RiskError::WeightDimension { .. })
        ));
    }

    #[test]
    fn test_value_at_risk_rejects_monte_carlo_without_constituents() {
        let series = series_from(&vec![0.01; 60]);
        let config = VarConfig {
            method: VarMethod::MonteCarlo,
            ..VarConfig::default()
        };
        assert!(matches!(
            value_at_risk(&series, 1.0, &config),
            Err(RiskError::ConstituentsRequired)
        ));
    }

    #[test]
    fn test_invalid_confidence_rejected() {
        let series = series_from(&vec![0.01; 60]);
        let config = VarConfig {
            confidence: 1.0,
            ..VarConfig::default()
        };
        assert!(matches!(
            historical_var(&series, 1.0, &config),
            Err(RiskError::InvalidConfidence(_))
        ));
    }

    fn build_two_asset_matrix() -> Array2<f64> {
        let a = normal_sample(250, 0.0003, 0.012, 1);
        let b = normal_sample(250, 0.0001, 0.009, 2);
        let mut matrix = Array2::<f64>::zeros((250, 2));
        for i in 0..250 {
            matrix[[i, 0]] = a[i];
            // Correlate the second asset with the first.
            matrix[[i, 1]] = 0.5 * a[i] + 0.5 * b[i];
        }
        matrix
    }
}
