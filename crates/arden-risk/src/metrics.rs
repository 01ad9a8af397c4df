//! Portfolio risk and performance metrics versus a benchmark.

use crate::error::RiskError;
use arden_model::{Frequency, ReturnSeries};
use serde::{Deserialize, Serialize};

/// Configuration for metric computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Sampling frequency of the input series; fixes the annualization
    /// factor (252 trading days for daily data)
    pub frequency: Frequency,
    /// Annual risk-free rate used by Sharpe and Sortino (default 4%)
    pub risk_free_rate: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            frequency: Frequency::Daily,
            risk_free_rate: 0.04,
        }
    }
}

/// Annualized risk and performance statistics.
///
/// Ratios with a zero-variance denominator (beta, Sharpe, information
/// ratio, ...) are reported as `f64::NAN` sentinels: "undefined for this
/// input" is a different outcome than a computation error and must not
/// fail the whole response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Annualized volatility (σ · √periods-per-year)
    pub volatility: f64,
    /// Annualized geometric return
    pub annualized_return: f64,
    /// Covariance(portfolio, benchmark) / variance(benchmark)
    pub beta: f64,
    /// Annualized portfolio return − beta × annualized benchmark return
    pub alpha: f64,
    /// (Annualized return − risk-free) / volatility
    pub sharpe_ratio: f64,
    /// (Annualized return − risk-free) / downside deviation
    pub sortino_ratio: f64,
    /// Annualized σ of (portfolio − benchmark) returns
    pub tracking_error: f64,
    /// Active return / tracking error
    pub information_ratio: f64,
    /// Largest peak-to-trough decline of the cumulative curve, ≤ 0
    pub max_drawdown: f64,
}

/// Compute the full metric set for an aligned portfolio/benchmark pair.
///
/// # Errors
///
/// [`RiskError::MisalignedSeries`] when the two series do not share an
/// identical date index — align them first, alignment is never implicit.
pub fn risk_metrics(
    portfolio: &ReturnSeries,
    benchmark: &ReturnSeries,
    config: &MetricsConfig,
) -> Result<RiskMetrics, RiskError> {
    if portfolio.len() != benchmark.len() || portfolio.dates() != benchmark.dates() {
        return Err(RiskError::MisalignedSeries {
            left: portfolio.entity().to_string(),
            left_len: portfolio.len(),
            right: benchmark.entity().to_string(),
            right_len: benchmark.len(),
        });
    }

    let ppy = config.frequency.periods_per_year();
    let n = portfolio.len() as f64;

    let volatility = portfolio.std_dev() * ppy.sqrt();
    let annualized_return = annualize(portfolio.cumulative_return(), n, ppy);
    let benchmark_annualized = annualize(benchmark.cumulative_return(), n, ppy);

    let benchmark_variance = benchmark.variance();
    let beta = if benchmark_variance > 0.0 {
        covariance(portfolio.values(), benchmark.values()) / benchmark_variance
    } else {
        f64::NAN
    };
    let alpha = annualized_return - beta * benchmark_annualized;

    let excess = annualized_return - config.risk_free_rate;
    let sharpe_ratio = if volatility > 0.0 { excess / volatility } else { f64::NAN };

    let downside = downside_deviation(portfolio.values()) * ppy.sqrt();
    let sortino_ratio = if downside > 0.0 { excess / downside } else { f64::NAN };

    let active: Vec<f64> = portfolio
        .values()
        .iter()
        .zip(benchmark.values())
        .map(|(p, b)| p - b)
        .collect();
    let tracking_error = std_dev(&active) * ppy.sqrt();
    let information_ratio = if tracking_error > 0.0 {
        (annualized_return - benchmark_annualized) / tracking_error
    } else {
        f64::NAN
    };

    Ok(RiskMetrics {
        volatility,
        annualized_return,
        beta,
        alpha,
        sharpe_ratio,
        sortino_ratio,
        tracking_error,
        information_ratio,
        max_drawdown: max_drawdown(portfolio.values()),
    })
}

/// Largest peak-to-trough decline of the cumulative return curve.
///
/// Single O(n) pass tracking the running peak; result is ≤ 0, with 0 for
/// a monotonically rising curve.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut cumulative = 1.0;
    let mut peak = 1.0;
    let mut worst: f64 = 0.0;

    for r in returns {
        cumulative *= 1.0 + r;
        if cumulative > peak {
            peak = cumulative;
        }
        worst = worst.min(cumulative / peak - 1.0);
    }
    worst
}

/// Geometric annualization: (1 + total)^(ppy/n) − 1.
fn annualize(total_return: f64, n_periods: f64, periods_per_year: f64) -> f64 {
    if n_periods <= 0.0 {
        return f64::NAN;
    }
    (1.0 + total_return).powf(periods_per_year / n_periods) - 1.0
}

/// Sample covariance of two equal-length slices (n − 1 denominator).
fn covariance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len();
    if n < 2 {
        return 0.0;
    }
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / (n - 1) as f64
}

fn std_dev(values: &[f64]) -> f64 {
    covariance(values, values).sqrt()
}

/// Downside deviation relative to a zero minimum acceptable return:
/// √(mean of squared negative returns).
fn downside_deviation(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = returns
        .iter()
        .filter(|&&r| r < 0.0)
        .map(|r| r * r)
        .sum();
    (sum_sq / returns.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::NaiveDate;

    fn series(entity: &str, values: &[f64]) -> ReturnSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let observations = values
            .iter()
            .enumerate()
            .map(|(i, &v)| (start + chrono::Duration::days(i as i64), v))
            .collect();
        ReturnSeries::new(entity, observations).unwrap()
    }

    #[test]
    fn test_max_drawdown_known_path() {
        // Curve: 1.0 -> 1.1 -> 0.88 -> 0.968: worst decline from peak 1.1
        // down to 0.88 = -20%.
        let dd = max_drawdown(&[0.10, -0.20, 0.10]);
        assert_abs_diff_eq!(dd, -0.20, epsilon = 1e-12);
    }

    #[test]
    fn test_max_drawdown_never_positive() {
        assert_abs_diff_eq!(max_drawdown(&[0.01, 0.02, 0.03]), 0.0);
        assert!(max_drawdown(&[-0.01, 0.05, -0.04]) <= 0.0);
    }

    #[test]
    fn test_beta_of_identical_series_is_one() {
        let p = series("p", &[0.01, -0.02, 0.03, 0.00, 0.015, -0.005]);
        let b = series("b", &[0.01, -0.02, 0.03, 0.00, 0.015, -0.005]);
        let metrics = risk_metrics(&p, &b, &MetricsConfig::default()).unwrap();

        assert_relative_eq!(metrics.beta, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.tracking_error, 0.0, epsilon = 1e-12);
        // Zero tracking error makes the information ratio undefined.
        assert!(metrics.information_ratio.is_nan());
    }

    #[test]
    fn test_beta_scales_with_leverage() {
        let b = series("b", &[0.01, -0.02, 0.03, 0.00, 0.015, -0.005]);
        let doubled: Vec<f64> = b.values().iter().map(|r| 2.0 * r).collect();
        let p = series("p", &doubled);

        let metrics = risk_metrics(&p, &b, &MetricsConfig::default()).unwrap();
        assert_relative_eq!(metrics.beta, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_variance_benchmark_gives_nan_beta() {
        let p = series("p", &[0.01, -0.02, 0.03]);
        let b = series("b", &[0.0, 0.0, 0.0]);
        let metrics = risk_metrics(&p, &b, &MetricsConfig::default()).unwrap();
        assert!(metrics.beta.is_nan());
        assert!(metrics.alpha.is_nan());
    }

    #[test]
    fn test_zero_variance_portfolio_gives_nan_sharpe() {
        let p = series("p", &[0.001, 0.001, 0.001]);
        let b = series("b", &[0.01, -0.02, 0.03]);
        let metrics = risk_metrics(&p, &b, &MetricsConfig::default()).unwrap();
        assert!(metrics.sharpe_ratio.is_nan());
        assert!(metrics.volatility.abs() < 1e-15);
    }

    #[test]
    fn test_misaligned_series_rejected() {
        let p = series("p", &[0.01, -0.02, 0.03]);
        let b = series("b", &[0.01, -0.02]);
        assert!(matches!(
            risk_metrics(&p, &b, &MetricsConfig::default()),
            Err(RiskError::MisalignedSeries { .. })
        ));
    }

    #[test]
    fn test_volatility_annualization() {
        let p = series("p", &[0.01, -0.01, 0.01, -0.01, 0.01, -0.01]);
        let b = series("b", &[0.00, 0.01, 0.00, 0.01, 0.00, 0.01]);
        let metrics = risk_metrics(&p, &b, &MetricsConfig::default()).unwrap();
        assert_relative_eq!(
            metrics.volatility,
            p.std_dev() * 252.0_f64.sqrt(),
            epsilon = 1e-12
        );
        assert!(metrics.volatility >= 0.0);
    }

    #[test]
    fn test_sortino_uses_downside_only() {
        // All-positive returns: downside deviation 0, Sortino undefined.
        let p = series("p", &[0.01, 0.02, 0.01]);
        let b = series("b", &[0.00, 0.01, 0.00]);
        let metrics = risk_metrics(&p, &b, &MetricsConfig::default()).unwrap();
        assert!(metrics.sortino_ratio.is_nan());
    }
}
