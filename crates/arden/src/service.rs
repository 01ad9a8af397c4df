//! Stateless orchestration of the engines over pluggable data providers.

use crate::contracts::{
    AttributionRequest, AttributionResponse, FrontierRequest, FrontierResponse, MetricsRequest,
    OptimizeObjective, OptimizeRequest, OptimizeResponse, RebalanceRequest, ScenarioSpec,
    StressRequest, VarRequest,
};
use crate::error::ArdenError;
use crate::provider::{MarketDataProvider, SnapshotProvider};
use arden_attribution::{attribute, link_periods};
use arden_model::{
    Frequency, PortfolioSnapshot, PriceSeries, ReturnSeriesBuilder, SeriesError,
};
use arden_optimize::{
    Constraints, Objective, RebalanceConfig, RebalanceResult, SectorCap, efficient_frontier,
    mean_variance_optimize, rebalance,
};
use arden_risk::{
    MetricsConfig, RiskMetrics, VarConfig, VarMethod, VarReport, monte_carlo_var, risk_metrics,
    sample_covariance, sample_mean, value_at_risk,
};
use arden_stress::{StressScenario, StressTestResult, apply_scenario};
use ndarray::Array2;
use std::collections::{BTreeSet, HashMap};

/// The analytics facade: one method per operation of the contract.
///
/// The service holds no mutable state; every call receives all of its data
/// through the providers, so concurrent calls for different portfolios
/// need no locking.
#[derive(Debug)]
pub struct AnalyticsService<M, S> {
    market_data: M,
    snapshots: S,
    builder: ReturnSeriesBuilder,
}

impl<M: MarketDataProvider, S: SnapshotProvider> AnalyticsService<M, S> {
    /// Wire the service to its data providers; analysis runs on daily
    /// returns.
    pub const fn new(market_data: M, snapshots: S) -> Self {
        Self {
            market_data,
            snapshots,
            builder: ReturnSeriesBuilder::daily(),
        }
    }

    /// Value-at-Risk and expected shortfall for a portfolio.
    ///
    /// Historical and parametric methods work from the aggregated
    /// portfolio return series; Monte Carlo needs the constituent return
    /// matrix and snapshot weights.
    ///
    /// # Errors
    ///
    /// Provider lookups, series construction, and the risk engine's own
    /// validation can all fail; see [`ArdenError`].
    pub fn var(&self, request: &VarRequest) -> Result<VarReport, ArdenError> {
        tracing::info!(
            portfolio = %request.portfolio_id,
            method = %request.method,
            confidence = request.confidence,
            "computing value at risk"
        );
        let snapshot = self.snapshots.snapshot(&request.portfolio_id)?;
        let histories = self.histories(&snapshot, request)?;

        let mut config = VarConfig {
            confidence: request.confidence,
            horizon_days: request.horizon_days,
            method: request.method,
            ..VarConfig::default()
        };
        if let Some(simulations) = request.simulations {
            config.simulations = simulations;
        }
        if let Some(seed) = request.seed {
            config.seed = seed;
        }

        let report = match request.method {
            VarMethod::MonteCarlo => {
                let matrix = constituent_returns(&snapshot, &histories)?;
                monte_carlo_var(
                    matrix.view(),
                    snapshot.weights().view(),
                    snapshot.total_value(),
                    &config,
                )?
            }
            VarMethod::Historical | VarMethod::Parametric => {
                let series = self.builder.portfolio_returns(&snapshot, &histories)?;
                value_at_risk(&series, snapshot.total_value(), &config)?
            }
        };
        tracing::debug!(var = report.var, cvar = report.cvar, "value at risk done");
        Ok(report)
    }

    /// One-step scenario revaluation of a portfolio.
    ///
    /// # Errors
    ///
    /// [`ArdenError::UnknownScenario`] for a name missing from the
    /// catalog, plus the stress engine's own errors.
    pub fn stress_test(&self, request: &StressRequest) -> Result<StressTestResult, ArdenError> {
        let snapshot = self.snapshots.snapshot(&request.portfolio_id)?;
        let scenario = match &request.scenario {
            ScenarioSpec::Named { scenario_name } => StressScenario::by_name(scenario_name)
                .ok_or_else(|| ArdenError::UnknownScenario(scenario_name.clone()))?,
            ScenarioSpec::Custom {
                name,
                custom_shocks,
                default_shock,
            } => StressScenario::custom(name.clone(), custom_shocks.clone(), *default_shock),
        };
        tracing::info!(
            portfolio = %request.portfolio_id,
            scenario = %scenario.name,
            "applying stress scenario"
        );
        Ok(apply_scenario(&snapshot, &scenario)?)
    }

    /// Brinson-Fachler attribution, Carino-linked when the request spans
    /// several periods.
    ///
    /// # Errors
    ///
    /// The attribution engine's validation errors.
    pub fn attribution(
        &self,
        request: &AttributionRequest,
    ) -> Result<AttributionResponse, ArdenError> {
        tracing::info!(
            portfolio = %request.portfolio_id,
            periods = request.periods.len(),
            "running attribution"
        );
        let results = request
            .periods
            .iter()
            .map(|period| attribute(period))
            .collect::<Result<Vec<_>, _>>()?;

        match results.as_slice() {
            [single] => Ok(single.clone().into()),
            _ => Ok(link_periods(&results)?.into()),
        }
    }

    /// Mean-variance optimal weights for the snapshot's universe.
    ///
    /// Expected returns and covariance are estimated from daily history
    /// over the request window and annualized at 252 trading days.
    ///
    /// # Errors
    ///
    /// Provider and series errors, plus the optimizer's own validation.
    pub fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResponse, ArdenError> {
        tracing::info!(portfolio = %request.portfolio_id, "optimizing weights");
        let snapshot = self.snapshots.snapshot(&request.portfolio_id)?;
        let histories = self.window_histories(
            &snapshot,
            request.start_date,
            request.end_date,
        )?;
        let (mu, cov) = annualized_inputs(&snapshot, &histories)?;
        let constraints = build_constraints(
            &snapshot,
            request.min_weight,
            request.max_weight,
            &request.sector_caps,
        );
        let objective = match request.objective {
            OptimizeObjective::RiskAversion(gamma) => Objective::RiskAversion(gamma),
            OptimizeObjective::TargetReturn(target) => Objective::TargetReturn(target),
        };

        let result = mean_variance_optimize(mu.view(), cov.view(), &constraints, objective)?;
        Ok(OptimizeResponse {
            tickers: snapshot.tickers().iter().map(ToString::to_string).collect(),
            weights: result.weights,
            expected_return: result.expected_return,
            expected_volatility: result.expected_volatility,
            converged: result.converged,
        })
    }

    /// Efficient frontier over the snapshot's universe.
    ///
    /// # Errors
    ///
    /// Provider and series errors, plus the optimizer's own validation.
    pub fn frontier(&self, request: &FrontierRequest) -> Result<FrontierResponse, ArdenError> {
        tracing::info!(
            portfolio = %request.portfolio_id,
            points = request.n_points,
            "tracing efficient frontier"
        );
        let snapshot = self.snapshots.snapshot(&request.portfolio_id)?;
        let histories = self.window_histories(
            &snapshot,
            request.start_date,
            request.end_date,
        )?;
        let (mu, cov) = annualized_inputs(&snapshot, &histories)?;
        let constraints = build_constraints(
            &snapshot,
            request.min_weight,
            request.max_weight,
            &HashMap::new(),
        );

        let points = efficient_frontier(mu.view(), cov.view(), &constraints, request.n_points)?;
        Ok(FrontierResponse {
            tickers: snapshot.tickers().iter().map(ToString::to_string).collect(),
            points,
        })
    }

    /// Signed trades moving a portfolio to target weights.
    ///
    /// # Errors
    ///
    /// Provider lookups plus the rebalancer's validation.
    pub fn rebalance(&self, request: &RebalanceRequest) -> Result<RebalanceResult, ArdenError> {
        tracing::info!(portfolio = %request.portfolio_id, "rebalancing");
        let snapshot = self.snapshots.snapshot(&request.portfolio_id)?;
        let mut config = RebalanceConfig {
            reference_prices: request.reference_prices.clone(),
            ..RebalanceConfig::default()
        };
        if let Some(band) = request.no_trade_band {
            config.no_trade_band = band;
        }
        if let Some(rate) = request.commission_rate {
            config.commission_rate = rate;
        }
        Ok(rebalance(&snapshot, &request.target_weights, &config)?)
    }

    /// Annualized risk and performance metrics versus a benchmark.
    ///
    /// # Errors
    ///
    /// Provider lookups, series alignment, and the metrics engine's
    /// validation.
    pub fn metrics(&self, request: &MetricsRequest) -> Result<RiskMetrics, ArdenError> {
        tracing::info!(
            portfolio = %request.portfolio_id,
            benchmark = %request.benchmark,
            "computing risk metrics"
        );
        let snapshot = self.snapshots.snapshot(&request.portfolio_id)?;
        let histories = self.window_histories(
            &snapshot,
            request.start_date,
            request.end_date,
        )?;
        let portfolio = self.builder.portfolio_returns(&snapshot, &histories)?;
        let benchmark_prices = self.market_data.benchmark_history(
            &request.benchmark,
            request.start_date,
            request.end_date,
        )?;
        let benchmark = self.builder.instrument_returns(&benchmark_prices)?;
        let (portfolio, benchmark, report) = ReturnSeriesBuilder::aligned_pair(&portfolio, &benchmark)?;
        if report.truncated {
            tracing::debug!(
                dropped_leading = report.dropped_leading,
                dropped_trailing = report.dropped_trailing,
                "benchmark window truncated the portfolio series"
            );
        }

        let mut config = MetricsConfig {
            frequency: Frequency::Daily,
            ..MetricsConfig::default()
        };
        if let Some(rate) = request.risk_free_rate {
            config.risk_free_rate = rate;
        }
        Ok(risk_metrics(&portfolio, &benchmark, &config)?)
    }

    fn histories(
        &self,
        snapshot: &PortfolioSnapshot,
        request: &VarRequest,
    ) -> Result<HashMap<String, PriceSeries>, ArdenError> {
        self.window_histories(snapshot, request.start_date, request.end_date)
    }

    fn window_histories(
        &self,
        snapshot: &PortfolioSnapshot,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    ) -> Result<HashMap<String, PriceSeries>, ArdenError> {
        let mut histories = HashMap::with_capacity(snapshot.positions().len());
        for position in snapshot.positions() {
            let series = self.market_data.price_history(position.ticker(), start, end)?;
            histories.insert(position.ticker().to_string(), series);
        }
        Ok(histories)
    }
}

/// Constituent daily returns as a T-1 × N matrix over the union date grid,
/// column order matching the snapshot's positions.
fn constituent_returns(
    snapshot: &PortfolioSnapshot,
    histories: &HashMap<String, PriceSeries>,
) -> Result<Array2<f64>, ArdenError> {
    let mut grid = BTreeSet::new();
    for position in snapshot.positions() {
        let history = histories
            .get(position.ticker())
            .ok_or_else(|| SeriesError::MissingHistory(position.ticker().to_string()))?;
        grid.extend(history.dates().iter().copied());
    }
    let grid: Vec<_> = grid.into_iter().collect();
    if grid.len() < 2 {
        return Err(SeriesError::Empty(snapshot.portfolio().to_string()).into());
    }

    let n = snapshot.positions().len();
    let mut matrix = Array2::zeros((grid.len() - 1, n));
    for (column, position) in snapshot.positions().iter().enumerate() {
        let history = &histories[position.ticker()];
        let mut previous: Option<f64> = None;
        for (row, &date) in grid.iter().enumerate() {
            let close = history.close_on(date).ok_or_else(|| SeriesError::DataGap {
                ticker: position.ticker().to_string(),
                date,
            })?;
            if let Some(prev) = previous {
                matrix[[row - 1, column]] = close / prev - 1.0;
            }
            previous = Some(close);
        }
    }
    Ok(matrix)
}

/// Annualized expected returns and covariance from daily constituent
/// returns (252 trading days).
fn annualized_inputs(
    snapshot: &PortfolioSnapshot,
    histories: &HashMap<String, PriceSeries>,
) -> Result<(ndarray::Array1<f64>, Array2<f64>), ArdenError> {
    let matrix = constituent_returns(snapshot, histories)?;
    let periods = Frequency::Daily.periods_per_year();
    let mu = sample_mean(matrix.view()) * periods;
    let cov = sample_covariance(matrix.view()).map_err(arden_risk::RiskError::from)? * periods;
    Ok((mu, cov))
}

fn build_constraints(
    snapshot: &PortfolioSnapshot,
    min_weight: Option<f64>,
    max_weight: Option<f64>,
    sector_caps: &HashMap<arden_model::Sector, f64>,
) -> Constraints {
    let n = snapshot.positions().len();
    let mut constraints = Constraints::with_bounds(
        vec![min_weight.unwrap_or(0.0); n],
        vec![max_weight.unwrap_or(1.0); n],
    );
    for (&sector, &cap) in sector_caps {
        let members: Vec<usize> = snapshot
            .positions()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.instrument.sector == Some(sector))
            .map(|(i, _)| i)
            .collect();
        if !members.is_empty() {
            constraints.sector_caps.push(SectorCap {
                sector,
                members,
                cap,
            });
        }
    }
    constraints
}
