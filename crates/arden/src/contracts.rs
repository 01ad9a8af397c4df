//! Request and response types of the analytics contract.
//!
//! Requests are plain serde structs so the same shapes serve the CLI and
//! any transport a caller puts in front of the service. Responses reuse
//! the engine result types where those already match the contract
//! (`VarReport`, `StressTestResult`, `RiskMetrics`, `RebalanceResult`).

use arden_attribution::{AttributionResult, LinkedAttribution, SectorAttribution, SectorObservation};
use arden_model::Sector;
use arden_optimize::FrontierPoint;
use arden_risk::VarMethod;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value-at-Risk request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarRequest {
    /// Portfolio to analyze
    pub portfolio_id: String,
    /// History window start (inclusive)
    pub start_date: NaiveDate,
    /// History window end (inclusive)
    pub end_date: NaiveDate,
    /// Confidence level in (0, 1)
    pub confidence: f64,
    /// Horizon in trading days
    pub horizon_days: u32,
    /// Estimation methodology
    pub method: VarMethod,
    /// Monte Carlo scenario count; engine default when absent
    #[serde(default)]
    pub simulations: Option<usize>,
    /// RNG seed for Monte Carlo; engine default when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Stress-test request: a catalog scenario by name, or caller-supplied
/// shocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressRequest {
    /// Portfolio to revalue
    pub portfolio_id: String,
    /// Which scenario to apply
    pub scenario: ScenarioSpec,
}

/// How a stress scenario is specified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScenarioSpec {
    /// A predefined scenario from the catalog
    Named {
        /// Catalog name, matched leniently
        scenario_name: String,
    },
    /// Caller-supplied sector shocks
    Custom {
        /// Label for reporting
        name: String,
        /// Fractional shock per sector, e.g. -0.20
        custom_shocks: HashMap<Sector, f64>,
        /// Shock for sectors (and cash) not in the map
        #[serde(default)]
        default_shock: Option<f64>,
    },
}

/// Attribution request: sector-level weights and returns for one or more
/// periods, benchmark-relative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionRequest {
    /// Portfolio the observations describe
    pub portfolio_id: String,
    /// One inner vector of sector observations per period, in period order
    pub periods: Vec<Vec<SectorObservation>>,
}

/// Attribution response; single-period or Carino-linked multi-period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionResponse {
    /// Number of periods the effects cover
    pub periods: usize,
    /// Portfolio return over the full span
    pub portfolio_return: f64,
    /// Benchmark return over the full span
    pub benchmark_return: f64,
    /// Active return; equals the sum of the three effects
    pub active_return: f64,
    /// Aggregate allocation effect
    pub allocation_effect: f64,
    /// Aggregate selection effect
    pub selection_effect: f64,
    /// Aggregate interaction effect
    pub interaction_effect: f64,
    /// Per-sector decomposition
    pub sector_attribution: Vec<SectorAttribution>,
}

impl From<AttributionResult> for AttributionResponse {
    fn from(result: AttributionResult) -> Self {
        Self {
            periods: 1,
            portfolio_return: result.portfolio_return,
            benchmark_return: result.benchmark_return,
            active_return: result.active_return,
            allocation_effect: result.allocation,
            selection_effect: result.selection,
            interaction_effect: result.interaction,
            sector_attribution: result.sectors,
        }
    }
}

impl From<LinkedAttribution> for AttributionResponse {
    fn from(linked: LinkedAttribution) -> Self {
        Self {
            periods: linked.periods,
            portfolio_return: linked.portfolio_return,
            benchmark_return: linked.benchmark_return,
            active_return: linked.active_return,
            allocation_effect: linked.allocation,
            selection_effect: linked.selection,
            interaction_effect: linked.interaction,
            sector_attribution: linked.sectors,
        }
    }
}

/// What the optimizer should aim for; mirrors `arden_optimize::Objective`
/// with contract-friendly field names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizeObjective {
    /// Maximize return net of a variance penalty
    RiskAversion(f64),
    /// Minimize variance at a fixed expected return
    TargetReturn(f64),
}

/// Optimization request. Expected returns and covariance are estimated
/// from the snapshot constituents' histories over the window and
/// annualized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    /// Portfolio whose holdings define the universe
    pub portfolio_id: String,
    /// History window start (inclusive)
    pub start_date: NaiveDate,
    /// History window end (inclusive)
    pub end_date: NaiveDate,
    /// Objective to optimize
    pub objective: OptimizeObjective,
    /// Per-asset weight floor (default 0)
    #[serde(default)]
    pub min_weight: Option<f64>,
    /// Per-asset weight ceiling (default 1)
    #[serde(default)]
    pub max_weight: Option<f64>,
    /// Maximum combined weight per sector
    #[serde(default)]
    pub sector_caps: HashMap<Sector, f64>,
}

/// Optimization response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResponse {
    /// Universe in weight order
    pub tickers: Vec<String>,
    /// Optimal weights, summing to 1
    pub weights: Vec<f64>,
    /// Annualized expected return of the solution
    pub expected_return: f64,
    /// Annualized volatility of the solution
    pub expected_volatility: f64,
    /// False when the solver's iteration budget ran out first
    pub converged: bool,
}

/// Efficient-frontier request over the same estimated inputs as
/// [`OptimizeRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierRequest {
    /// Portfolio whose holdings define the universe
    pub portfolio_id: String,
    /// History window start (inclusive)
    pub start_date: NaiveDate,
    /// History window end (inclusive)
    pub end_date: NaiveDate,
    /// Number of frontier points, at least 2
    pub n_points: usize,
    /// Per-asset weight floor (default 0)
    #[serde(default)]
    pub min_weight: Option<f64>,
    /// Per-asset weight ceiling (default 1)
    #[serde(default)]
    pub max_weight: Option<f64>,
}

/// Efficient-frontier response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierResponse {
    /// Universe the point weights refer to
    pub tickers: Vec<String>,
    /// Points ordered by target return; non-decreasing in risk and return
    pub points: Vec<FrontierPoint>,
}

/// Rebalance request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceRequest {
    /// Portfolio to rebalance
    pub portfolio_id: String,
    /// Target weights by ticker, summing to 1
    pub target_weights: HashMap<String, f64>,
    /// Weight drifts at or below this band generate no trade
    #[serde(default)]
    pub no_trade_band: Option<f64>,
    /// Commission as a fraction of traded value
    #[serde(default)]
    pub commission_rate: Option<f64>,
    /// Prices for target tickers not currently held
    #[serde(default)]
    pub reference_prices: HashMap<String, f64>,
}

/// Risk/performance metrics request against a benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRequest {
    /// Portfolio to analyze
    pub portfolio_id: String,
    /// Benchmark identifier
    pub benchmark: String,
    /// History window start (inclusive)
    pub start_date: NaiveDate,
    /// History window end (inclusive)
    pub end_date: NaiveDate,
    /// Annual risk-free rate; engine default when absent
    #[serde(default)]
    pub risk_free_rate: Option<f64>,
}
