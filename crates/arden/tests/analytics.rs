//! End-to-end tests of the analytics service over in-memory providers.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use arden::contracts::{
    AttributionRequest, FrontierRequest, MetricsRequest, OptimizeObjective, OptimizeRequest,
    RebalanceRequest, ScenarioSpec, StressRequest, VarRequest,
};
use arden::model::{Instrument, PortfolioSnapshot, Position, PriceSeries, Sector};
use arden::risk::VarMethod;
use arden::attribution::SectorObservation;
use arden::{AnalyticsService, ArdenError, InMemoryMarketData, InMemorySnapshots};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::collections::HashMap;

const DAYS: usize = 260;

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
}

fn end_date() -> NaiveDate {
    start_date() + Duration::days(DAYS as i64)
}

/// Deterministic geometric walk.
fn walk(ticker: &str, seed: u64, drift: f64, vol: f64) -> PriceSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = 100.0;
    let observations = (0..DAYS)
        .map(|day| {
            let shock: f64 = rng.sample(StandardNormal);
            price *= 1.0 + drift + vol * shock;
            (start_date() + Duration::days(day as i64), price)
        })
        .collect();
    PriceSeries::new(ticker, observations).unwrap()
}

fn service() -> AnalyticsService<InMemoryMarketData, InMemorySnapshots> {
    let mut market_data = InMemoryMarketData::new();
    market_data.insert_instrument(walk("AAPL", 1, 0.0008, 0.012));
    market_data.insert_instrument(walk("JPM", 2, 0.0004, 0.009));
    market_data.insert_benchmark(walk("SPX", 3, 0.0005, 0.008));

    let mut snapshots = InMemorySnapshots::new();
    snapshots.insert(
        PortfolioSnapshot::new(
            "growth",
            end_date(),
            vec![
                Position::new(
                    Instrument::equity("AAPL".to_string(), Sector::InformationTechnology),
                    50.0,
                    90.0,
                    100.0,
                ),
                Position::new(
                    Instrument::equity("JPM".to_string(), Sector::Financials),
                    25.0,
                    150.0,
                    200.0,
                ),
            ],
        )
        .unwrap(),
    );

    AnalyticsService::new(market_data, snapshots)
}

fn var_request(method: VarMethod) -> VarRequest {
    VarRequest {
        portfolio_id: "growth".to_string(),
        start_date: start_date(),
        end_date: end_date(),
        confidence: 0.95,
        horizon_days: 1,
        method,
        simulations: Some(20_000),
        seed: None,
    }
}

#[test]
fn test_historical_var_end_to_end() {
    let report = service().var(&var_request(VarMethod::Historical)).unwrap();
    assert!(report.var > 0.0);
    assert!(report.cvar >= report.var);
    assert_abs_diff_eq!(report.portfolio_value, 10_000.0);
}

#[test]
fn test_parametric_var_scales_with_horizon() {
    let svc = service();
    let one_day = svc.var(&var_request(VarMethod::Parametric)).unwrap();
    let mut request = var_request(VarMethod::Parametric);
    request.horizon_days = 4;
    let four_day = svc.var(&request).unwrap();
    assert_relative_eq!(four_day.var, one_day.var * 2.0, max_relative = 1e-9);
}

#[test]
fn test_monte_carlo_var_is_bit_for_bit_reproducible() {
    let svc = service();
    let first = svc.var(&var_request(VarMethod::MonteCarlo)).unwrap();
    let second = svc.var(&var_request(VarMethod::MonteCarlo)).unwrap();
    assert_eq!(first.var.to_bits(), second.var.to_bits());
    assert_eq!(first.cvar.to_bits(), second.cvar.to_bits());
}

#[test]
fn test_var_with_short_history_fails() {
    let mut request = var_request(VarMethod::Historical);
    request.start_date = end_date() - Duration::days(20);
    let err = service().var(&request).unwrap_err();
    assert!(matches!(
        err,
        ArdenError::Risk(arden::risk::RiskError::InsufficientData { .. })
    ));
}

#[test]
fn test_stress_half_portfolio_shock() {
    // 50/50 book, tech shocked -20%, everything else defaulted to 0%.
    let request = StressRequest {
        portfolio_id: "growth".to_string(),
        scenario: ScenarioSpec::Custom {
            name: "tech shock".to_string(),
            custom_shocks: HashMap::from([(Sector::InformationTechnology, -0.20)]),
            default_shock: Some(0.0),
        },
    };
    let result = service().stress_test(&request).unwrap();
    assert_abs_diff_eq!(result.pnl_percentage, -10.0, epsilon = 1e-9);
}

#[test]
fn test_stress_catalog_lookup() {
    let request = StressRequest {
        portfolio_id: "growth".to_string(),
        scenario: ScenarioSpec::Named {
            scenario_name: "2008_financial_crisis".to_string(),
        },
    };
    let result = service().stress_test(&request).unwrap();
    assert!(result.pnl < 0.0);

    let unknown = StressRequest {
        portfolio_id: "growth".to_string(),
        scenario: ScenarioSpec::Named {
            scenario_name: "flash_crash_2010".to_string(),
        },
    };
    let err = service().stress_test(&unknown).unwrap_err();
    assert!(matches!(err, ArdenError::UnknownScenario(_)));
}

fn period(tech_return: f64, fin_return: f64) -> Vec<SectorObservation> {
    vec![
        SectorObservation {
            sector: Sector::InformationTechnology,
            portfolio_weight: 0.6,
            benchmark_weight: 0.5,
            portfolio_return: tech_return,
            benchmark_return: tech_return - 0.01,
        },
        SectorObservation {
            sector: Sector::Financials,
            portfolio_weight: 0.4,
            benchmark_weight: 0.5,
            portfolio_return: fin_return,
            benchmark_return: fin_return + 0.005,
        },
    ]
}

#[test]
fn test_attribution_effects_recover_active_return() {
    let response = service()
        .attribution(&AttributionRequest {
            portfolio_id: "growth".to_string(),
            periods: vec![period(0.08, 0.02)],
        })
        .unwrap();

    let effect_sum =
        response.allocation_effect + response.selection_effect + response.interaction_effect;
    assert_abs_diff_eq!(effect_sum, response.active_return, epsilon = 1e-6);
    assert_abs_diff_eq!(
        response.active_return,
        response.portfolio_return - response.benchmark_return,
        epsilon = 1e-12
    );
}

#[test]
fn test_multi_period_attribution_links_geometrically() {
    let response = service()
        .attribution(&AttributionRequest {
            portfolio_id: "growth".to_string(),
            periods: vec![period(0.08, 0.02), period(-0.03, 0.01)],
        })
        .unwrap();

    assert_eq!(response.periods, 2);
    let effect_sum =
        response.allocation_effect + response.selection_effect + response.interaction_effect;
    assert_abs_diff_eq!(effect_sum, response.active_return, epsilon = 1e-6);
}

#[test]
fn test_optimize_weights_satisfy_budget_and_bounds() {
    let response = service()
        .optimize(&OptimizeRequest {
            portfolio_id: "growth".to_string(),
            start_date: start_date(),
            end_date: end_date(),
            objective: OptimizeObjective::RiskAversion(4.0),
            min_weight: Some(0.1),
            max_weight: Some(0.9),
            sector_caps: HashMap::new(),
        })
        .unwrap();

    assert_eq!(response.tickers, vec!["AAPL", "JPM"]);
    assert_abs_diff_eq!(response.weights.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    for &w in &response.weights {
        assert!((0.1 - 1e-9..=0.9 + 1e-9).contains(&w));
    }
    assert!(response.expected_volatility > 0.0);
}

#[test]
fn test_frontier_is_monotone() {
    let response = service()
        .frontier(&FrontierRequest {
            portfolio_id: "growth".to_string(),
            start_date: start_date(),
            end_date: end_date(),
            n_points: 6,
            min_weight: None,
            max_weight: None,
        })
        .unwrap();

    assert_eq!(response.points.len(), 6);
    for pair in response.points.windows(2) {
        assert!(pair[1].expected_return >= pair[0].expected_return - 1e-6);
        assert!(pair[1].risk >= pair[0].risk - 1e-6);
    }
}

#[test]
fn test_rebalance_lands_within_the_band() {
    let request = RebalanceRequest {
        portfolio_id: "growth".to_string(),
        target_weights: HashMap::from([("AAPL".to_string(), 0.4), ("JPM".to_string(), 0.6)]),
        no_trade_band: None,
        commission_rate: None,
        reference_prices: HashMap::new(),
    };
    let result = service().rebalance(&request).unwrap();

    assert_eq!(result.trades.len(), 2);
    for trade in &result.trades {
        let new_weight = (trade.current_weight * result.portfolio_value + trade.value)
            / result.portfolio_value;
        assert!((new_weight - trade.target_weight).abs() <= 0.001);
    }
    assert!(result.estimated_commission > 0.0);
}

#[test]
fn test_metrics_core_bounds() {
    let metrics = service()
        .metrics(&MetricsRequest {
            portfolio_id: "growth".to_string(),
            benchmark: "SPX".to_string(),
            start_date: start_date(),
            end_date: end_date(),
            risk_free_rate: None,
        })
        .unwrap();

    assert!(metrics.volatility >= 0.0);
    assert!(metrics.max_drawdown <= 0.0);
    assert!(metrics.tracking_error >= 0.0);
}

#[test]
fn test_unknown_portfolio_is_a_provider_error() {
    let err = service()
        .var(&VarRequest {
            portfolio_id: "income".to_string(),
            ..var_request(VarMethod::Historical)
        })
        .unwrap_err();
    assert!(matches!(err, ArdenError::Provider(_)));
}
