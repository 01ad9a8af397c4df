//! Arden CLI binary.
//!
//! Drives the analytics engine from CSV inputs: a holdings file defines the
//! portfolio, a long-format price file supplies histories, and each
//! subcommand maps onto one service operation.

mod data;

use arden::contracts::{
    AttributionRequest, FrontierRequest, MetricsRequest, OptimizeObjective, OptimizeRequest,
    RebalanceRequest, ScenarioSpec, StressRequest, VarRequest,
};
use arden::model::PriceSeries;
use arden::risk::VarMethod;
use arden::stress::StressScenario;
use arden::{AnalyticsService, InMemoryMarketData, InMemorySnapshots};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use data::{load_observations, load_price_series, load_snapshot, load_targets};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "arden")]
#[command(about = "Arden: portfolio risk and performance analytics", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Value-at-Risk and expected shortfall
    Var {
        /// Holdings CSV (ticker,sector,quantity,cost_basis,price)
        #[arg(long)]
        holdings: PathBuf,

        /// Prices CSV (date,ticker,close)
        #[arg(long)]
        prices: PathBuf,

        /// Confidence level
        #[arg(long, default_value = "0.95")]
        confidence: f64,

        /// Horizon in trading days
        #[arg(long, default_value = "1")]
        horizon: u32,

        /// Method: historical, parametric or monte_carlo
        #[arg(long, default_value = "historical")]
        method: String,

        /// Monte Carlo scenario count
        #[arg(long)]
        simulations: Option<usize>,

        /// Monte Carlo RNG seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Apply a stress scenario to the portfolio
    Stress {
        /// Holdings CSV
        #[arg(long)]
        holdings: PathBuf,

        /// Scenario name from the catalog
        #[arg(long)]
        scenario: String,
    },

    /// List the stress scenario catalog
    Scenarios,

    /// Brinson-Fachler attribution from sector observations
    Attribution {
        /// Observations CSV (period,sector,portfolio_weight,benchmark_weight,
        /// portfolio_return,benchmark_return)
        #[arg(long)]
        observations: PathBuf,
    },

    /// Risk and performance metrics versus a benchmark
    Metrics {
        /// Holdings CSV
        #[arg(long)]
        holdings: PathBuf,

        /// Prices CSV; must include the benchmark ticker
        #[arg(long)]
        prices: PathBuf,

        /// Benchmark ticker within the price file
        #[arg(long)]
        benchmark: String,

        /// Annual risk-free rate
        #[arg(long)]
        risk_free_rate: Option<f64>,
    },

    /// Mean-variance optimal weights for the held universe
    Optimize {
        /// Holdings CSV
        #[arg(long)]
        holdings: PathBuf,

        /// Prices CSV
        #[arg(long)]
        prices: PathBuf,

        /// Risk-aversion coefficient
        #[arg(long, conflicts_with = "target_return")]
        risk_aversion: Option<f64>,

        /// Target expected (annualized) return
        #[arg(long)]
        target_return: Option<f64>,

        /// Per-asset weight floor
        #[arg(long)]
        min_weight: Option<f64>,

        /// Per-asset weight ceiling
        #[arg(long)]
        max_weight: Option<f64>,
    },

    /// Trace the efficient frontier
    Frontier {
        /// Holdings CSV
        #[arg(long)]
        holdings: PathBuf,

        /// Prices CSV
        #[arg(long)]
        prices: PathBuf,

        /// Number of frontier points
        #[arg(long, default_value = "10")]
        points: usize,
    },

    /// Trades moving the portfolio to target weights
    Rebalance {
        /// Holdings CSV
        #[arg(long)]
        holdings: PathBuf,

        /// Targets CSV (ticker,weight[,price])
        #[arg(long)]
        targets: PathBuf,

        /// No-trade band in weight terms
        #[arg(long)]
        band: Option<f64>,

        /// Commission rate as a fraction of traded value
        #[arg(long)]
        commission: Option<f64>,
    },
}

const PORTFOLIO_ID: &str = "portfolio";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn run() -> CliResult {
    let cli = Cli::parse();
    let json = cli.format.eq_ignore_ascii_case("json");

    match cli.command {
        Commands::Var {
            holdings,
            prices,
            confidence,
            horizon,
            method,
            simulations,
            seed,
        } => {
            let method = parse_method(&method)?;
            let (service, start, end) = build_service(&holdings, &prices, None)?;
            let request = VarRequest {
                portfolio_id: PORTFOLIO_ID.to_string(),
                start_date: start,
                end_date: end,
                confidence,
                horizon_days: horizon,
                method,
                simulations,
                seed,
            };

            let spinner = (method == VarMethod::MonteCarlo).then(|| {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} {msg}")
                        .expect("valid template"),
                );
                pb.enable_steady_tick(Duration::from_millis(100));
                pb.set_message("Running Monte Carlo simulation...");
                pb
            });
            let report = service.var(&request);
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }
            let report = report?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_header(&format!("VALUE AT RISK ({})", report.method));
                println!("  Confidence:       {:.1}%", report.confidence * 100.0);
                println!("  Horizon:          {} day(s)", report.horizon_days);
                println!("  Portfolio value:  {:>14.2}", report.portfolio_value);
                println!("  VaR:              {:>14.2}", report.var);
                println!("  CVaR:             {:>14.2}", report.cvar);
            }
        }

        Commands::Stress { holdings, scenario } => {
            let (service, ..) = build_holdings_only(&holdings)?;
            let request = StressRequest {
                portfolio_id: PORTFOLIO_ID.to_string(),
                scenario: ScenarioSpec::Named {
                    scenario_name: scenario,
                },
            };
            let result = service.stress_test(&request)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_header(&format!("STRESS TEST: {}", result.scenario));
                println!(
                    "  {:<10} {:>14} {:>14} {:>12} {:>9}",
                    "Ticker", "Current", "Shocked", "Impact", "Impact %"
                );
                for impact in &result.position_impacts {
                    println!(
                        "  {:<10} {:>14.2} {:>14.2} {:>12.2} {:>8.1}%",
                        impact.ticker,
                        impact.current_value,
                        impact.shocked_value,
                        impact.impact,
                        impact.impact_percentage
                    );
                }
                println!();
                println!("  Portfolio before: {:>14.2}", result.portfolio_value_before);
                println!("  Portfolio after:  {:>14.2}", result.portfolio_value_after);
                println!(
                    "  P&L:              {:>14.2} ({:.2}%)",
                    result.pnl, result.pnl_percentage
                );
            }
        }

        Commands::Scenarios => {
            println!("Stress scenario catalog:");
            println!("========================\n");
            for scenario in StressScenario::catalog() {
                let default = scenario
                    .default_shock
                    .map_or_else(|| "none".to_string(), |s| format!("{:.0}%", s * 100.0));
                println!(
                    "  {:<24} {:2} sector overrides, default shock {}",
                    scenario.name,
                    scenario.shocks.len(),
                    default
                );
            }
        }

        Commands::Attribution { observations } => {
            let periods = load_observations(&observations)?;
            let service = AnalyticsService::new(InMemoryMarketData::new(), InMemorySnapshots::new());
            let response = service.attribution(&AttributionRequest {
                portfolio_id: PORTFOLIO_ID.to_string(),
                periods,
            })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_header("PERFORMANCE ATTRIBUTION");
                println!(
                    "  {:<24} {:>11} {:>11} {:>12} {:>10}",
                    "Sector", "Allocation", "Selection", "Interaction", "Total"
                );
                for row in &response.sector_attribution {
                    println!(
                        "  {:<24} {:>10.2}% {:>10.2}% {:>11.2}% {:>9.2}%",
                        row.sector.to_string(),
                        row.allocation * 100.0,
                        row.selection * 100.0,
                        row.interaction * 100.0,
                        row.total * 100.0
                    );
                }
                println!();
                println!("  Periods:           {}", response.periods);
                println!("  Portfolio return:  {:>8.2}%", response.portfolio_return * 100.0);
                println!("  Benchmark return:  {:>8.2}%", response.benchmark_return * 100.0);
                println!("  Active return:     {:>8.2}%", response.active_return * 100.0);
            }
        }

        Commands::Metrics {
            holdings,
            prices,
            benchmark,
            risk_free_rate,
        } => {
            let (service, start, end) = build_service(&holdings, &prices, Some(&benchmark))?;
            let metrics = service.metrics(&MetricsRequest {
                portfolio_id: PORTFOLIO_ID.to_string(),
                benchmark,
                start_date: start,
                end_date: end,
                risk_free_rate,
            })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&metrics)?);
            } else {
                print_header("RISK METRICS");
                println!("  Annualized return:  {:>9.2}%", metrics.annualized_return * 100.0);
                println!("  Volatility:         {:>9.2}%", metrics.volatility * 100.0);
                println!("  Beta:               {:>9.3}", metrics.beta);
                println!("  Alpha:              {:>9.2}%", metrics.alpha * 100.0);
                println!("  Sharpe ratio:       {:>9.3}", metrics.sharpe_ratio);
                println!("  Sortino ratio:      {:>9.3}", metrics.sortino_ratio);
                println!("  Tracking error:     {:>9.2}%", metrics.tracking_error * 100.0);
                println!("  Information ratio:  {:>9.3}", metrics.information_ratio);
                println!("  Max drawdown:       {:>9.2}%", metrics.max_drawdown * 100.0);
            }
        }

        Commands::Optimize {
            holdings,
            prices,
            risk_aversion,
            target_return,
            min_weight,
            max_weight,
        } => {
            let objective = match (risk_aversion, target_return) {
                (Some(gamma), None) => OptimizeObjective::RiskAversion(gamma),
                (None, Some(target)) => OptimizeObjective::TargetReturn(target),
                (None, None) => OptimizeObjective::RiskAversion(4.0),
                (Some(_), Some(_)) => {
                    return Err("--risk-aversion and --target-return are mutually exclusive".into());
                }
            };
            let (service, start, end) = build_service(&holdings, &prices, None)?;
            let response = service.optimize(&OptimizeRequest {
                portfolio_id: PORTFOLIO_ID.to_string(),
                start_date: start,
                end_date: end,
                objective,
                min_weight,
                max_weight,
                sector_caps: HashMap::new(),
            })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_header("MEAN-VARIANCE OPTIMIZATION");
                for (ticker, weight) in response.tickers.iter().zip(&response.weights) {
                    println!("  {:<10} {:>7.2}%", ticker, weight * 100.0);
                }
                println!();
                println!("  Expected return:      {:>7.2}%", response.expected_return * 100.0);
                println!(
                    "  Expected volatility:  {:>7.2}%",
                    response.expected_volatility * 100.0
                );
                if !response.converged {
                    println!("  Warning: solver did not fully converge");
                }
            }
        }

        Commands::Frontier {
            holdings,
            prices,
            points,
        } => {
            let (service, start, end) = build_service(&holdings, &prices, None)?;
            let response = service.frontier(&FrontierRequest {
                portfolio_id: PORTFOLIO_ID.to_string(),
                start_date: start,
                end_date: end,
                n_points: points,
                min_weight: None,
                max_weight: None,
            })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_header("EFFICIENT FRONTIER");
                println!("  {:>10} {:>10}", "Risk", "Return");
                for point in &response.points {
                    println!(
                        "  {:>9.2}% {:>9.2}%",
                        point.risk * 100.0,
                        point.expected_return * 100.0
                    );
                }
            }
        }

        Commands::Rebalance {
            holdings,
            targets,
            band,
            commission,
        } => {
            let (service, ..) = build_holdings_only(&holdings)?;
            let (target_weights, reference_prices) = load_targets(&targets)?;
            let result = service.rebalance(&RebalanceRequest {
                portfolio_id: PORTFOLIO_ID.to_string(),
                target_weights,
                no_trade_band: band,
                commission_rate: commission,
                reference_prices,
            })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_header("REBALANCE");
                if result.trades.is_empty() {
                    println!("  No trades: all drifts inside the no-trade band");
                } else {
                    println!(
                        "  {:<10} {:>12} {:>14} {:>9} {:>9}",
                        "Ticker", "Shares", "Value", "From", "To"
                    );
                    for trade in &result.trades {
                        println!(
                            "  {:<10} {:>12.2} {:>14.2} {:>8.2}% {:>8.2}%",
                            trade.ticker,
                            trade.shares,
                            trade.value,
                            trade.current_weight * 100.0,
                            trade.target_weight * 100.0
                        );
                    }
                }
                println!();
                println!("  Turnover:    {:>7.2}%", result.turnover * 100.0);
                println!("  Commission:  {:>10.2}", result.estimated_commission);
            }
        }
    }

    Ok(())
}

fn parse_method(name: &str) -> Result<VarMethod, Box<dyn std::error::Error>> {
    match name.to_lowercase().as_str() {
        "historical" | "hist" => Ok(VarMethod::Historical),
        "parametric" | "normal" => Ok(VarMethod::Parametric),
        "monte_carlo" | "montecarlo" | "mc" => Ok(VarMethod::MonteCarlo),
        _ => Err(format!("unknown VaR method: {name}").into()),
    }
}

/// Load holdings and prices into an in-memory service. The analysis window
/// is the full date range of the price file; the snapshot is dated at its
/// end.
fn build_service(
    holdings: &PathBuf,
    prices: &PathBuf,
    benchmark: Option<&str>,
) -> Result<
    (
        AnalyticsService<InMemoryMarketData, InMemorySnapshots>,
        NaiveDate,
        NaiveDate,
    ),
    Box<dyn std::error::Error>,
> {
    let series = load_price_series(prices)?;
    let (start, end) = date_range(&series)?;

    let mut market_data = InMemoryMarketData::new();
    for s in series {
        if benchmark == Some(s.ticker()) {
            market_data.insert_benchmark(s);
        } else {
            market_data.insert_instrument(s);
        }
    }

    let snapshot = load_snapshot(holdings, PORTFOLIO_ID, end)?;
    let mut snapshots = InMemorySnapshots::new();
    snapshots.insert(snapshot);

    Ok((AnalyticsService::new(market_data, snapshots), start, end))
}

fn build_holdings_only(
    holdings: &PathBuf,
) -> Result<
    (
        AnalyticsService<InMemoryMarketData, InMemorySnapshots>,
        NaiveDate,
    ),
    Box<dyn std::error::Error>,
> {
    let as_of = chrono::Utc::now().date_naive();
    let snapshot = load_snapshot(holdings, PORTFOLIO_ID, as_of)?;
    let mut snapshots = InMemorySnapshots::new();
    snapshots.insert(snapshot);
    Ok((
        AnalyticsService::new(InMemoryMarketData::new(), snapshots),
        as_of,
    ))
}

fn date_range(series: &[PriceSeries]) -> Result<(NaiveDate, NaiveDate), Box<dyn std::error::Error>> {
    let mut start: Option<NaiveDate> = None;
    let mut end: Option<NaiveDate> = None;
    for s in series {
        if let (Some(&first), Some(&last)) = (s.dates().first(), s.dates().last()) {
            start = Some(start.map_or(first, |d| d.min(first)));
            end = Some(end.map_or(last, |d| d.max(last)));
        }
    }
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err("price file contains no observations".into()),
    }
}

fn print_header(title: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{title:^62}║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}
