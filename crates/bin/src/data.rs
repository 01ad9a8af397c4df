//! CSV loading for the CLI.
//!
//! Two input files drive most commands:
//!
//! * holdings: `ticker,sector,quantity,cost_basis,price` — one row per
//!   position; an empty sector marks a cash-like holding;
//! * prices: `date,ticker,close` — long-format daily closes, dates ISO.
//!
//! Attribution takes its own file: `period,sector,portfolio_weight,
//! benchmark_weight,portfolio_return,benchmark_return`.

use arden::attribution::SectorObservation;
use arden::model::{
    AssetClass, Instrument, ModelError, PortfolioSnapshot, Position, PriceSeries, Sector,
    SeriesError,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading CLI input files.
#[derive(Debug, Error)]
pub enum DataError {
    /// File access or CSV parsing failure
    #[error("failed to read {path}: {source}")]
    Csv {
        /// Offending file
        path: String,
        /// Underlying error
        #[source]
        source: csv::Error,
    },

    /// A sector name that is not a GICS sector
    #[error("unknown sector '{sector}' for '{ticker}'")]
    UnknownSector {
        /// Position ticker
        ticker: String,
        /// Unrecognized sector string
        sector: String,
    },

    /// Snapshot validation failure
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Price series validation failure
    #[error(transparent)]
    Series(#[from] SeriesError),
}

#[derive(Debug, Deserialize)]
struct HoldingRecord {
    ticker: String,
    #[serde(default)]
    sector: String,
    quantity: f64,
    cost_basis: f64,
    price: f64,
}

#[derive(Debug, Deserialize)]
struct PriceRecord {
    date: NaiveDate,
    ticker: String,
    close: f64,
}

#[derive(Debug, Deserialize)]
struct TargetRecord {
    ticker: String,
    weight: f64,
    #[serde(default)]
    price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ObservationRecord {
    period: usize,
    sector: String,
    portfolio_weight: f64,
    benchmark_weight: f64,
    portfolio_return: f64,
    benchmark_return: f64,
}

fn reader(path: &Path) -> Result<csv::Reader<std::fs::File>, DataError> {
    csv::Reader::from_path(path).map_err(|source| DataError::Csv {
        path: path.display().to_string(),
        source,
    })
}

fn record_err(path: &Path) -> impl Fn(csv::Error) -> DataError + '_ {
    move |source| DataError::Csv {
        path: path.display().to_string(),
        source,
    }
}

/// Load a holdings file into a validated snapshot.
pub fn load_snapshot(
    path: &Path,
    portfolio_id: &str,
    as_of: NaiveDate,
) -> Result<PortfolioSnapshot, DataError> {
    let mut positions = Vec::new();
    for record in reader(path)?.deserialize::<HoldingRecord>() {
        let record = record.map_err(record_err(path))?;
        let sector = record.sector.trim();
        let instrument = if sector.is_empty() {
            Instrument {
                ticker: record.ticker,
                asset_class: AssetClass::Cash,
                sector: None,
            }
        } else {
            let parsed = Sector::from_name(sector).ok_or_else(|| DataError::UnknownSector {
                ticker: record.ticker.clone(),
                sector: sector.to_string(),
            })?;
            Instrument::equity(record.ticker, parsed)
        };
        positions.push(Position::new(
            instrument,
            record.quantity,
            record.cost_basis,
            record.price,
        ));
    }
    Ok(PortfolioSnapshot::new(portfolio_id, as_of, positions)?)
}

/// Load a long-format price file into one series per ticker.
pub fn load_price_series(path: &Path) -> Result<Vec<PriceSeries>, DataError> {
    let mut by_ticker: BTreeMap<String, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for record in reader(path)?.deserialize::<PriceRecord>() {
        let record = record.map_err(record_err(path))?;
        by_ticker
            .entry(record.ticker)
            .or_default()
            .push((record.date, record.close));
    }

    let mut series = Vec::with_capacity(by_ticker.len());
    for (ticker, mut observations) in by_ticker {
        observations.sort_by_key(|(date, _)| *date);
        series.push(PriceSeries::new(ticker, observations)?);
    }
    Ok(series)
}

/// Load rebalance targets: weights per ticker plus reference prices for
/// names the portfolio does not currently hold (`ticker,weight,price`
/// with price optional).
pub fn load_targets(
    path: &Path,
) -> Result<(std::collections::HashMap<String, f64>, std::collections::HashMap<String, f64>), DataError>
{
    let mut weights = std::collections::HashMap::new();
    let mut prices = std::collections::HashMap::new();
    for record in reader(path)?.deserialize::<TargetRecord>() {
        let record = record.map_err(record_err(path))?;
        if let Some(price) = record.price {
            prices.insert(record.ticker.clone(), price);
        }
        weights.insert(record.ticker, record.weight);
    }
    Ok((weights, prices))
}

/// Load sector observations grouped by period index (ascending).
pub fn load_observations(path: &Path) -> Result<Vec<Vec<SectorObservation>>, DataError> {
    let mut by_period: BTreeMap<usize, Vec<SectorObservation>> = BTreeMap::new();
    for record in reader(path)?.deserialize::<ObservationRecord>() {
        let record = record.map_err(record_err(path))?;
        let sector =
            Sector::from_name(&record.sector).ok_or_else(|| DataError::UnknownSector {
                ticker: format!("period {}", record.period),
                sector: record.sector.clone(),
            })?;
        by_period.entry(record.period).or_default().push(SectorObservation {
            sector,
            portfolio_weight: record.portfolio_weight,
            benchmark_weight: record.benchmark_weight,
            portfolio_return: record.portfolio_return,
            benchmark_return: record.benchmark_return,
        });
    }
    Ok(by_period.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_snapshot() {
        let path = write_temp(
            "arden_holdings_test.csv",
            "ticker,sector,quantity,cost_basis,price\n\
             AAPL,Information Technology,100,150.0,180.0\n\
             USD,,2000,1.0,1.0\n",
        );
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let snapshot = load_snapshot(&path, "growth", as_of).unwrap();

        assert_eq!(snapshot.positions().len(), 2);
        assert_eq!(
            snapshot.position("AAPL").unwrap().instrument.sector,
            Some(Sector::InformationTechnology)
        );
        assert!(snapshot.position("USD").unwrap().instrument.sector.is_none());
    }

    #[test]
    fn test_unknown_sector_is_rejected() {
        let path = write_temp(
            "arden_holdings_bad_sector.csv",
            "ticker,sector,quantity,cost_basis,price\nAAPL,Cryptocurrency,1,1,1\n",
        );
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let err = load_snapshot(&path, "growth", as_of).unwrap_err();
        assert!(matches!(err, DataError::UnknownSector { .. }));
    }

    #[test]
    fn test_load_price_series_groups_and_sorts() {
        let path = write_temp(
            "arden_prices_test.csv",
            "date,ticker,close\n\
             2024-01-03,AAPL,103.0\n\
             2024-01-02,AAPL,102.0\n\
             2024-01-02,JPM,201.0\n\
             2024-01-03,JPM,202.0\n",
        );
        let series = load_price_series(&path).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].ticker(), "AAPL");
        assert_eq!(series[0].closes(), &[102.0, 103.0]);
    }

    #[test]
    fn test_load_observations_groups_by_period() {
        let path = write_temp(
            "arden_observations_test.csv",
            "period,sector,portfolio_weight,benchmark_weight,portfolio_return,benchmark_return\n\
             1,Financials,0.5,0.5,0.02,0.01\n\
             1,Energy,0.5,0.5,0.01,0.02\n\
             2,Financials,0.6,0.5,0.03,0.02\n\
             2,Energy,0.4,0.5,0.00,0.01\n",
        );
        let periods = load_observations(&path).unwrap();
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].len(), 2);
    }
}
