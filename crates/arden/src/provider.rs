//! Data-access seams and their in-memory implementations.
//!
//! The engines never fetch data themselves. Callers hand the service a
//! [`MarketDataProvider`] for price histories and a [`SnapshotProvider`]
//! for portfolio holdings; retrieval is expected to have completed before
//! any engine call, so provider methods are synchronous and infallible
//! I/O-wise once the data is loaded.

use arden_model::{PortfolioSnapshot, PriceSeries, SeriesError};
use chrono::NaiveDate;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by data providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No history loaded for the ticker
    #[error("no price history for '{0}'")]
    UnknownTicker(String),

    /// No history loaded for the benchmark
    #[error("no benchmark history for '{0}'")]
    UnknownBenchmark(String),

    /// No snapshot loaded for the portfolio
    #[error("no snapshot for portfolio '{0}'")]
    UnknownPortfolio(String),

    /// History exists but has no observations inside the requested window
    #[error("'{ticker}' has no observations between {start} and {end}")]
    NoData {
        /// Requested ticker
        ticker: String,
        /// Window start (inclusive)
        start: NaiveDate,
        /// Window end (inclusive)
        end: NaiveDate,
    },

    /// Windowed series failed validation
    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// Source of instrument and benchmark price histories.
pub trait MarketDataProvider {
    /// Closing prices for `ticker` over `[start, end]`, both inclusive.
    ///
    /// # Errors
    ///
    /// [`ProviderError::UnknownTicker`] or [`ProviderError::NoData`].
    fn price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ProviderError>;

    /// Closing levels for a benchmark index over `[start, end]`.
    ///
    /// # Errors
    ///
    /// [`ProviderError::UnknownBenchmark`] or [`ProviderError::NoData`].
    fn benchmark_history(
        &self,
        benchmark: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ProviderError>;
}

/// Source of portfolio holdings.
pub trait SnapshotProvider {
    /// Current snapshot for a portfolio id.
    ///
    /// # Errors
    ///
    /// [`ProviderError::UnknownPortfolio`].
    fn snapshot(&self, portfolio_id: &str) -> Result<PortfolioSnapshot, ProviderError>;
}

/// Market data held entirely in memory; the provider used by the CLI and
/// the test suites.
#[derive(Debug, Default)]
pub struct InMemoryMarketData {
    instruments: HashMap<String, PriceSeries>,
    benchmarks: HashMap<String, PriceSeries>,
}

impl InMemoryMarketData {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an instrument history, replacing any previous one.
    pub fn insert_instrument(&mut self, series: PriceSeries) {
        self.instruments.insert(series.ticker().to_string(), series);
    }

    /// Load a benchmark history, replacing any previous one.
    pub fn insert_benchmark(&mut self, series: PriceSeries) {
        self.benchmarks.insert(series.ticker().to_string(), series);
    }
}

fn window(series: &PriceSeries, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries, ProviderError> {
    let observations: Vec<(NaiveDate, f64)> = series
        .dates()
        .iter()
        .zip(series.closes())
        .filter(|(date, _)| (start..=end).contains(*date))
        .map(|(&date, &close)| (date, close))
        .collect();
    if observations.is_empty() {
        return Err(ProviderError::NoData {
            ticker: series.ticker().to_string(),
            start,
            end,
        });
    }
    Ok(PriceSeries::new(series.ticker(), observations)?)
}

impl MarketDataProvider for InMemoryMarketData {
    fn price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ProviderError> {
        let series = self
            .instruments
            .get(ticker)
            .ok_or_else(|| ProviderError::UnknownTicker(ticker.to_string()))?;
        window(series, start, end)
    }

    fn benchmark_history(
        &self,
        benchmark: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, ProviderError> {
        let series = self
            .benchmarks
            .get(benchmark)
            .ok_or_else(|| ProviderError::UnknownBenchmark(benchmark.to_string()))?;
        window(series, start, end)
    }
}

/// Snapshots held in memory, keyed by portfolio id.
#[derive(Debug, Default)]
pub struct InMemorySnapshots {
    snapshots: HashMap<String, PortfolioSnapshot>,
}

impl InMemorySnapshots {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot under its portfolio id.
    pub fn insert(&mut self, snapshot: PortfolioSnapshot) {
        self.snapshots
            .insert(snapshot.portfolio().to_string(), snapshot);
    }
}

impl SnapshotProvider for InMemorySnapshots {
    fn snapshot(&self, portfolio_id: &str) -> Result<PortfolioSnapshot, ProviderError> {
        self.snapshots
            .get(portfolio_id)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownPortfolio(portfolio_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series() -> PriceSeries {
        PriceSeries::new(
            "AAPL",
            (1..=10).map(|d| (date(d), 100.0 + f64::from(d))).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_window_is_inclusive_on_both_ends() {
        let mut provider = InMemoryMarketData::new();
        provider.insert_instrument(series());

        let windowed = provider.price_history("AAPL", date(3), date(7)).unwrap();
        assert_eq!(windowed.len(), 5);
        assert_eq!(windowed.dates()[0], date(3));
        assert_eq!(*windowed.dates().last().unwrap(), date(7));
    }

    #[test]
    fn test_unknown_ticker() {
        let provider = InMemoryMarketData::new();
        let err = provider.price_history("AAPL", date(1), date(5)).unwrap_err();
        assert!(matches!(err, ProviderError::UnknownTicker(_)));
    }

    #[test]
    fn test_empty_window() {
        let mut provider = InMemoryMarketData::new();
        provider.insert_instrument(series());
        let err = provider
            .price_history("AAPL", date(20), date(25))
            .unwrap_err();
        assert!(matches!(err, ProviderError::NoData { .. }));
    }
}
