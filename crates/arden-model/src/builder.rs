//! Return series construction.
//!
//! Converts instrument price histories into aligned, frequency-normalized
//! return series for a portfolio and its benchmark. Two rules are enforced
//! here rather than downstream:
//!
//! * a held instrument with a missing price on a required date is a hard
//!   [`SeriesError::DataGap`] — gaps are never forward-filled;
//! * a benchmark covering a shorter range than the portfolio truncates the
//!   pair to the intersection and reports it as a warning in the
//!   [`AlignmentReport`], not a failure.

use crate::error::SeriesError;
use crate::series::{Frequency, PriceSeries, ReturnSeries};
use crate::snapshot::PortfolioSnapshot;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Metadata describing how a portfolio/benchmark pair was aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentReport {
    /// Whether any portfolio observations were dropped to match the benchmark
    pub truncated: bool,
    /// Portfolio observations dropped before the first common date
    pub dropped_leading: usize,
    /// Portfolio observations dropped after the last common date
    pub dropped_trailing: usize,
}

impl AlignmentReport {
    const fn exact() -> Self {
        Self {
            truncated: false,
            dropped_leading: 0,
            dropped_trailing: 0,
        }
    }
}

/// Builds portfolio and instrument return series at a requested frequency.
#[derive(Debug, Clone, Copy)]
pub struct ReturnSeriesBuilder {
    frequency: Frequency,
}

impl ReturnSeriesBuilder {
    /// Create a builder producing series at `frequency`.
    pub const fn new(frequency: Frequency) -> Self {
        Self { frequency }
    }

    /// Daily builder, the most common case.
    pub const fn daily() -> Self {
        Self::new(Frequency::Daily)
    }

    /// Target frequency of this builder.
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Returns for a single instrument at the builder's frequency.
    pub fn instrument_returns(&self, prices: &PriceSeries) -> Result<ReturnSeries, SeriesError> {
        let daily = prices.returns()?;
        self.resample(&daily)
    }

    /// Portfolio return series from a snapshot and constituent histories.
    ///
    /// Weights are taken from the snapshot (buy-and-hold over the window,
    /// matching the static-weights convention of the risk engine). The date
    /// grid is the union of all constituent dates; every held instrument
    /// must have a price on every grid date.
    ///
    /// # Errors
    ///
    /// * [`SeriesError::MissingHistory`] when a held ticker has no history
    /// * [`SeriesError::DataGap`] when a held ticker misses a grid date
    pub fn portfolio_returns(
        &self,
        snapshot: &PortfolioSnapshot,
        histories: &HashMap<String, PriceSeries>,
    ) -> Result<ReturnSeries, SeriesError> {
        let weights = snapshot.weights();

        // Union of all observation dates across held instruments.
        let mut grid = BTreeSet::new();
        for pos in snapshot.positions() {
            let history = histories
                .get(pos.ticker())
                .ok_or_else(|| SeriesError::MissingHistory(pos.ticker().to_string()))?;
            grid.extend(history.dates().iter().copied());
        }
        let grid: Vec<NaiveDate> = grid.into_iter().collect();
        if grid.len() < 2 {
            return Err(SeriesError::Empty(snapshot.portfolio().to_string()));
        }

        // Per-instrument closes on the full grid; a hole is a hard error.
        let mut closes: Vec<Vec<f64>> = Vec::with_capacity(snapshot.positions().len());
        for pos in snapshot.positions() {
            let history = &histories[pos.ticker()];
            let mut row = Vec::with_capacity(grid.len());
            for &date in &grid {
                let close = history.close_on(date).ok_or_else(|| SeriesError::DataGap {
                    ticker: pos.ticker().to_string(),
                    date,
                })?;
                row.push(close);
            }
            closes.push(row);
        }

        let mut observations = Vec::with_capacity(grid.len() - 1);
        for t in 1..grid.len() {
            let portfolio_return: f64 = closes
                .iter()
                .zip(weights.iter())
                .map(|(row, w)| w * (row[t] / row[t - 1] - 1.0))
                .sum();
            observations.push((grid[t], portfolio_return));
        }

        let daily = ReturnSeries::new(snapshot.portfolio().to_string(), observations)?;
        self.resample(&daily)
    }

    /// Align a portfolio/benchmark pair onto their common dates.
    ///
    /// The benchmark covering a shorter range than the portfolio is
    /// tolerated: the pair is truncated to the intersection and the report
    /// records how many portfolio observations were dropped on each side.
    pub fn aligned_pair(
        portfolio: &ReturnSeries,
        benchmark: &ReturnSeries,
    ) -> Result<(ReturnSeries, ReturnSeries, AlignmentReport), SeriesError> {
        let (aligned_portfolio, aligned_benchmark) = portfolio.align(benchmark)?;

        if aligned_portfolio.len() == portfolio.len() {
            return Ok((aligned_portfolio, aligned_benchmark, AlignmentReport::exact()));
        }

        let first_common = aligned_portfolio.first_date();
        let last_common = aligned_portfolio.last_date();
        let dropped_leading = portfolio.dates().iter().filter(|&&d| d < first_common).count();
        let dropped_trailing = portfolio.dates().iter().filter(|&&d| d > last_common).count();

        Ok((
            aligned_portfolio,
            aligned_benchmark,
            AlignmentReport {
                truncated: true,
                dropped_leading,
                dropped_trailing,
            },
        ))
    }

    /// Downsample by compounding sub-period returns geometrically:
    /// the bucket return is ∏(1 + r) − 1, dated at the bucket's last
    /// observation.
    fn resample(&self, series: &ReturnSeries) -> Result<ReturnSeries, SeriesError> {
        if self.frequency == Frequency::Daily {
            return Ok(series.clone());
        }

        let mut observations: Vec<(NaiveDate, f64)> = Vec::new();
        let mut current_bucket: Option<(u32, u32)> = None;
        let mut compounded = 1.0;
        let mut bucket_end = series.first_date();

        for (&date, &value) in series.dates().iter().zip(series.values()) {
            let bucket = self.bucket_key(date);
            match current_bucket {
                Some(active) if active == bucket => {
                    compounded *= 1.0 + value;
                    bucket_end = date;
                }
                Some(_) => {
                    observations.push((bucket_end, compounded - 1.0));
                    current_bucket = Some(bucket);
                    compounded = 1.0 + value;
                    bucket_end = date;
                }
                None => {
                    current_bucket = Some(bucket);
                    compounded = 1.0 + value;
                    bucket_end = date;
                }
            }
        }
        if current_bucket.is_some() {
            observations.push((bucket_end, compounded - 1.0));
        }

        ReturnSeries::new(series.entity().to_string(), observations)
    }

    fn bucket_key(&self, date: NaiveDate) -> (u32, u32) {
        match self.frequency {
            Frequency::Daily => unreachable!("daily series are never bucketed"),
            Frequency::Weekly => {
                let week = date.iso_week();
                (week.year() as u32, week.week())
            }
            Frequency::Monthly => (date.year() as u32, date.month()),
        }
    }
}
