//! Date-indexed price and return series.
//!
//! Both series types enforce strictly increasing dates at construction, so
//! every downstream statistic can assume an ordered, gap-checked index.

use crate::error::SeriesError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sampling frequency of a return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    /// One observation per trading day
    Daily,
    /// One observation per ISO week
    Weekly,
    /// One observation per calendar month
    Monthly,
}

impl Frequency {
    /// Periods per year used for annualization.
    ///
    /// The trading-day convention is 252; deviating conventions (365-day)
    /// produce incomparable statistics, so this is fixed per frequency.
    pub const fn periods_per_year(&self) -> f64 {
        match self {
            Self::Daily => 252.0,
            Self::Weekly => 52.0,
            Self::Monthly => 12.0,
        }
    }
}

/// Per-instrument close-price history with strictly increasing dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    ticker: String,
    dates: Vec<NaiveDate>,
    closes: Vec<f64>,
}

impl PriceSeries {
    /// Construct a price series from `(date, close)` observations.
    ///
    /// # Errors
    ///
    /// Fails when the series is empty, dates are not strictly increasing,
    /// or any price is non-positive or non-finite.
    pub fn new(
        ticker: impl Into<String>,
        observations: Vec<(NaiveDate, f64)>,
    ) -> Result<Self, SeriesError> {
        let ticker = ticker.into();
        if observations.is_empty() {
            return Err(SeriesError::Empty(ticker));
        }

        let mut dates = Vec::with_capacity(observations.len());
        let mut closes = Vec::with_capacity(observations.len());
        for (date, close) in observations {
            if let Some(&prev) = dates.last()
                && date <= prev
            {
                return Err(SeriesError::NonIncreasingDates {
                    series: ticker,
                    date,
                });
            }
            if !close.is_finite() || close <= 0.0 {
                return Err(SeriesError::InvalidPrice {
                    ticker,
                    date,
                    price: close,
                });
            }
            dates.push(date);
            closes.push(close);
        }

        Ok(Self {
            ticker,
            dates,
            closes,
        })
    }

    /// Instrument ticker.
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Observation dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Close prices, parallel to [`Self::dates`].
    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Close price on an exact date, if observed.
    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|idx| self.closes[idx])
    }

    /// Simple returns between consecutive observations.
    ///
    /// The resulting series is one observation shorter and dated at the end
    /// of each interval.
    pub fn returns(&self) -> Result<ReturnSeries, SeriesError> {
        if self.len() < 2 {
            return Err(SeriesError::Empty(self.ticker.clone()));
        }
        let observations = self
            .dates
            .windows(2)
            .zip(self.closes.windows(2))
            .map(|(d, c)| (d[1], c[1] / c[0] - 1.0))
            .collect();
        ReturnSeries::new(self.ticker.clone(), observations)
    }
}

/// Ordered `(date, return)` series for a portfolio, benchmark or instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    entity: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Construct a return series from `(date, return)` observations.
    ///
    /// # Errors
    ///
    /// Fails when the series is empty or dates are not strictly increasing.
    pub fn new(
        entity: impl Into<String>,
        observations: Vec<(NaiveDate, f64)>,
    ) -> Result<Self, SeriesError> {
        let entity = entity.into();
        if observations.is_empty() {
            return Err(SeriesError::Empty(entity));
        }

        let mut dates = Vec::with_capacity(observations.len());
        let mut values = Vec::with_capacity(observations.len());
        for (date, value) in observations {
            if let Some(&prev) = dates.last()
                && date <= prev
            {
                return Err(SeriesError::NonIncreasingDates {
                    series: entity,
                    date,
                });
            }
            dates.push(date);
            values.push(value);
        }

        Ok(Self {
            entity,
            dates,
            values,
        })
    }

    /// Entity this series describes (portfolio id, benchmark ticker, ...).
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Observation dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Return values, parallel to [`Self::dates`].
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// First observation date.
    pub fn first_date(&self) -> NaiveDate {
        self.dates[0]
    }

    /// Last observation date.
    pub fn last_date(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// Arithmetic mean return per period.
    pub fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Sample variance (n − 1 denominator); 0.0 for a single observation.
    pub fn variance(&self) -> f64 {
        let n = self.values.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.mean();
        self.values.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1) as f64
    }

    /// Sample standard deviation per period.
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Total geometric return over the series: ∏(1 + r) − 1.
    pub fn cumulative_return(&self) -> f64 {
        self.values.iter().map(|r| 1.0 + r).product::<f64>() - 1.0
    }

    /// Restrict both series to their common dates, preserving order.
    ///
    /// Alignment is an explicit step: computing a joint statistic on
    /// misaligned series is an input-validation failure, never a silent
    /// drop inside a formula.
    ///
    /// # Errors
    ///
    /// [`SeriesError::DisjointDates`] when no dates are shared.
    pub fn align(&self, other: &Self) -> Result<(Self, Self), SeriesError> {
        let mut left = Vec::new();
        let mut right = Vec::new();

        let (mut i, mut j) = (0, 0);
        while i < self.len() && j < other.len() {
            match self.dates[i].cmp(&other.dates[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    left.push((self.dates[i], self.values[i]));
                    right.push((other.dates[j], other.values[j]));
                    i += 1;
                    j += 1;
                }
            }
        }

        if left.is_empty() {
            return Err(SeriesError::DisjointDates {
                left: self.entity.clone(),
                right: other.entity.clone(),
            });
        }

        Ok((
            Self::new(self.entity.clone(), left)?,
            Self::new(other.entity.clone(), right)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_price_series_rejects_unsorted_dates() {
        let err = PriceSeries::new(
            "AAPL",
            vec![(d(2024, 1, 2), 100.0), (d(2024, 1, 2), 101.0)],
        )
        .unwrap_err();
        assert!(matches!(err, SeriesError::NonIncreasingDates { .. }));
    }

    #[test]
    fn test_price_series_rejects_bad_price() {
        let err = PriceSeries::new(
            "AAPL",
            vec![(d(2024, 1, 2), 100.0), (d(2024, 1, 3), -1.0)],
        )
        .unwrap_err();
        assert!(matches!(err, SeriesError::InvalidPrice { .. }));
    }

    #[test]
    fn test_returns_from_prices() {
        let prices = PriceSeries::new(
            "AAPL",
            vec![
                (d(2024, 1, 2), 100.0),
                (d(2024, 1, 3), 110.0),
                (d(2024, 1, 4), 99.0),
            ],
        )
        .unwrap();

        let returns = prices.returns().unwrap();
        assert_eq!(returns.len(), 2);
        assert_abs_diff_eq!(returns.values()[0], 0.10, epsilon = 1e-12);
        assert_abs_diff_eq!(returns.values()[1], -0.10, epsilon = 1e-12);
        assert_eq!(returns.first_date(), d(2024, 1, 3));
    }

    #[test]
    fn test_series_stats() {
        let series = ReturnSeries::new(
            "p",
            vec![
                (d(2024, 1, 2), 0.01),
                (d(2024, 1, 3), -0.02),
                (d(2024, 1, 4), 0.04),
            ],
        )
        .unwrap();

        assert_abs_diff_eq!(series.mean(), 0.01, epsilon = 1e-12);
        assert_abs_diff_eq!(series.variance(), 0.0009, epsilon = 1e-12);
        assert_abs_diff_eq!(
            series.cumulative_return(),
            1.01 * 0.98 * 1.04 - 1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_align_keeps_intersection() {
        let a = ReturnSeries::new(
            "a",
            vec![
                (d(2024, 1, 2), 0.01),
                (d(2024, 1, 3), 0.02),
                (d(2024, 1, 4), 0.03),
            ],
        )
        .unwrap();
        let b = ReturnSeries::new(
            "b",
            vec![(d(2024, 1, 3), -0.01), (d(2024, 1, 5), 0.00)],
        )
        .unwrap();

        let (left, right) = a.align(&b).unwrap();
        assert_eq!(left.dates(), &[d(2024, 1, 3)]);
        assert_eq!(right.dates(), &[d(2024, 1, 3)]);
        assert_abs_diff_eq!(left.values()[0], 0.02);
        assert_abs_diff_eq!(right.values()[0], -0.01);
    }

    #[test]
    fn test_align_disjoint_fails() {
        let a = ReturnSeries::new("a", vec![(d(2024, 1, 2), 0.01)]).unwrap();
        let b = ReturnSeries::new("b", vec![(d(2024, 1, 3), 0.02)]).unwrap();
        assert!(matches!(
            a.align(&b),
            Err(SeriesError::DisjointDates { .. })
        ));
    }

    #[test]
    fn test_periods_per_year() {
        assert_abs_diff_eq!(Frequency::Daily.periods_per_year(), 252.0);
        assert_abs_diff_eq!(Frequency::Weekly.periods_per_year(), 52.0);
        assert_abs_diff_eq!(Frequency::Monthly.periods_per_year(), 12.0);
    }
}
