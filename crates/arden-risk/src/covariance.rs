//! Sample covariance, correlation and Cholesky factorization.
//!
//! The Monte Carlo VaR path needs a covariance matrix of constituent
//! returns and its Cholesky factor. A matrix that is not positive definite
//! is surfaced as an explicit error rather than being patched up silently:
//! a singular sample covariance usually means fewer observations than
//! instruments, which the caller has to fix at the data layer.

use ndarray::{Array1, Array2, ArrayView2};
use thiserror::Error;

/// Errors raised during covariance estimation and factorization.
#[derive(Debug, Error)]
pub enum CovarianceError {
    /// Matrix is not positive definite; Cholesky decomposition failed
    #[error("covariance matrix is not positive definite (pivot {pivot} at row {row})")]
    NotPositiveDefinite {
        /// Failing pivot value
        pivot: f64,
        /// Row at which factorization broke down
        row: usize,
    },

    /// Non-square input where a square matrix was required
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Too few rows to estimate a covariance
    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },
}

/// Column means of a T×N return matrix.
pub fn sample_mean(returns: ArrayView2<'_, f64>) -> Array1<f64> {
    let t = returns.nrows() as f64;
    returns.sum_axis(ndarray::Axis(0)) / t
}

/// Sample covariance (n − 1 denominator) of a T×N return matrix.
///
/// # Errors
///
/// [`CovarianceError::InsufficientData`] with fewer than two rows.
pub fn sample_covariance(returns: ArrayView2<'_, f64>) -> Result<Array2<f64>, CovarianceError> {
    let t = returns.nrows();
    let n = returns.ncols();
    if t < 2 {
        return Err(CovarianceError::InsufficientData {
            required: 2,
            actual: t,
        });
    }

    let means = sample_mean(returns);
    let mut centered = returns.to_owned();
    for mut row in centered.rows_mut() {
        row -= &means;
    }

    let mut cov = centered.t().dot(&centered) / (t as f64 - 1.0);
    // Symmetrize against accumulation noise.
    for i in 0..n {
        for j in (i + 1)..n {
            let avg = 0.5 * (cov[[i, j]] + cov[[j, i]]);
            cov[[i, j]] = avg;
            cov[[j, i]] = avg;
        }
    }
    Ok(cov)
}

/// Pearson correlation matrix and the average pairwise correlation
/// (mean of the strict upper triangle).
///
/// A zero-variance column yields NaN in its row/column and is excluded
/// from the average.
pub fn correlation_matrix(
    returns: ArrayView2<'_, f64>,
) -> Result<(Array2<f64>, f64), CovarianceError> {
    let cov = sample_covariance(returns)?;
    let n = cov.nrows();

    let mut corr = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            let denom = (cov[[i, i]] * cov[[j, j]]).sqrt();
            corr[[i, j]] = if denom > 0.0 { cov[[i, j]] / denom } else { f64::NAN };
        }
    }

    let mut sum = 0.0;
    let mut count = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            if corr[[i, j]].is_finite() {
                sum += corr[[i, j]];
                count += 1;
            }
        }
    }
    let average = if count == 0 { f64::NAN } else { sum / count as f64 };

    Ok((corr, average))
}

/// Lower-triangular Cholesky factor L such that L·Lᵀ equals the input.
///
/// # Errors
///
/// * [`CovarianceError::DimensionMismatch`] for non-square input
/// * [`CovarianceError::NotPositiveDefinite`] when a pivot is not strictly
///   positive — surfaced explicitly so callers never work with a silently
///   broken factor
pub fn cholesky(matrix: &Array2<f64>) -> Result<Array2<f64>, CovarianceError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(CovarianceError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }

    let mut lower = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = matrix[[i, j]];
            for k in 0..j {
                sum -= lower[[i, k]] * lower[[j, k]];
            }
            if i == j {
                if sum <= 0.0 {
                    return Err(CovarianceError::NotPositiveDefinite { pivot: sum, row: i });
                }
                lower[[i, j]] = sum.sqrt();
            } else {
                lower[[i, j]] = sum / lower[[j, j]];
            }
        }
    }
    Ok(lower)
}

/// Whether a matrix admits a Cholesky factorization.
pub fn is_positive_definite(matrix: &Array2<f64>) -> bool {
    cholesky(matrix).is_ok()
}
