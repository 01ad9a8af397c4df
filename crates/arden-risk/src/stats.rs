//! Scalar statistics shared across the risk engine.

/// Lower empirical quantile of a sample.
///
/// Sorts ascending and picks index `floor(p · n)`, clamped to the last
/// element. This is the inclusive lower-quantile convention; VaR quantiles
/// therefore always have at least one tail observation at or below them.
///
/// Returns `f64::NAN` for an empty sample.
pub fn empirical_quantile(sample: &[f64], p: f64) -> f64 {
    if sample.is_empty() {
        return f64::NAN;
    }
    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = ((p * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
    sorted[idx]
}

/// Mean of all sample values at or below the given threshold.
///
/// Used for expected shortfall: the threshold is the VaR quantile and the
/// result is the average tail loss. Returns `f64::NAN` when nothing is at
/// or below the threshold.
pub fn tail_mean(sample: &[f64], threshold: f64) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &value in sample {
        if value <= threshold {
            sum += value;
            count += 1;
        }
    }
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Standard normal probability density function.
pub fn normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// Inverse standard-normal CDF (quantile function).
///
/// Acklam's rational approximation; absolute error below 1.15e-9 over the
/// full domain, more than enough for confidence levels quoted to a basis
/// point. Returns `f64::NAN` outside (0, 1).
pub fn inverse_normal_cdf(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) || p == 0.0 || p == 1.0 {
        return f64::NAN;
    }

    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];

    const P_LOW: f64 = 0.02425;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= P_HIGH {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.5, 0.0)]
    #[case(0.975, 1.959964)]
    #[case(0.95, 1.644854)]
    #[case(0.05, -1.644854)]
    #[case(0.01, -2.326348)]
    fn test_inverse_normal_cdf(#[case] p: f64, #[case] expected: f64) {
        assert_abs_diff_eq!(inverse_normal_cdf(p), expected, epsilon = 1e-5);
    }

    #[test]
    fn test_inverse_normal_cdf_out_of_domain() {
        assert!(inverse_normal_cdf(0.0).is_nan());
        assert!(inverse_normal_cdf(1.0).is_nan());
        assert!(inverse_normal_cdf(-0.5).is_nan());
    }

    #[test]
    fn test_empirical_quantile_lower_convention() {
        let sample = vec![5.0, 1.0, 3.0, 2.0, 4.0];
        // floor(0.05 * 5) = 0 -> smallest observation
        assert_abs_diff_eq!(empirical_quantile(&sample, 0.05), 1.0);
        // floor(0.5 * 5) = 2 -> third smallest
        assert_abs_diff_eq!(empirical_quantile(&sample, 0.5), 3.0);
        assert_abs_diff_eq!(empirical_quantile(&sample, 0.999), 5.0);
    }

    #[test]
    fn test_tail_mean() {
        let sample = vec![-0.05, -0.02, 0.01, 0.03];
        assert_abs_diff_eq!(tail_mean(&sample, -0.02), -0.035, epsilon = 1e-12);
        assert!(tail_mean(&sample, -0.10).is_nan());
    }

    #[test]
    fn test_normal_pdf_peak() {
        assert_abs_diff_eq!(normal_pdf(0.0), 0.3989422804014327, epsilon = 1e-12);
    }
}
