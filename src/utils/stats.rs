//! Statistical utility functions.

use statrs::function::erf::{erfc, erfc_inv};
use statrs::function::gamma::gamma_ur;

/// Quantile function of the standard normal distribution.
///
/// Closed form through the inverse complementary error function,
/// `Φ⁻¹(p) = -√2 · erfc⁻¹(2p)`.
///
/// # Arguments
/// * `p` - Probability value (0.0 to 1.0)
///
/// # Returns
/// The z-score corresponding to the given probability.
///
/// # Example
/// ```
/// use tsdiag::utils::quantile_normal;
///
/// // 97.5% quantile -> z ≈ 1.96
/// let z = quantile_normal(0.975);
/// assert!((z - 1.959964).abs() < 1e-6);
/// ```
pub fn quantile_normal(p: f64) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    -std::f64::consts::SQRT_2 * erfc_inv(2.0 * p)
}

/// Standard normal cumulative distribution function.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Standard normal survival function (1 - CDF).
pub fn normal_sf(x: f64) -> f64 {
    0.5 * erfc(x / std::f64::consts::SQRT_2)
}

/// Chi-squared survival function P(X > x) with `df` degrees of freedom.
///
/// Evaluated as the regularized upper incomplete gamma `Q(df/2, x/2)`.
pub fn chi_squared_sf(x: f64, df: usize) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 || df == 0 {
        return 1.0;
    }
    if x.is_infinite() {
        return 0.0;
    }
    gamma_ur(df as f64 / 2.0, x / 2.0).clamp(0.0, 1.0)
}

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate the variance of a slice (sample variance with n-1 denominator).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Population variance (n denominator).
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation (n denominator).
pub fn population_std_dev(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

/// Check whether every value is identical.
pub fn is_constant(values: &[f64]) -> bool {
    match values.first() {
        Some(&first) => values.iter().all(|&x| x == first),
        None => true,
    }
}

/// Sum of squares of the values (uncentered).
pub fn sum_of_squares(values: &[f64]) -> f64 {
    values.iter().map(|x| x * x).sum()
}

/// Return a sorted copy of the values (NaN-tolerant ordering).
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quantile_normal_known_values() {
        assert_relative_eq!(quantile_normal(0.5), 0.0, epsilon = 1e-12);
        assert_relative_eq!(quantile_normal(0.975), 1.959963984540054, epsilon = 1e-9);
        assert_relative_eq!(quantile_normal(0.025), -1.959963984540054, epsilon = 1e-9);
        assert_relative_eq!(quantile_normal(0.995), 2.5758293035489, epsilon = 1e-9);
    }

    #[test]
    fn quantile_normal_boundary_values() {
        assert_eq!(quantile_normal(0.0), f64::NEG_INFINITY);
        assert_eq!(quantile_normal(1.0), f64::INFINITY);
        assert!(quantile_normal(f64::NAN).is_nan());
    }

    #[test]
    fn normal_cdf_and_sf_are_complementary() {
        for &x in &[-3.0, -1.0, 0.0, 0.5, 2.0] {
            assert_relative_eq!(normal_cdf(x) + normal_sf(x), 1.0, epsilon = 1e-12);
        }
        assert_relative_eq!(normal_cdf(1.959963984540054), 0.975, epsilon = 1e-9);
    }

    #[test]
    fn chi_squared_sf_known_values() {
        // df = 2 is exponential with mean 2
        assert_relative_eq!(chi_squared_sf(2.0, 2), (-1.0_f64).exp(), epsilon = 1e-10);
        // 95th percentile of chi2(10) is 18.307
        assert_relative_eq!(chi_squared_sf(18.307038, 10), 0.05, epsilon = 1e-6);
        assert_eq!(chi_squared_sf(0.0, 5), 1.0);
        assert_eq!(chi_squared_sf(f64::INFINITY, 5), 0.0);
    }

    #[test]
    fn mean_calculates_correctly() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn variance_calculates_correctly() {
        assert_relative_eq!(variance(&[1.0, 2.0, 3.0, 4.0, 5.0]), 2.5, epsilon = 1e-10);
        assert_relative_eq!(
            population_variance(&[1.0, 2.0, 3.0, 4.0, 5.0]),
            2.0,
            epsilon = 1e-10
        );
        assert!(variance(&[1.0]).is_nan());
    }

    #[test]
    fn constant_detection() {
        assert!(is_constant(&[2.0, 2.0, 2.0]));
        assert!(!is_constant(&[2.0, 2.0, 2.5]));
        assert!(is_constant(&[]));
    }
}
