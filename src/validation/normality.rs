//! Normality tests: Shapiro-Wilk, two-sample Kolmogorov-Smirnov against a
//! moment-matched normal reference, and the Box-Cox lambda for strictly
//! positive series.

use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::Normal;
use tracing::warn;

use crate::error::{DiagnosticsError, Result};
use crate::transform::boxcox::{boxcox_lambda, is_boxcox_suitable};
use crate::utils::stats::{mean, normal_sf, population_std_dev, quantile_normal, sorted};

/// Royston (1995) polynomial coefficients.
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

/// Sample size above which the Shapiro-Wilk p-value is unreliable.
const SW_MAX_ACCURATE_N: usize = 5000;

/// Largest equal sample size that gets an exact K-S p-value.
const KS_EXACT_MAX_N: usize = 10_000;

/// Shapiro-Wilk test result.
#[derive(Debug, Clone)]
pub struct ShapiroWilkResult {
    /// W statistic in [0, 1]
    pub statistic: f64,
    /// P-value
    pub p_value: f64,
    /// Sample size
    pub n: usize,
}

/// Two-sample Kolmogorov-Smirnov test result.
#[derive(Debug, Clone)]
pub struct KolmogorovSmirnovResult {
    /// Largest absolute distance between the empirical CDFs
    pub statistic: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// Whether the p-value is exact rather than asymptotic
    pub exact: bool,
}

fn poly(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Half of the antisymmetric Shapiro-Wilk coefficients, `a[0..n/2]`.
fn shapiro_wilk_coefficients(n: usize) -> Vec<f64> {
    let half = n / 2;
    if n == 3 {
        return vec![std::f64::consts::FRAC_1_SQRT_2];
    }

    let an = n as f64;
    let m: Vec<f64> = (1..=half)
        .map(|i| quantile_normal((i as f64 - 0.375) / (an + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();

    let mut a = vec![0.0; half];
    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    a[0] = a1;

    let (first, fac) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
            / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
            .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
        (1, fac)
    };

    for i in first..half {
        a[i] = -m[i] / fac;
    }
    a
}

/// Shapiro-Wilk test for normality (Royston's AS R94 algorithm).
///
/// A zero-range sample returns `W = 1, p = 1` with a warning. Samples larger
/// than 5000 are tested but the p-value may be inaccurate.
///
/// # Errors
/// `InsufficientData` for fewer than 3 observations.
pub fn shapiro_wilk(series: &[f64]) -> Result<ShapiroWilkResult> {
    let n = series.len();
    if n < 3 {
        return Err(DiagnosticsError::InsufficientData { needed: 3, got: n });
    }
    if n > SW_MAX_ACCURATE_N {
        warn!(n, "Shapiro-Wilk p-value may be inaccurate for more than 5000 observations");
    }

    let x = sorted(series);
    let range = x[n - 1] - x[0];
    if range <= 0.0 {
        warn!("Shapiro-Wilk input has zero range; reporting W = 1");
        return Ok(ShapiroWilkResult {
            statistic: 1.0,
            p_value: 1.0,
            n,
        });
    }

    let half = shapiro_wilk_coefficients(n);
    let coef: Vec<f64> = (0..n)
        .map(|i| {
            if i < n / 2 {
                -half[i]
            } else if n - 1 - i < n / 2 {
                half[n - 1 - i]
            } else {
                0.0
            }
        })
        .collect();

    // Squared correlation between the ordered sample and the coefficients
    let xs: Vec<f64> = x.iter().map(|v| v / range).collect();
    let x_mean = mean(&xs);
    let a_mean = mean(&coef);
    let mut ssa = 0.0;
    let mut ssx = 0.0;
    let mut sax = 0.0;
    for (a, v) in coef.iter().zip(xs.iter()) {
        let da = a - a_mean;
        let dx = v - x_mean;
        ssa += da * da;
        ssx += dx * dx;
        sax += da * dx;
    }
    let w1 = ((ssa * ssx - sax * sax) / (ssa * ssx)).clamp(0.0, 1.0);
    let w = 1.0 - w1;

    Ok(ShapiroWilkResult {
        statistic: w,
        p_value: shapiro_wilk_p_value(w, w1, n),
        n,
    })
}

/// Royston's normalizing transformation of `1 - W`.
fn shapiro_wilk_p_value(w: f64, w1: f64, n: usize) -> f64 {
    if n == 3 {
        let p = 6.0 / std::f64::consts::PI * (w.sqrt().asin() - std::f64::consts::FRAC_PI_3);
        return p.clamp(0.0, 1.0);
    }

    let an = n as f64;
    let y = w1.ln();
    let (y, m, s) = if n <= 11 {
        let gamma = poly(&G, an);
        if y >= gamma {
            return 1e-99;
        }
        (-(gamma - y).ln(), poly(&C3, an), poly(&C4, an).exp())
    } else {
        let xx = an.ln();
        (y, poly(&C5, xx), poly(&C6, xx).exp())
    };

    normal_sf((y - m) / s).clamp(0.0, 1.0)
}

/// Empirical CDF of sorted `data` at `x` (right-continuous).
fn ecdf(data: &[f64], x: f64) -> f64 {
    data.partition_point(|&v| v <= x) as f64 / data.len() as f64
}

/// Probability that a lattice path leaves the band of half-width `h` for two
/// samples of equal size `n`.
fn prob_outside_square(n: usize, h: usize) -> f64 {
    let mut p = 0.0;
    let mut k = (n / h) as i64;
    let (nf, hf) = (n as f64, h as f64);
    while k >= 0 {
        let kf = k as f64;
        let mut p1 = 1.0;
        for j in 0..h {
            let jf = j as f64;
            p1 = (nf - kf * hf - jf) * p1 / (nf + kf * hf + jf + 1.0);
        }
        p = p1 * (1.0 - p);
        k -= 1;
    }
    2.0 * p
}

/// Survival function of the limiting Kolmogorov distribution.
fn kolmogorov_sf(lambda: f64) -> f64 {
    // Q(0.2) differs from 1 by less than 1e-10
    if lambda <= 0.2 {
        return 1.0;
    }
    let mut sum = 0.0;
    for k in 1..=100 {
        let kf = k as f64;
        let term = (-2.0 * kf * kf * lambda * lambda).exp();
        sum += if k % 2 == 1 { term } else { -term };
        if term < 1e-16 {
            break;
        }
    }
    (2.0 * sum).clamp(0.0, 1.0)
}

/// Two-sided, two-sample Kolmogorov-Smirnov test.
///
/// Equal sample sizes up to 10 000 get an exact p-value; otherwise the
/// asymptotic Kolmogorov distribution is used.
///
/// # Errors
/// `InsufficientData` if either sample is empty.
pub fn ks_two_sample(a: &[f64], b: &[f64]) -> Result<KolmogorovSmirnovResult> {
    if a.is_empty() || b.is_empty() {
        return Err(DiagnosticsError::InsufficientData {
            needed: 1,
            got: a.len().min(b.len()),
        });
    }

    let sa = sorted(a);
    let sb = sorted(b);
    let d = sa
        .iter()
        .chain(sb.iter())
        .map(|&x| (ecdf(&sa, x) - ecdf(&sb, x)).abs())
        .fold(0.0_f64, f64::max);

    let (n1, n2) = (sa.len(), sb.len());
    if n1 == n2 && n1 <= KS_EXACT_MAX_N {
        let h = (d * n1 as f64).round() as usize;
        let p_value = if h == 0 {
            1.0
        } else {
            prob_outside_square(n1, h).clamp(0.0, 1.0)
        };
        return Ok(KolmogorovSmirnovResult {
            statistic: d,
            p_value,
            exact: true,
        });
    }

    let en = (n1 * n2) as f64 / (n1 + n2) as f64;
    Ok(KolmogorovSmirnovResult {
        statistic: d,
        p_value: kolmogorov_sf(en.sqrt() * d),
        exact: false,
    })
}

/// Normal sample with the mean and population standard deviation of `series`.
///
/// A zero standard deviation yields a constant sample at the mean.
pub fn normal_reference_sample<R: Rng + ?Sized>(series: &[f64], rng: &mut R) -> Vec<f64> {
    let m = mean(series);
    let sd = population_std_dev(series);

    match Normal::new(m, sd) {
        Ok(dist) if sd > 0.0 => (0..series.len()).map(|_| dist.sample(&mut *rng)).collect(),
        _ => vec![m; series.len()],
    }
}

/// Kolmogorov-Smirnov test of `series` against a moment-matched normal sample
/// of the same length drawn from `rng`.
pub fn kolmogorov_smirnov_normal<R: Rng + ?Sized>(
    series: &[f64],
    rng: &mut R,
) -> Result<KolmogorovSmirnovResult> {
    let reference = normal_reference_sample(series, rng);
    ks_two_sample(series, &reference)
}

/// Which normality diagnostic a table row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalityTest {
    ShapiroWilk,
    KolmogorovSmirnov,
    BoxCox,
}

impl NormalityTest {
    /// Display name used in result tables.
    pub fn name(&self) -> &'static str {
        match self {
            NormalityTest::ShapiroWilk => "Shapiro-Wilk",
            NormalityTest::KolmogorovSmirnov => "Kolmogorov-Smirnov",
            NormalityTest::BoxCox => "Box-Cox lambda",
        }
    }
}

/// Statistic and p-value of a test; `None` when the test could not run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TestOutcome {
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
}

impl TestOutcome {
    fn undefined() -> Self {
        Self::default()
    }
}

/// One row of the normality table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalityRow {
    pub test: NormalityTest,
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
}

/// Normality diagnostics, shaped by whether the series is strictly positive.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalityReport {
    /// Strictly positive series: Box-Cox lambda is estimated.
    WithBoxCox {
        shapiro_wilk: TestOutcome,
        kolmogorov_smirnov: TestOutcome,
        /// Maximum-likelihood lambda, `None` if estimation failed
        box_cox: Option<f64>,
    },
    /// Series with a zero or negative value.
    WithoutBoxCox {
        shapiro_wilk: TestOutcome,
        kolmogorov_smirnov: TestOutcome,
    },
}

impl NormalityReport {
    /// Shapiro-Wilk outcome.
    pub fn shapiro_wilk(&self) -> &TestOutcome {
        match self {
            NormalityReport::WithBoxCox { shapiro_wilk, .. }
            | NormalityReport::WithoutBoxCox { shapiro_wilk, .. } => shapiro_wilk,
        }
    }

    /// Kolmogorov-Smirnov outcome.
    pub fn kolmogorov_smirnov(&self) -> &TestOutcome {
        match self {
            NormalityReport::WithBoxCox {
                kolmogorov_smirnov, ..
            }
            | NormalityReport::WithoutBoxCox {
                kolmogorov_smirnov, ..
            } => kolmogorov_smirnov,
        }
    }

    /// Box-Cox lambda, if the series qualified and estimation succeeded.
    pub fn box_cox(&self) -> Option<f64> {
        match self {
            NormalityReport::WithBoxCox { box_cox, .. } => *box_cox,
            NormalityReport::WithoutBoxCox { .. } => None,
        }
    }

    /// Whether the table carries a Box-Cox row.
    pub fn has_box_cox(&self) -> bool {
        matches!(self, NormalityReport::WithBoxCox { .. })
    }

    /// Flatten into table rows: Shapiro-Wilk, Kolmogorov-Smirnov, then Box-Cox
    /// when present. The Box-Cox row never has a p-value.
    pub fn rows(&self) -> Vec<NormalityRow> {
        let sw = self.shapiro_wilk();
        let ks = self.kolmogorov_smirnov();
        let mut rows = vec![
            NormalityRow {
                test: NormalityTest::ShapiroWilk,
                statistic: sw.statistic,
                p_value: sw.p_value,
            },
            NormalityRow {
                test: NormalityTest::KolmogorovSmirnov,
                statistic: ks.statistic,
                p_value: ks.p_value,
            },
        ];
        if let NormalityReport::WithBoxCox { box_cox, .. } = self {
            rows.push(NormalityRow {
                test: NormalityTest::BoxCox,
                statistic: *box_cox,
                p_value: None,
            });
        }
        rows
    }
}

/// Run every normality diagnostic on the working series.
///
/// The Box-Cox variant is chosen once by the strict-positivity predicate. A
/// sub-test that fails is logged and reported as an undefined row.
pub fn normality_tests<R: Rng + ?Sized>(series: &[f64], rng: &mut R) -> NormalityReport {
    let shapiro_wilk = match shapiro_wilk(series) {
        Ok(r) => TestOutcome {
            statistic: Some(r.statistic),
            p_value: Some(r.p_value),
        },
        Err(err) => {
            warn!(%err, "Shapiro-Wilk test skipped");
            TestOutcome::undefined()
        }
    };

    let kolmogorov_smirnov = match kolmogorov_smirnov_normal(series, rng) {
        Ok(r) => TestOutcome {
            statistic: Some(r.statistic),
            p_value: Some(r.p_value),
        },
        Err(err) => {
            warn!(%err, "Kolmogorov-Smirnov test skipped");
            TestOutcome::undefined()
        }
    };

    if is_boxcox_suitable(series) {
        let box_cox = match boxcox_lambda(series) {
            Ok(lambda) => Some(lambda),
            Err(err) => {
                warn!(%err, "Box-Cox lambda estimation failed");
                None
            }
        };
        NormalityReport::WithBoxCox {
            shapiro_wilk,
            kolmogorov_smirnov,
            box_cox,
        }
    } else {
        NormalityReport::WithoutBoxCox {
            shapiro_wilk,
            kolmogorov_smirnov,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn normal_scores(n: usize) -> Vec<f64> {
        (1..=n)
            .map(|i| quantile_normal((i as f64 - 0.375) / (n as f64 + 0.25)))
            .collect()
    }

    // ==================== shapiro_wilk ====================

    #[test]
    fn shapiro_wilk_coefficients_are_normalized() {
        for n in [4, 5, 6, 11, 12, 50, 301] {
            let half = shapiro_wilk_coefficients(n);
            let ss: f64 = 2.0 * half.iter().map(|a| a * a).sum::<f64>();
            assert_relative_eq!(ss, 1.0, epsilon = 1e-10);
            assert!(half.windows(2).all(|w| w[0] > w[1]));
        }
    }

    #[test]
    fn shapiro_wilk_three_points() {
        // W = 27/28 for {1, 2, 4}
        let result = shapiro_wilk(&[4.0, 1.0, 2.0]).unwrap();
        assert_relative_eq!(result.statistic, 27.0 / 28.0, epsilon = 1e-12);
        let expected = 6.0 / std::f64::consts::PI
            * ((27.0_f64 / 28.0).sqrt().asin() - std::f64::consts::FRAC_PI_3);
        assert_relative_eq!(result.p_value, expected, epsilon = 1e-12);
        assert_relative_eq!(result.p_value, 0.6368, epsilon = 1e-3);
    }

    #[test]
    fn shapiro_wilk_equally_spaced_three_points() {
        let result = shapiro_wilk(&[1.0, 2.0, 3.0]).unwrap();
        assert_relative_eq!(result.statistic, 1.0, epsilon = 1e-12);
        assert_relative_eq!(result.p_value, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn shapiro_wilk_accepts_normal_scores() {
        for n in [8, 30, 200] {
            let result = shapiro_wilk(&normal_scores(n)).unwrap();
            assert!(result.statistic > 0.95, "n = {}: W = {}", n, result.statistic);
            assert!(result.p_value > 0.5, "n = {}: p = {}", n, result.p_value);
        }
    }

    #[test]
    fn shapiro_wilk_rejects_skewed_data() {
        let series: Vec<f64> = (1..=40).map(|i| (0.15 * i as f64).exp()).collect();
        let result = shapiro_wilk(&series).unwrap();
        assert!(result.statistic < 0.9);
        assert!(result.p_value < 0.01);
    }

    #[test]
    fn shapiro_wilk_statistic_in_unit_interval() {
        let series = vec![0.3, -1.2, 2.5, 0.0, 0.1, 7.0, -0.4, 1.1, 0.9];
        let result = shapiro_wilk(&series).unwrap();
        assert!((0.0..=1.0).contains(&result.statistic));
        assert!((0.0..=1.0).contains(&result.p_value));
    }

    #[test]
    fn shapiro_wilk_zero_range() {
        let result = shapiro_wilk(&[2.0; 10]).unwrap();
        assert_eq!(result.statistic, 1.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn shapiro_wilk_too_short() {
        assert_eq!(
            shapiro_wilk(&[1.0, 2.0]).unwrap_err(),
            DiagnosticsError::InsufficientData { needed: 3, got: 2 }
        );
    }

    // ==================== ks_two_sample ====================

    #[test]
    fn ks_identical_samples() {
        let a = vec![0.1, 0.5, 0.9, 1.3];
        let result = ks_two_sample(&a, &a).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert!(result.exact);
    }

    #[test]
    fn ks_disjoint_samples() {
        // scipy: ks_2samp([1,2,3], [4,5,6]) -> D = 1, p = 0.1
        let result = ks_two_sample(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert_eq!(result.statistic, 1.0);
        assert_relative_eq!(result.p_value, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn ks_exact_matches_path_count() {
        // n = 2: every ordering reaches D >= 1/2, so p = 1
        let result = ks_two_sample(&[1.0, 3.0], &[2.0, 4.0]).unwrap();
        assert_relative_eq!(result.statistic, 0.5, epsilon = 1e-12);
        assert_relative_eq!(result.p_value, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn ks_unequal_sizes_use_asymptotic() {
        let a: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..30).map(|i| i as f64 + 40.0).collect();
        let result = ks_two_sample(&a, &b).unwrap();
        assert!(!result.exact);
        assert!(result.p_value < 1e-6);
    }

    #[test]
    fn ks_empty_sample() {
        assert!(matches!(
            ks_two_sample(&[], &[1.0]),
            Err(DiagnosticsError::InsufficientData { .. })
        ));
    }

    #[test]
    fn kolmogorov_sf_reference_values() {
        // 5% critical value of the Kolmogorov distribution is 1.3581
        assert_relative_eq!(kolmogorov_sf(1.3581), 0.05, epsilon = 1e-4);
        assert_eq!(kolmogorov_sf(0.0), 1.0);
    }

    // ==================== kolmogorov_smirnov_normal ====================

    #[test]
    fn reference_sample_matches_length() {
        let series = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut rng = StdRng::seed_from_u64(7);
        let reference = normal_reference_sample(&series, &mut rng);
        assert_eq!(reference.len(), series.len());
    }

    #[test]
    fn reference_sample_draws_from_matched_normal() {
        let series: Vec<f64> = (0..2000)
            .map(|i| if i % 2 == 0 { 8.0 } else { 12.0 })
            .collect();
        let reference = normal_reference_sample(&series, &mut StdRng::seed_from_u64(3));

        let dist = Normal::new(10.0, 2.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let direct: Vec<f64> = (0..2000).map(|_| dist.sample(&mut rng)).collect();
        assert_eq!(reference, direct);

        assert_relative_eq!(mean(&reference), 10.0, epsilon = 0.2);
        assert_relative_eq!(population_std_dev(&reference), 2.0, epsilon = 0.2);
    }

    #[test]
    fn reference_sample_is_constant_for_constant_series() {
        let mut rng = StdRng::seed_from_u64(1);
        let reference = normal_reference_sample(&[0.0; 8], &mut rng);
        assert_eq!(reference, vec![0.0; 8]);
    }

    #[test]
    fn ks_normal_is_reproducible_with_seed() {
        let series = normal_scores(40);
        let a = kolmogorov_smirnov_normal(&series, &mut StdRng::seed_from_u64(11)).unwrap();
        let b = kolmogorov_smirnov_normal(&series, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(a.statistic, b.statistic);
        assert_eq!(a.p_value, b.p_value);
    }

    // ==================== normality_tests ====================

    #[test]
    fn positive_series_gets_box_cox_row() {
        let series = vec![1.2, 3.4, 2.2, 5.1, 4.4, 2.9, 3.3, 6.0];
        let report = normality_tests(&series, &mut StdRng::seed_from_u64(3));

        assert!(report.has_box_cox());
        let rows = report.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].test, NormalityTest::BoxCox);
        assert!(rows[2].statistic.is_some());
        assert_eq!(rows[2].p_value, None);
    }

    #[test]
    fn non_positive_series_has_two_rows() {
        let series = vec![1.2, -3.4, 2.2, 5.1, 0.0, 2.9];
        let report = normality_tests(&series, &mut StdRng::seed_from_u64(3));

        assert!(!report.has_box_cox());
        let rows = report.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].test, NormalityTest::ShapiroWilk);
        assert_eq!(rows[1].test, NormalityTest::KolmogorovSmirnov);
    }

    #[test]
    fn constant_positive_series_keeps_box_cox_shape() {
        let report = normality_tests(&[4.0; 6], &mut StdRng::seed_from_u64(0));
        assert!(report.has_box_cox());
        assert_eq!(report.box_cox(), None);
        assert_eq!(report.shapiro_wilk().statistic, Some(1.0));
    }

    #[test]
    fn short_series_has_undefined_shapiro_row() {
        let report = normality_tests(&[1.0, 2.0], &mut StdRng::seed_from_u64(0));
        assert_eq!(*report.shapiro_wilk(), TestOutcome::default());
        assert!(report.kolmogorov_smirnov().statistic.is_some());
    }
}
