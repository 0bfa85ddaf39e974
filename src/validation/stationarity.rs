//! Stationarity tests for time series.
//!
//! Provides the augmented Dickey-Fuller and Phillips-Perron unit-root tests
//! and the KPSS stationarity test. Unit-root p-values come from MacKinnon's
//! (1994) response surface for a regression with constant and one unit root.

use std::fmt;

use tracing::{debug, warn};

use crate::error::{DiagnosticsError, Result};
use crate::transform::difference::difference;
use crate::utils::ols::{ols_fit, OlsFit};
use crate::utils::stats::{is_constant, normal_cdf};

/// MacKinnon (1994) bounds and polynomials, constant-only regression, N = 1.
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALLP: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGEP: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

/// MacKinnon (2010) critical-value surfaces (1%, 5%, 10%) in powers of 1/nobs.
const TAU_C_2010: [[f64; 4]; 3] = [
    [-3.43035, -6.5393, -16.786, -79.433],
    [-2.86154, -2.8903, -4.234, -40.040],
    [-2.56677, -1.5384, -2.809, 0.0],
];

/// KPSS (1992) upper-tail p-values for the tabulated critical values.
const KPSS_P_VALUES: [f64; 4] = [0.10, 0.05, 0.025, 0.01];
const KPSS_LEVEL_CRIT: [f64; 4] = [0.347, 0.463, 0.574, 0.739];
const KPSS_TREND_CRIT: [f64; 4] = [0.119, 0.146, 0.176, 0.216];

/// Result of a stationarity test.
#[derive(Debug, Clone)]
pub struct StationarityResult {
    /// Test statistic
    pub statistic: f64,
    /// P-value
    pub p_value: f64,
    /// Lag order used (augmentation lags or long-run variance lags)
    pub lags: usize,
    /// Observations in the test regression
    pub nobs: usize,
    /// Whether the series appears stationary at the 5% level
    pub is_stationary: bool,
    /// Critical values at common significance levels
    pub critical_values: CriticalValues,
    /// The statistic fell outside the tabulated range and the p-value is a bound
    pub p_value_bounded: bool,
}

/// Critical values for stationarity tests.
#[derive(Debug, Clone, Default)]
pub struct CriticalValues {
    /// Critical value at 1% significance
    pub cv_1pct: f64,
    /// Critical value at 5% significance
    pub cv_5pct: f64,
    /// Critical value at 10% significance
    pub cv_10pct: f64,
}

/// Options for the augmented Dickey-Fuller test.
#[derive(Debug, Clone)]
pub struct AdfOptions {
    /// Maximum augmentation lag. `None` uses `ceil(12 * (n/100)^(1/4))`.
    pub max_lag: Option<usize>,
    /// Select the lag by AIC. When false, `max_lag` is used as is.
    pub autolag: bool,
}

impl Default for AdfOptions {
    fn default() -> Self {
        Self {
            max_lag: None,
            autolag: true,
        }
    }
}

impl AdfOptions {
    /// Set the maximum augmentation lag.
    pub fn with_max_lag(mut self, max_lag: usize) -> Self {
        self.max_lag = Some(max_lag);
        self
    }

    /// Enable or disable AIC lag selection.
    pub fn with_autolag(mut self, autolag: bool) -> Self {
        self.autolag = autolag;
        self
    }
}

/// Deterministic component of the KPSS null hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpssRegression {
    /// Stationary around a constant.
    Level,
    /// Stationary around a linear trend.
    Trend,
}

impl KpssRegression {
    fn critical_table(&self) -> &'static [f64; 4] {
        match self {
            KpssRegression::Level => &KPSS_LEVEL_CRIT,
            KpssRegression::Trend => &KPSS_TREND_CRIT,
        }
    }
}

impl fmt::Display for KpssRegression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KpssRegression::Level => f.write_str("level"),
            KpssRegression::Trend => f.write_str("trend"),
        }
    }
}

/// How the Phillips-Perron statistic is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhillipsPerronMethod {
    /// `Z_tau` from `y_t = a + rho y_{t-1}` with a Newey-West long-run
    /// variance correction and its own MacKinnon p-value.
    #[default]
    LongRunVariance,
    /// t-statistic of `gamma` in `dy_t = a + gamma y_{t-1}`, paired with the
    /// ADF p-value of the same series.
    DifferenceRegression,
}

/// MacKinnon (1994) approximate p-value for a unit-root t-statistic.
///
/// Constant-only regression with one unit root.
pub fn mackinnon_p_value(stat: f64) -> f64 {
    if stat.is_nan() {
        return f64::NAN;
    }
    if stat > TAU_MAX {
        return 1.0;
    }
    if stat < TAU_MIN {
        return 0.0;
    }
    let z = if stat <= TAU_STAR {
        TAU_SMALLP[0] + TAU_SMALLP[1] * stat + TAU_SMALLP[2] * stat * stat
    } else {
        TAU_LARGEP[0]
            + TAU_LARGEP[1] * stat
            + TAU_LARGEP[2] * stat * stat
            + TAU_LARGEP[3] * stat * stat * stat
    };
    normal_cdf(z)
}

/// MacKinnon (2010) finite-sample critical values for `nobs` observations.
pub fn mackinnon_critical_values(nobs: usize) -> CriticalValues {
    let inv = 1.0 / nobs as f64;
    let cv = |row: &[f64; 4]| row[0] + row[1] * inv + row[2] * inv * inv + row[3] * inv * inv * inv;
    CriticalValues {
        cv_1pct: cv(&TAU_C_2010[0]),
        cv_5pct: cv(&TAU_C_2010[1]),
        cv_10pct: cv(&TAU_C_2010[2]),
    }
}

/// `ceil(12 * (n/100)^(1/4))`, the Schwert rule for the lag order.
fn schwert_lags(n: usize) -> usize {
    (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize
}

fn unit_root_result(stat: f64, p_value: f64, lags: usize, nobs: usize) -> StationarityResult {
    StationarityResult {
        statistic: stat,
        p_value,
        lags,
        nobs,
        is_stationary: p_value < 0.05,
        critical_values: mackinnon_critical_values(nobs),
        p_value_bounded: false,
    }
}

/// Design for `dy_t = a + gamma y_{t-1} + sum_{j=1..lags} phi_j dy_{t-j}`.
///
/// Rows start at `dy[start]`, so several lag orders can share one sample.
fn adf_design(series: &[f64], diff: &[f64], lags: usize, start: usize) -> (Vec<f64>, Vec<Vec<f64>>) {
    let rows = start..diff.len();
    let y: Vec<f64> = diff[rows.clone()].to_vec();
    let mut columns = Vec::with_capacity(lags + 2);
    columns.push(vec![1.0; y.len()]);
    columns.push(rows.clone().map(|t| series[t]).collect());
    for j in 1..=lags {
        columns.push(rows.clone().map(|t| diff[t - j]).collect());
    }
    (y, columns)
}

/// AIC lag selection over the sample shared by every candidate lag.
///
/// Lag orders whose design is singular are skipped.
fn select_adf_lag(series: &[f64], diff: &[f64], max_lag: usize) -> Result<usize> {
    let mut best: Option<(f64, usize)> = None;

    for lag in 0..=max_lag {
        let (y, columns) = adf_design(series, diff, lag, max_lag);
        let fit = match ols_fit(&y, &columns) {
            Ok(fit) => fit,
            Err(DiagnosticsError::ComputationError(msg)) => {
                debug!(lag, %msg, "skipping singular ADF lag order");
                continue;
            }
            Err(err) => return Err(err),
        };
        let aic = fit.aic();
        let better = match best {
            Some((best_aic, _)) => aic < best_aic,
            None => true,
        };
        if better {
            best = Some((aic, lag));
        }
    }

    best.map(|(_, lag)| lag).ok_or_else(|| {
        DiagnosticsError::ComputationError("no ADF lag order gives a regular design".into())
    })
}

/// Augmented Dickey-Fuller test for a unit root.
///
/// Tests the null hypothesis that the series has a unit root. The regression
/// includes a constant. With `autolag`, the augmentation lag minimizing AIC
/// on a common sample is chosen (ties go to the smallest lag) and the
/// regression is refit on the largest sample for that lag.
///
/// # Errors
/// * `InsufficientData` for fewer than 4 observations
/// * `ComputationError` for a constant series or a singular design
pub fn adf_test(series: &[f64], options: &AdfOptions) -> Result<StationarityResult> {
    let n = series.len();
    if n < 4 {
        return Err(DiagnosticsError::InsufficientData { needed: 4, got: n });
    }
    if is_constant(series) {
        return Err(DiagnosticsError::ComputationError(
            "ADF test is undefined for a constant series".into(),
        ));
    }

    let lag_cap = n / 2 - 2;
    let max_lag = match options.max_lag {
        Some(requested) if requested > lag_cap => {
            warn!(requested, lag_cap, "ADF maximum lag reduced to fit the sample");
            lag_cap
        }
        Some(requested) => requested,
        None => schwert_lags(n).min(lag_cap),
    };

    let diff = difference(series, 1);
    let used_lag = if options.autolag {
        select_adf_lag(series, &diff, max_lag)?
    } else {
        max_lag
    };
    debug!(max_lag, used_lag, "ADF lag selected");

    let (y, columns) = adf_design(series, &diff, used_lag, used_lag);
    let fit = ols_fit(&y, &columns)?;
    let stat = fit.t_value(1);

    Ok(unit_root_result(stat, mackinnon_p_value(stat), used_lag, fit.nobs))
}

/// Hobijn et al. (1998) automatic bandwidth for the KPSS long-run variance.
fn kpss_auto_lags(residuals: &[f64]) -> usize {
    let n = residuals.len();
    let nf = n as f64;
    let cov_lags = nf.powf(2.0 / 9.0) as usize;

    let mut s0 = residuals.iter().map(|r| r * r).sum::<f64>() / nf;
    let mut s1 = 0.0;
    for i in 1..=cov_lags.min(n - 1) {
        let prod = lagged_product(residuals, i) / (nf / 2.0);
        s0 += prod;
        s1 += i as f64 * prod;
    }

    let ratio = s1 / s0;
    let gamma = 1.1447 * (ratio * ratio).powf(1.0 / 3.0);
    let lags = gamma * nf.powf(1.0 / 3.0);
    if lags.is_finite() && lags > 0.0 {
        lags as usize
    } else {
        0
    }
}

fn lagged_product(x: &[f64], lag: usize) -> f64 {
    x[lag..].iter().zip(x.iter()).map(|(a, b)| a * b).sum()
}

/// Bartlett-weighted long-run variance `(sum r^2 + 2 sum_i w_i sum r_t r_{t-i}) / n`.
fn bartlett_long_run_variance(residuals: &[f64], lags: usize) -> f64 {
    let n = residuals.len();
    let mut s = residuals.iter().map(|r| r * r).sum::<f64>();
    for i in 1..=lags.min(n - 1) {
        let weight = 1.0 - i as f64 / (lags as f64 + 1.0);
        s += 2.0 * weight * lagged_product(residuals, i);
    }
    s / n as f64
}

/// Interpolate the KPSS p-value; returns `(p_value, bounded)`.
fn kpss_p_value(stat: f64, crit: &[f64; 4]) -> (f64, bool) {
    if stat <= crit[0] {
        return (KPSS_P_VALUES[0], true);
    }
    if stat >= crit[3] {
        return (KPSS_P_VALUES[3], true);
    }
    for i in 0..3 {
        if stat <= crit[i + 1] {
            let frac = (stat - crit[i]) / (crit[i + 1] - crit[i]);
            let p = KPSS_P_VALUES[i] + frac * (KPSS_P_VALUES[i + 1] - KPSS_P_VALUES[i]);
            return (p, false);
        }
    }
    (KPSS_P_VALUES[3], true)
}

/// KPSS test for level or trend stationarity.
///
/// Tests the null hypothesis that the series is stationary around a
/// constant (`Level`) or a linear trend (`Trend`). `lags` sets the Bartlett
/// bandwidth; `None` picks it automatically. A statistic outside the
/// tabulated critical values is reported with the bound p-value and
/// `p_value_bounded` set.
///
/// # Errors
/// * `InsufficientData` for fewer than 3 observations
/// * `ComputationError` for a constant series
pub fn kpss_test(
    series: &[f64],
    regression: KpssRegression,
    lags: Option<usize>,
) -> Result<StationarityResult> {
    let n = series.len();
    if n < 3 {
        return Err(DiagnosticsError::InsufficientData { needed: 3, got: n });
    }
    if is_constant(series) {
        return Err(DiagnosticsError::ComputationError(
            "KPSS test is undefined for a constant series".into(),
        ));
    }

    let crit = regression.critical_table();
    let critical_values = CriticalValues {
        cv_1pct: crit[3],
        cv_5pct: crit[1],
        cv_10pct: crit[0],
    };

    let residuals = match regression {
        KpssRegression::Level => {
            let m = series.iter().sum::<f64>() / n as f64;
            series.iter().map(|x| x - m).collect::<Vec<f64>>()
        }
        KpssRegression::Trend => {
            let trend: Vec<f64> = (1..=n).map(|t| t as f64).collect();
            let fit = ols_fit(series, &[vec![1.0; n], trend])?;
            if fit.is_exact_fit() {
                debug!("KPSS trend regression is an exact fit; statistic is 0");
                return Ok(kpss_result(0.0, crit, lags.unwrap_or(0), n, critical_values));
            }
            fit.residuals
        }
    };

    let nlags = match lags {
        Some(l) => l,
        None => kpss_auto_lags(&residuals),
    }
    .min(n - 1);
    debug!(%regression, nlags, "KPSS bandwidth");

    let mut partial = 0.0;
    let eta = residuals
        .iter()
        .map(|r| {
            partial += r;
            partial * partial
        })
        .sum::<f64>()
        / (n * n) as f64;

    let s_hat = bartlett_long_run_variance(&residuals, nlags);
    if s_hat.is_nan() || s_hat <= 0.0 {
        return Err(DiagnosticsError::ComputationError(
            "KPSS long-run variance is not positive".into(),
        ));
    }

    Ok(kpss_result(eta / s_hat, crit, nlags, n, critical_values))
}

fn kpss_result(
    stat: f64,
    crit: &[f64; 4],
    lags: usize,
    nobs: usize,
    critical_values: CriticalValues,
) -> StationarityResult {
    let (p_value, bounded) = kpss_p_value(stat, crit);
    if bounded {
        warn!(
            statistic = stat,
            p_value, "KPSS statistic is outside the table of critical values; p-value is a bound"
        );
    }
    StationarityResult {
        statistic: stat,
        p_value,
        lags,
        nobs,
        is_stationary: stat < critical_values.cv_5pct,
        critical_values,
        p_value_bounded: bounded,
    }
}

/// Statistic for an exact fit: 0 when `deviation` is numerically zero.
fn degenerate_stat(deviation: f64, regressor: &[f64], y: &[f64]) -> f64 {
    let x_max = regressor.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let y_max = y.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if (deviation * x_max).abs() <= 1e-8 * y_max {
        0.0
    } else {
        deviation.signum() * f64::INFINITY
    }
}

/// Phillips-Perron unit-root test.
///
/// `adf` supplies the ADF result for [`PhillipsPerronMethod::DifferenceRegression`];
/// when `None` the ADF test is run here. If that ADF test fails the p-value
/// is NaN.
///
/// # Errors
/// * `InsufficientData` if the sample is too short for the regression or
///   for the Newey-West bandwidth
/// * `ComputationError` for a constant series
pub fn phillips_perron(
    series: &[f64],
    method: PhillipsPerronMethod,
    adf: Option<&StationarityResult>,
) -> Result<StationarityResult> {
    match method {
        PhillipsPerronMethod::LongRunVariance => pp_long_run_variance(series),
        PhillipsPerronMethod::DifferenceRegression => {
            let adf_p = match adf {
                Some(result) => result.p_value,
                None => adf_test(series, &AdfOptions::default())
                    .map(|r| r.p_value)
                    .unwrap_or(f64::NAN),
            };
            pp_difference_regression(series, adf_p)
        }
    }
}

fn pp_long_run_variance(series: &[f64]) -> Result<StationarityResult> {
    let n = series.len();
    if n < 4 {
        return Err(DiagnosticsError::InsufficientData { needed: 4, got: n });
    }
    if is_constant(series) {
        return Err(DiagnosticsError::ComputationError(
            "Phillips-Perron test is undefined for a constant series".into(),
        ));
    }

    let lags = schwert_lags(n);
    let y: Vec<f64> = series[1..].to_vec();
    let lagged: Vec<f64> = series[..n - 1].to_vec();
    if y.len() < lags {
        return Err(DiagnosticsError::InsufficientData {
            needed: lags + 1,
            got: n,
        });
    }

    let fit = ols_fit(&y, &[lagged.clone(), vec![1.0; y.len()]])?;
    let rho = fit.coefficients[0];
    let nobs = fit.nobs;

    if fit.is_exact_fit() {
        let stat = degenerate_stat(rho - 1.0, &lagged, &y);
        debug!(stat, "Phillips-Perron regression is an exact fit");
        return Ok(unit_root_result(stat, mackinnon_p_value(stat), lags, nobs));
    }

    let stat = pp_z_tau(&fit, lags)?;
    debug!(lags, stat, "Phillips-Perron Z_tau");
    Ok(unit_root_result(stat, mackinnon_p_value(stat), lags, nobs))
}

fn pp_z_tau(fit: &OlsFit, lags: usize) -> Result<f64> {
    let u = &fit.residuals;
    let nf = fit.nobs as f64;
    let k = fit.num_params() as f64;

    let lam2 = newey_west(u, lags);
    if lam2.is_nan() || lam2 <= 0.0 {
        return Err(DiagnosticsError::ComputationError(
            "Phillips-Perron long-run variance is not positive".into(),
        ));
    }
    let lam = lam2.sqrt();
    let s2 = fit.rss / (nf - k);
    let s = s2.sqrt();
    let gamma0 = s2 * (nf - k) / nf;
    let sigma = fit.std_errors[0];
    let rho = fit.coefficients[0];

    Ok(gamma0.sqrt() / lam * ((rho - 1.0) / sigma)
        - 0.5 * ((lam2 - gamma0) / lam) * (nf * sigma / s))
}

/// Newey-West long-run variance with Bartlett weights, no demeaning.
fn newey_west(u: &[f64], lags: usize) -> f64 {
    let t = u.len() as f64;
    let mut lrv = u.iter().map(|x| x * x).sum::<f64>() / t;
    for i in 1..=lags.min(u.len() - 1) {
        let weight = 1.0 - i as f64 / (lags as f64 + 1.0);
        lrv += 2.0 * weight * lagged_product(u, i) / t;
    }
    lrv
}

fn pp_difference_regression(series: &[f64], adf_p_value: f64) -> Result<StationarityResult> {
    let n = series.len();
    if n < 4 {
        return Err(DiagnosticsError::InsufficientData { needed: 4, got: n });
    }
    if is_constant(series) {
        return Err(DiagnosticsError::ComputationError(
            "Phillips-Perron test is undefined for a constant series".into(),
        ));
    }

    let diff = difference(series, 1);
    let (y, columns) = adf_design(series, &diff, 0, 0);
    let fit = ols_fit(&y, &columns)?;
    let stat = fit.t_value(1);

    Ok(unit_root_result(stat, adf_p_value, 0, fit.nobs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn noise(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
            })
            .collect()
    }

    fn ar1(n: usize, phi: f64, seed: u64) -> Vec<f64> {
        let e = noise(n, seed);
        let mut x = vec![0.0; n];
        for t in 1..n {
            x[t] = phi * x[t - 1] + e[t];
        }
        x
    }

    fn linear(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    // ==================== mackinnon_p_value ====================

    #[test]
    fn mackinnon_p_value_known_points() {
        // statsmodels mackinnonp(0.0, 'c') = norm.cdf(1.7339)
        assert_relative_eq!(mackinnon_p_value(0.0), normal_cdf(1.7339), epsilon = 1e-12);
        assert_relative_eq!(mackinnon_p_value(0.0), 0.9585, epsilon = 1e-3);
        // Near the 5% critical value
        assert_relative_eq!(mackinnon_p_value(-2.86), 0.05, epsilon = 5e-3);
    }

    #[test]
    fn mackinnon_p_value_bounds() {
        assert_eq!(mackinnon_p_value(3.0), 1.0);
        assert_eq!(mackinnon_p_value(-20.0), 0.0);
        assert_eq!(mackinnon_p_value(f64::INFINITY), 1.0);
        assert_eq!(mackinnon_p_value(f64::NEG_INFINITY), 0.0);
        assert!(mackinnon_p_value(f64::NAN).is_nan());
    }

    #[test]
    fn mackinnon_p_value_is_monotone() {
        let mut prev = 0.0;
        for i in -180..27 {
            let p = mackinnon_p_value(i as f64 / 10.0);
            assert!(p >= prev - 1e-12, "not monotone at {}", i);
            prev = p;
        }
    }

    #[test]
    fn mackinnon_critical_values_ordered() {
        let cv = mackinnon_critical_values(100);
        assert!(cv.cv_1pct < cv.cv_5pct);
        assert!(cv.cv_5pct < cv.cv_10pct);
        assert_relative_eq!(cv.cv_5pct, -2.8912, epsilon = 1e-3);
    }

    // ==================== adf_test ====================

    #[test]
    fn adf_stationary_series() {
        let series = ar1(200, 0.3, 17);
        let result = adf_test(&series, &AdfOptions::default()).unwrap();

        assert!(result.statistic < -3.5);
        assert!(result.p_value < 0.01);
        assert!(result.is_stationary);
    }

    #[test]
    fn adf_linear_trend_has_zero_statistic() {
        let result = adf_test(&linear(100), &AdfOptions::default()).unwrap();

        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.lags, 0);
        assert_relative_eq!(result.p_value, 0.9585, epsilon = 1e-3);
        assert!(!result.is_stationary);
    }

    #[test]
    fn adf_random_walk_is_not_rejected() {
        let steps = noise(300, 99);
        let mut series = vec![0.0; 300];
        for t in 1..300 {
            series[t] = series[t - 1] + steps[t];
        }
        let result = adf_test(&series, &AdfOptions::default()).unwrap();
        assert!(result.p_value > 0.01);
    }

    #[test]
    fn adf_fixed_lag() {
        let series = ar1(120, 0.5, 5);
        let options = AdfOptions::default().with_max_lag(3).with_autolag(false);
        let result = adf_test(&series, &options).unwrap();

        assert_eq!(result.lags, 3);
        assert_eq!(result.nobs, 120 - 1 - 3);
    }

    #[test]
    fn adf_max_lag_is_capped() {
        let series = ar1(20, 0.5, 8);
        let options = AdfOptions::default().with_max_lag(50).with_autolag(false);
        let result = adf_test(&series, &options).unwrap();
        assert_eq!(result.lags, 8);
    }

    #[test]
    fn adf_short_series() {
        assert_eq!(
            adf_test(&[1.0, 2.0, 3.0], &AdfOptions::default()).unwrap_err(),
            DiagnosticsError::InsufficientData { needed: 4, got: 3 }
        );
    }

    #[test]
    fn adf_constant_series() {
        assert!(matches!(
            adf_test(&[5.0; 30], &AdfOptions::default()),
            Err(DiagnosticsError::ComputationError(_))
        ));
    }

    // ==================== kpss_test ====================

    #[test]
    fn kpss_stationary_series() {
        let series = noise(200, 23);
        let result = kpss_test(&series, KpssRegression::Level, None).unwrap();

        assert!(result.statistic > 0.0);
        assert!(result.p_value > 0.01);
    }

    #[test]
    fn kpss_level_rejects_linear_trend() {
        let result = kpss_test(&linear(100), KpssRegression::Level, None).unwrap();

        assert!(result.statistic > 0.739);
        assert_eq!(result.p_value, 0.01);
        assert!(result.p_value_bounded);
        assert!(!result.is_stationary);
    }

    #[test]
    fn kpss_trend_on_exact_trend_is_zero() {
        let result = kpss_test(&linear(50), KpssRegression::Trend, None).unwrap();

        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 0.10);
        assert!(result.p_value_bounded);
    }

    #[test]
    fn kpss_statistic_matches_formula() {
        let series = vec![1.0, 3.0, 2.0, 5.0, 4.0, 3.0, 6.0, 5.0];
        let result = kpss_test(&series, KpssRegression::Level, Some(2)).unwrap();

        let n = series.len() as f64;
        let m = series.iter().sum::<f64>() / n;
        let r: Vec<f64> = series.iter().map(|x| x - m).collect();
        let mut s = 0.0;
        let eta: f64 = r
            .iter()
            .map(|v| {
                s += v;
                s * s
            })
            .sum::<f64>()
            / (n * n);
        let lrv = (r.iter().map(|v| v * v).sum::<f64>()
            + 2.0 * (2.0 / 3.0) * lagged_product(&r, 1)
            + 2.0 * (1.0 / 3.0) * lagged_product(&r, 2))
            / n;

        assert_relative_eq!(result.statistic, eta / lrv, epsilon = 1e-12);
        assert_eq!(result.lags, 2);
    }

    #[test]
    fn kpss_p_value_interpolates() {
        let (p, bounded) = kpss_p_value(0.405, &KPSS_LEVEL_CRIT);
        assert_relative_eq!(p, 0.075, epsilon = 1e-12);
        assert!(!bounded);

        let (p, bounded) = kpss_p_value(0.1, &KPSS_TREND_CRIT);
        assert_eq!(p, 0.10);
        assert!(bounded);
    }

    #[test]
    fn kpss_lags_are_capped() {
        let series = noise(10, 2);
        let result = kpss_test(&series, KpssRegression::Level, Some(50)).unwrap();
        assert_eq!(result.lags, 9);
    }

    #[test]
    fn kpss_short_and_constant_series() {
        assert_eq!(
            kpss_test(&[1.0, 2.0], KpssRegression::Level, None).unwrap_err(),
            DiagnosticsError::InsufficientData { needed: 3, got: 2 }
        );
        assert!(matches!(
            kpss_test(&[1.0; 10], KpssRegression::Trend, None),
            Err(DiagnosticsError::ComputationError(_))
        ));
    }

    // ==================== phillips_perron ====================

    #[test]
    fn pp_stationary_series() {
        let series = ar1(200, 0.2, 31);
        let result = phillips_perron(&series, PhillipsPerronMethod::LongRunVariance, None).unwrap();

        assert!(result.p_value < 0.01);
        assert_eq!(result.lags, schwert_lags(200));
        assert_eq!(result.nobs, 199);
    }

    #[test]
    fn pp_linear_trend_is_degenerate() {
        let result =
            phillips_perron(&linear(100), PhillipsPerronMethod::LongRunVariance, None).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert_relative_eq!(result.p_value, 0.9585, epsilon = 1e-3);
    }

    #[test]
    fn pp_short_series_for_bandwidth() {
        let series = noise(7, 1);
        assert_eq!(
            phillips_perron(&series, PhillipsPerronMethod::LongRunVariance, None).unwrap_err(),
            DiagnosticsError::InsufficientData { needed: 8, got: 7 }
        );
    }

    #[test]
    fn pp_difference_regression_borrows_adf_p_value() {
        let series = ar1(80, 0.4, 13);
        let adf = adf_test(&series, &AdfOptions::default()).unwrap();
        let pp = phillips_perron(
            &series,
            PhillipsPerronMethod::DifferenceRegression,
            Some(&adf),
        )
        .unwrap();

        assert_eq!(pp.p_value, adf.p_value);
        assert!(pp.statistic < 0.0);

        // Same statistic as an ADF regression without augmentation
        let fixed = adf_test(
            &series,
            &AdfOptions::default().with_max_lag(0).with_autolag(false),
        )
        .unwrap();
        assert_relative_eq!(pp.statistic, fixed.statistic, epsilon = 1e-10);
    }

    #[test]
    fn pp_difference_regression_runs_adf_when_missing() {
        let series = ar1(80, 0.4, 13);
        let adf = adf_test(&series, &AdfOptions::default()).unwrap();
        let pp = phillips_perron(&series, PhillipsPerronMethod::DifferenceRegression, None).unwrap();
        assert_eq!(pp.p_value, adf.p_value);
    }
}
