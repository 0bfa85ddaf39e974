//! Sample autocorrelation and partial autocorrelation.
//!
//! Autocovariances are biased (divided by `n`) and computed on the demeaned
//! series. Long series go through an FFT; short ones use the direct sum.

use rustfft::{num_complex::Complex64, FftPlanner};

use crate::error::{DiagnosticsError, Result};
use crate::utils::stats::mean;

/// Series length from which the FFT path is used.
const FFT_THRESHOLD: usize = 512;

/// Denominators below this are treated as zero in Durbin-Levinson.
const DL_EPS: f64 = 1e-12;

fn check_lag(n: usize, nlags: usize) -> Result<()> {
    if nlags == 0 {
        return Err(DiagnosticsError::InvalidLag(
            "lag bound must be positive".into(),
        ));
    }
    if nlags >= n {
        return Err(DiagnosticsError::InvalidLag(format!(
            "lag bound {} must be smaller than the series length {}",
            nlags, n
        )));
    }
    Ok(())
}

/// Biased autocovariance at lags `0..=nlags`.
///
/// # Errors
/// `InvalidLag` if `nlags` is 0 or not smaller than the series length.
pub fn autocovariance(series: &[f64], nlags: usize) -> Result<Vec<f64>> {
    check_lag(series.len(), nlags)?;

    let m = mean(series);
    let centered: Vec<f64> = series.iter().map(|x| x - m).collect();

    if series.len() >= FFT_THRESHOLD {
        Ok(autocovariance_fft(&centered, nlags))
    } else {
        Ok(autocovariance_direct(&centered, nlags))
    }
}

fn autocovariance_direct(centered: &[f64], nlags: usize) -> Vec<f64> {
    let n = centered.len();
    (0..=nlags)
        .map(|k| {
            let sum: f64 = centered[k..]
                .iter()
                .zip(centered.iter())
                .map(|(a, b)| a * b)
                .sum();
            sum / n as f64
        })
        .collect()
}

fn autocovariance_fft(centered: &[f64], nlags: usize) -> Vec<f64> {
    let n = centered.len();
    // Zero-pad to avoid circular wrap-around
    let size = (2 * n).next_power_of_two();

    let mut buffer: Vec<Complex64> = centered
        .iter()
        .map(|&x| Complex64::new(x, 0.0))
        .chain(std::iter::repeat(Complex64::new(0.0, 0.0)))
        .take(size)
        .collect();

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(size).process(&mut buffer);
    for c in buffer.iter_mut() {
        *c = Complex64::new(c.norm_sqr(), 0.0);
    }
    planner.plan_fft_inverse(size).process(&mut buffer);

    // rustfft leaves the inverse unnormalized
    let scale = (size * n) as f64;
    buffer[..=nlags].iter().map(|c| c.re / scale).collect()
}

/// Sample autocorrelation function at lags `0..=nlags`.
///
/// Lag 0 is always 1. A zero-variance series has all other lags at 0.
///
/// # Errors
/// `InvalidLag` if `nlags` is 0 or not smaller than the series length.
///
/// # Example
/// ```
/// use tsdiag::features::acf;
///
/// let series: Vec<f64> = (1..=20).map(|i| i as f64).collect();
/// let r = acf(&series, 3).unwrap();
/// assert_eq!(r.len(), 4);
/// assert_eq!(r[0], 1.0);
/// assert!(r[1] > r[2] && r[2] > r[3]);
/// ```
pub fn acf(series: &[f64], nlags: usize) -> Result<Vec<f64>> {
    let acov = autocovariance(series, nlags)?;
    let c0 = acov[0];

    if c0 <= 0.0 {
        let mut out = vec![0.0; nlags + 1];
        out[0] = 1.0;
        return Ok(out);
    }

    Ok(acov
        .iter()
        .enumerate()
        .map(|(k, c)| if k == 0 { 1.0 } else { (c / c0).clamp(-1.0, 1.0) })
        .collect())
}

/// Sample partial autocorrelation function at lags `0..=nlags`.
///
/// Durbin-Levinson recursion on the biased ACF. If the one-step prediction
/// error vanishes, the remaining lags are 0.
///
/// # Errors
/// `InvalidLag` if `nlags` is 0 or not smaller than the series length.
pub fn pacf(series: &[f64], nlags: usize) -> Result<Vec<f64>> {
    let r = acf(series, nlags)?;
    Ok(pacf_from_acf(&r))
}

/// Durbin-Levinson recursion on an autocorrelation sequence `r[0..=p]`.
pub fn pacf_from_acf(r: &[f64]) -> Vec<f64> {
    let nlags = r.len().saturating_sub(1);
    let mut out = vec![0.0; nlags + 1];
    if r.is_empty() {
        return out;
    }
    out[0] = 1.0;
    if nlags == 0 {
        return out;
    }

    let mut phi = vec![0.0; nlags + 1];
    let mut prev = vec![0.0; nlags + 1];
    let mut error: f64 = 1.0;

    for k in 1..=nlags {
        if error.abs() < DL_EPS {
            break;
        }

        let mut num = r[k];
        for j in 1..k {
            num -= prev[j] * r[k - j];
        }
        let reflection = (num / error).clamp(-1.0, 1.0);

        phi[k] = reflection;
        for j in 1..k {
            phi[j] = prev[j] - reflection * prev[k - j];
        }

        out[k] = reflection;
        error *= 1.0 - reflection * reflection;
        prev[..=k].copy_from_slice(&phi[..=k]);
    }

    out
}
