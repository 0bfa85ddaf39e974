//! Box-Cox power transformation and maximum-likelihood lambda estimation.
//!
//! The lambda estimate is the one reported in the normality table: it is the
//! power that makes a strictly positive series look most Gaussian.

use crate::error::{DiagnosticsError, Result};
use crate::utils::stats::{is_constant, population_variance};

/// Initial lambda grid, matching the usual [-2, 2] starting bracket.
const GRID_MIN: f64 = -2.0;
const GRID_MAX: f64 = 2.0;
const GRID_STEPS: usize = 80;
/// Bracket growth factor when the maximum lies beyond the grid.
const GOLDEN_GROWTH: f64 = 1.618_033_988_749_895;
const MAX_EXPANSIONS: usize = 60;
/// Golden-section tolerance on lambda.
const LAMBDA_TOL: f64 = 1e-8;

/// Apply Box-Cox transformation with a given lambda.
///
/// For lambda != 0: y = (x^lambda - 1) / lambda
/// For lambda == 0: y = ln(x)
///
/// Non-positive values map to NaN.
pub fn boxcox(series: &[f64], lambda: f64) -> Vec<f64> {
    series
        .iter()
        .map(|&x| {
            if x <= 0.0 {
                f64::NAN
            } else if lambda.abs() < 1e-10 {
                x.ln()
            } else {
                (x.powf(lambda) - 1.0) / lambda
            }
        })
        .collect()
}

/// Profile log-likelihood of the Box-Cox model at `lambda`.
///
/// `llf = (lambda - 1) * sum(ln x) - n/2 * ln(var(y))` with `var` the
/// population variance of the transformed data.
pub fn boxcox_llf(series: &[f64], lambda: f64) -> f64 {
    let n = series.len();
    if n < 2 {
        return f64::NEG_INFINITY;
    }

    let transformed = boxcox(series, lambda);
    if transformed.iter().any(|x| !x.is_finite()) {
        return f64::NEG_INFINITY;
    }

    let variance = population_variance(&transformed);
    if variance <= 0.0 || !variance.is_finite() {
        return f64::NEG_INFINITY;
    }

    let log_sum: f64 = series.iter().map(|x| x.ln()).sum();
    (lambda - 1.0) * log_sum - 0.5 * n as f64 * variance.ln()
}

/// Maximum-likelihood Box-Cox lambda.
///
/// A coarse grid over [-2, 2] locates the maximum. When it sits on an edge
/// of the grid the bracket is widened outward while the log-likelihood keeps
/// improving, so the estimate is not bounded by the grid. The bracket is then
/// refined by golden-section search.
///
/// # Errors
/// * `InsufficientData` for fewer than 2 values
/// * `InvalidInput` if any value is not strictly positive
/// * `ComputationError` if the data is constant
pub fn boxcox_lambda(series: &[f64]) -> Result<f64> {
    if series.len() < 2 {
        return Err(DiagnosticsError::InsufficientData {
            needed: 2,
            got: series.len(),
        });
    }
    if !is_boxcox_suitable(series) {
        return Err(DiagnosticsError::InvalidInput(
            "Box-Cox requires strictly positive data".into(),
        ));
    }
    if is_constant(series) {
        return Err(DiagnosticsError::ComputationError(
            "Box-Cox lambda is undefined for constant data".into(),
        ));
    }

    let llf = |lambda: f64| boxcox_llf(series, lambda);

    let step = (GRID_MAX - GRID_MIN) / GRID_STEPS as f64;
    let mut best_index = 0;
    let mut best_llf = f64::NEG_INFINITY;
    for i in 0..=GRID_STEPS {
        let value = llf(GRID_MIN + step * i as f64);
        if value > best_llf {
            best_llf = value;
            best_index = i;
        }
    }

    if !best_llf.is_finite() {
        return Err(DiagnosticsError::ComputationError(
            "Box-Cox log-likelihood is not finite on the search interval".into(),
        ));
    }

    let best_lambda = GRID_MIN + step * best_index as f64;
    let (lo, hi) = if best_index == GRID_STEPS {
        expand_bracket(&llf, best_lambda - step, best_lambda, step)
    } else if best_index == 0 {
        let (a, b) = expand_bracket(&|l: f64| llf(-l), -best_lambda - step, -best_lambda, step);
        (-b, -a)
    } else {
        (best_lambda - step, best_lambda + step)
    };

    let refined = golden_section_max(&llf, lo, hi);
    let best_llf = llf(best_lambda);
    if llf(refined) >= best_llf {
        Ok(refined)
    } else {
        Ok(best_lambda)
    }
}

/// Walk upward from `peak` with growing steps until `f` stops improving.
///
/// Returns an interval `(lo, hi)` containing the maximum.
fn expand_bracket<F>(f: &F, mut lo: f64, mut peak: f64, step: f64) -> (f64, f64)
where
    F: Fn(f64) -> f64,
{
    let mut width = step;
    let mut f_peak = f(peak);

    for _ in 0..MAX_EXPANSIONS {
        let next = peak + width;
        let f_next = f(next);
        if f_next.is_nan() || f_next <= f_peak {
            return (lo, next);
        }
        lo = peak;
        peak = next;
        f_peak = f_next;
        width *= GOLDEN_GROWTH;
    }

    (lo, peak + width)
}

/// Check if data is suitable for Box-Cox transformation.
///
/// Returns true if all values are positive.
pub fn is_boxcox_suitable(series: &[f64]) -> bool {
    !series.is_empty() && series.iter().all(|&x| x > 0.0)
}

fn golden_section_max<F>(f: &F, mut a: f64, mut b: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    let inv_phi = (5.0_f64.sqrt() - 1.0) / 2.0;
    let mut c = b - inv_phi * (b - a);
    let mut d = a + inv_phi * (b - a);
    let mut fc = f(c);
    let mut fd = f(d);

    while (b - a).abs() > LAMBDA_TOL {
        if fc > fd {
            b = d;
            d = c;
            fd = fc;
            c = b - inv_phi * (b - a);
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + inv_phi * (b - a);
            fd = f(d);
        }
    }

    (a + b) / 2.0
}
