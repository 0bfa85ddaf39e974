//! Ordinary Least Squares (OLS) regression for the unit-root and KPSS tests.
//!
//! The design matrix is passed column by column. Fitting uses a Householder
//! QR decomposition so that near-collinear designs (a constant lagged
//! difference next to the intercept, for example) are detected instead of
//! silently producing meaningless standard errors.

use crate::error::{DiagnosticsError, Result};

/// Relative tolerance on |R_jj| / ||x_j|| below which a column is considered
/// linearly dependent on the preceding ones.
const RANK_TOL: f64 = 1e-10;

/// Relative residual sum of squares below which a fit is treated as exact.
const EXACT_FIT_TOL: f64 = 1e-20;

/// Fitted OLS regression.
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// Regression coefficients, one per design column.
    pub coefficients: Vec<f64>,
    /// Standard errors of the coefficients.
    pub std_errors: Vec<f64>,
    /// Residuals `y - X beta`.
    pub residuals: Vec<f64>,
    /// Residual sum of squares.
    pub rss: f64,
    /// Number of observations.
    pub nobs: usize,
    /// Residual degrees of freedom (`nobs - k`).
    pub df_resid: usize,
    exact_fit: bool,
    column_max_abs: Vec<f64>,
    y_max_abs: f64,
}

impl OlsFit {
    /// Number of estimated coefficients.
    pub fn num_params(&self) -> usize {
        self.coefficients.len()
    }

    /// Residual variance `rss / df_resid`.
    pub fn sigma2(&self) -> f64 {
        self.rss / self.df_resid as f64
    }

    /// Whether the regression reproduces the dependent variable exactly.
    pub fn is_exact_fit(&self) -> bool {
        self.exact_fit
    }

    /// Gaussian log-likelihood of the fit.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + (self.rss / n).ln() + 1.0)
    }

    /// Akaike information criterion, `-2 llf + 2 k`.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.num_params() as f64
    }

    /// t-value of coefficient `index`.
    ///
    /// An exact fit has zero standard errors; the t-value is then 0 when the
    /// coefficient is numerically zero and signed infinity otherwise.
    pub fn t_value(&self, index: usize) -> f64 {
        let coef = self.coefficients[index];
        if self.exact_fit {
            let contribution = (coef * self.column_max_abs[index]).abs();
            if contribution <= 1e-8 * self.y_max_abs {
                return 0.0;
            }
            return coef.signum() * f64::INFINITY;
        }
        coef / self.std_errors[index]
    }
}

/// Fit `y = X beta` where `columns` holds the columns of `X`.
///
/// Include a column of ones to estimate an intercept.
///
/// # Errors
/// * `InvalidParameter` if column lengths differ from `y`
/// * `InsufficientData` if there are not more observations than columns
/// * `ComputationError` if the design matrix is rank deficient
pub fn ols_fit(y: &[f64], columns: &[Vec<f64>]) -> Result<OlsFit> {
    let n = y.len();
    let k = columns.len();

    if k == 0 {
        return Err(DiagnosticsError::InvalidParameter(
            "OLS requires at least one regressor".into(),
        ));
    }
    for col in columns {
        if col.len() != n {
            return Err(DiagnosticsError::InvalidParameter(format!(
                "regressor length {} does not match {} observations",
                col.len(),
                n
            )));
        }
    }
    if n <= k {
        return Err(DiagnosticsError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }

    let (r, qty) = householder_qr(columns, y)?;

    // Back substitution: R beta = (Q'y)[..k]
    let mut beta = vec![0.0; k];
    for i in (0..k).rev() {
        let mut sum = qty[i];
        for j in (i + 1)..k {
            sum -= r[j][i] * beta[j];
        }
        beta[i] = sum / r[i][i];
    }

    let residuals: Vec<f64> = (0..n)
        .map(|obs| {
            let fitted: f64 = columns
                .iter()
                .zip(beta.iter())
                .map(|(col, b)| col[obs] * b)
                .sum();
            y[obs] - fitted
        })
        .collect();
    let rss: f64 = residuals.iter().map(|e| e * e).sum();
    let df_resid = n - k;

    let yss: f64 = y.iter().map(|v| v * v).sum();
    let exact_fit = rss <= EXACT_FIT_TOL * yss;

    // diag((X'X)^-1) = row sums of squares of R^-1
    let r_inv = invert_upper(&r, k);
    let sigma2 = rss / df_resid as f64;
    let std_errors: Vec<f64> = (0..k)
        .map(|i| {
            let d: f64 = (i..k).map(|j| r_inv[j][i] * r_inv[j][i]).sum();
            (sigma2 * d).sqrt()
        })
        .collect();

    let column_max_abs = columns
        .iter()
        .map(|col| col.iter().fold(0.0_f64, |m, v| m.max(v.abs())))
        .collect();
    let y_max_abs = y.iter().fold(0.0_f64, |m, v| m.max(v.abs()));

    Ok(OlsFit {
        coefficients: beta,
        std_errors,
        residuals,
        rss,
        nobs: n,
        df_resid,
        exact_fit,
        column_max_abs,
        y_max_abs,
    })
}

/// Householder QR of the column-major design, applied to `y` as well.
///
/// Returns `R` stored column-major (`r[col][row]`, upper triangle only) and `Q'y`.
fn householder_qr(columns: &[Vec<f64>], y: &[f64]) -> Result<(Vec<Vec<f64>>, Vec<f64>)> {
    let n = y.len();
    let k = columns.len();
    let mut a: Vec<Vec<f64>> = columns.to_vec();
    let mut qty = y.to_vec();

    let original_norms: Vec<f64> = columns
        .iter()
        .map(|col| col.iter().map(|v| v * v).sum::<f64>().sqrt())
        .collect();

    for j in 0..k {
        let norm = a[j][j..].iter().map(|v| v * v).sum::<f64>().sqrt();
        if original_norms[j] == 0.0 || norm <= RANK_TOL * original_norms[j] {
            return Err(DiagnosticsError::ComputationError(format!(
                "design matrix is rank deficient at column {}",
                j
            )));
        }

        let alpha = if a[j][j] > 0.0 { -norm } else { norm };
        let mut v: Vec<f64> = a[j][j..].to_vec();
        v[0] -= alpha;
        let v_norm_sq: f64 = v.iter().map(|x| x * x).sum();

        if v_norm_sq > 0.0 {
            for col in a.iter_mut().skip(j) {
                reflect(&mut col[j..], &v, v_norm_sq);
            }
            reflect(&mut qty[j..], &v, v_norm_sq);
        }
        a[j][j] = alpha;
        for value in a[j][(j + 1)..n].iter_mut() {
            *value = 0.0;
        }
    }

    Ok((a, qty))
}

/// Apply the reflector `I - 2 v v' / (v'v)` in place.
fn reflect(target: &mut [f64], v: &[f64], v_norm_sq: f64) {
    let s: f64 = target.iter().zip(v.iter()).map(|(t, vi)| t * vi).sum();
    let factor = 2.0 * s / v_norm_sq;
    for (t, vi) in target.iter_mut().zip(v.iter()) {
        *t -= factor * vi;
    }
}

/// Invert the k×k upper-triangular `R` (column-major). Result is column-major.
fn invert_upper(r: &[Vec<f64>], k: usize) -> Vec<Vec<f64>> {
    let mut inv = vec![vec![0.0; k]; k];
    for col in 0..k {
        // Solve R x = e_col
        for i in (0..=col).rev() {
            let mut sum = if i == col { 1.0 } else { 0.0 };
            for j in (i + 1)..=col {
                sum -= r[j][i] * inv[col][j];
            }
            inv[col][i] = sum / r[i][i];
        }
    }
    inv
}
