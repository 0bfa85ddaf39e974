//! Confidence bands for ACF and PACF plots.

use std::fmt;
use std::str::FromStr;

use crate::error::{DiagnosticsError, Result};
use crate::utils::stats::quantile_normal;

/// Assumption behind the confidence band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CiMethod {
    /// Constant band under a white-noise null.
    #[default]
    White,
    /// Bartlett band that widens with the squared correlations at earlier lags.
    Ma,
}

impl CiMethod {
    /// Canonical option string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CiMethod::White => "white",
            CiMethod::Ma => "ma",
        }
    }
}

impl fmt::Display for CiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CiMethod {
    type Err = DiagnosticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Ok(CiMethod::White),
            "ma" => Ok(CiMethod::Ma),
            _ => Err(DiagnosticsError::InvalidCIMethod(s.to_string())),
        }
    }
}

fn check_ci(ci: f64) -> Result<()> {
    if !(ci > 0.0 && ci < 1.0) {
        return Err(DiagnosticsError::InvalidParameter(format!(
            "confidence level must lie in (0, 1), got {}",
            ci
        )));
    }
    Ok(())
}

/// Base band half-width `Φ⁻¹((1 + ci) / 2) / √n`.
///
/// # Errors
/// * `InvalidParameter` if `ci` is outside (0, 1)
/// * `InvalidInput` if `n` is 0
pub fn normal_band_scale(n: usize, ci: f64) -> Result<f64> {
    check_ci(ci)?;
    if n == 0 {
        return Err(DiagnosticsError::InvalidInput(
            "band scale needs a non-empty series".into(),
        ));
    }
    Ok(quantile_normal((1.0 + ci) / 2.0) / (n as f64).sqrt())
}

/// Band half-widths for lags `1..=values.len()`.
///
/// `values[i]` is the correlation at lag `i + 1` (lag 0 excluded). For
/// [`CiMethod::Ma`] the band at lag `k` is `z * sqrt(1 + 2 * sum_{i<k} values[i]^2)`
/// where the sum runs over the lags before `k`.
///
/// # Example
/// ```
/// use tsdiag::validation::{confidence_bands, CiMethod};
///
/// let r = vec![0.5, 0.3, 0.1];
/// let white = confidence_bands(&r, 100, 0.95, CiMethod::White).unwrap();
/// let ma = confidence_bands(&r, 100, 0.95, CiMethod::Ma).unwrap();
/// assert_eq!(white[0], ma[0]);
/// assert!(ma[2] > white[2]);
/// ```
pub fn confidence_bands(values: &[f64], n: usize, ci: f64, method: CiMethod) -> Result<Vec<f64>> {
    let z = normal_band_scale(n, ci)?;

    match method {
        CiMethod::White => Ok(vec![z; values.len()]),
        CiMethod::Ma => {
            let mut cumulative: f64 = 0.0;
            Ok(values
                .iter()
                .map(|v| {
                    let band = z * (1.0 + 2.0 * cumulative).sqrt();
                    cumulative += v * v;
                    band
                })
                .collect())
        }
    }
}
