//! Series transformation: levels or repeated first differences.

use std::fmt;
use std::str::FromStr;

use crate::error::{DiagnosticsError, Result};

/// How the raw series is turned into the working series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformMode {
    /// Use the series unchanged.
    #[default]
    Levels,
    /// First difference.
    Diff1,
    /// Second difference.
    Diff2,
    /// Third difference.
    Diff3,
}

impl TransformMode {
    /// Differencing order applied by this mode.
    pub fn order(&self) -> usize {
        match self {
            TransformMode::Levels => 0,
            TransformMode::Diff1 => 1,
            TransformMode::Diff2 => 2,
            TransformMode::Diff3 => 3,
        }
    }

    /// Canonical option string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformMode::Levels => "levels",
            TransformMode::Diff1 => "diff1",
            TransformMode::Diff2 => "diff2",
            TransformMode::Diff3 => "diff3",
        }
    }

    /// Validate `series` and produce the working series.
    pub fn apply(&self, series: &[f64]) -> Result<Vec<f64>> {
        transform_series(series, *self)
    }
}

impl fmt::Display for TransformMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformMode {
    type Err = DiagnosticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "levels" => Ok(TransformMode::Levels),
            "diff1" => Ok(TransformMode::Diff1),
            "diff2" => Ok(TransformMode::Diff2),
            "diff3" => Ok(TransformMode::Diff3),
            _ => Err(DiagnosticsError::InvalidTransform(s.to_string())),
        }
    }
}

/// Apply `d` rounds of first differencing.
///
/// Each round shortens the series by one. A series that runs out of values
/// comes back empty.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Check that a series is non-empty and contains only finite values.
pub fn validate_series(series: &[f64]) -> Result<()> {
    if series.is_empty() {
        return Err(DiagnosticsError::InvalidInput("series is empty".into()));
    }
    if let Some(pos) = series.iter().position(|x| !x.is_finite()) {
        return Err(DiagnosticsError::InvalidInput(format!(
            "non-numeric value {} at position {}",
            series[pos], pos
        )));
    }
    Ok(())
}

/// Validate `series` and transform it according to `mode`.
///
/// # Errors
/// * `InvalidInput` for an empty series or non-finite values
/// * `InsufficientData` if the series has no more than `k` values for `Diff_k`
pub fn transform_series(series: &[f64], mode: TransformMode) -> Result<Vec<f64>> {
    validate_series(series)?;

    let order = mode.order();
    if series.len() <= order {
        return Err(DiagnosticsError::InsufficientData {
            needed: order + 1,
            got: series.len(),
        });
    }

    Ok(difference(series, order))
}
