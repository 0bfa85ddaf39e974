//! Report assembly: runs the full diagnostic pipeline on one series.
//!
//! The pipeline transforms the raw series, computes ACF/PACF with their
//! confidence bands, runs the portmanteau tests at every lag, then the
//! stationarity and normality tests on the working series. The result is a
//! [`DiagnosticsReport`] holding three tables.
//!
//! # Example
//!
//! ```
//! use tsdiag::report::{analyze, AnalysisConfig};
//! use tsdiag::validation::CiMethod;
//!
//! let series: Vec<f64> = (0..60).map(|i| (i as f64 * 0.7).sin() + 2.0).collect();
//! let config = AnalysisConfig::default()
//!     .with_lag(12)
//!     .with_ci_method(CiMethod::Ma)
//!     .with_seed(7);
//!
//! let report = analyze(&series, &config).unwrap();
//! assert_eq!(report.lags.len(), 12);
//! assert_eq!(report.stationarity.len(), 4);
//! assert_eq!(report.normality.rows().len(), 3);
//! ```

pub mod collaborators;

pub use collaborators::{Collaborators, CsvExporter, Presenter, TableExporter};

use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::core::TimeSeries;
use crate::error::{DiagnosticsError, Result};
use crate::features::autocorrelation::{acf, pacf_from_acf};
use crate::transform::{transform_series, TransformMode};
use crate::validation::{
    adf_test, confidence_bands, kpss_test, normal_band_scale, normality_tests, phillips_perron,
    portmanteau_from_acf, AdfOptions, CiMethod, KpssRegression, NormalityReport,
    PhillipsPerronMethod, StationarityResult,
};

/// Options for one diagnostic run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Maximum lag for the correlogram and portmanteau tables.
    pub lag: usize,
    /// Confidence-band assumption.
    pub ci_method: CiMethod,
    /// Confidence level in (0, 1).
    pub ci: f64,
    /// Transform applied before any diagnostic.
    pub delta: TransformMode,
    /// Hand the report to a presenter.
    pub interactive: bool,
    /// Hand the report to a table exporter.
    pub download: bool,
    /// Seed for the Kolmogorov-Smirnov reference sample (None for entropy).
    pub seed: Option<u64>,
    /// Phillips-Perron strategy.
    pub pp_method: PhillipsPerronMethod,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lag: 72,
            ci_method: CiMethod::White,
            ci: 0.95,
            delta: TransformMode::Levels,
            interactive: false,
            download: false,
            seed: None,
            pp_method: PhillipsPerronMethod::LongRunVariance,
        }
    }
}

impl AnalysisConfig {
    /// Set the maximum lag.
    pub fn with_lag(mut self, lag: usize) -> Self {
        self.lag = lag;
        self
    }

    /// Set the confidence-band method.
    pub fn with_ci_method(mut self, method: CiMethod) -> Self {
        self.ci_method = method;
        self
    }

    /// Set the confidence level.
    pub fn with_ci(mut self, ci: f64) -> Self {
        self.ci = ci;
        self
    }

    /// Set the transform.
    pub fn with_delta(mut self, delta: TransformMode) -> Self {
        self.delta = delta;
        self
    }

    /// Route the report to a presenter.
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Route the report to a table exporter.
    pub fn with_download(mut self, download: bool) -> Self {
        self.download = download;
        self
    }

    /// Fix the random seed for reproducible reports.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the Phillips-Perron strategy.
    pub fn with_pp_method(mut self, method: PhillipsPerronMethod) -> Self {
        self.pp_method = method;
        self
    }

    /// Build a config from textual key/value options, starting from defaults.
    ///
    /// Recognised keys: `lag`, `ci_method`, `ci`, `delta`, `interactive`,
    /// `download`, `seed`, `pp_method` (`lrv` or `diffreg`).
    ///
    /// # Example
    /// ```
    /// use tsdiag::report::AnalysisConfig;
    /// use tsdiag::transform::TransformMode;
    ///
    /// let config = AnalysisConfig::from_options(&[("lag", "24"), ("delta", "diff1")]).unwrap();
    /// assert_eq!(config.lag, 24);
    /// assert_eq!(config.delta, TransformMode::Diff1);
    /// ```
    pub fn from_options(options: &[(&str, &str)]) -> Result<Self> {
        let mut config = Self::default();

        for &(key, value) in options {
            match key.trim() {
                "lag" => config.lag = parse_value(key, value)?,
                "ci_method" => config.ci_method = value.parse()?,
                "ci" => config.ci = parse_value(key, value)?,
                "delta" => config.delta = value.parse()?,
                "interactive" => config.interactive = parse_value(key, value)?,
                "download" => config.download = parse_value(key, value)?,
                "seed" => config.seed = Some(parse_value(key, value)?),
                "pp_method" => {
                    config.pp_method = match value.trim().to_ascii_lowercase().as_str() {
                        "lrv" | "long_run_variance" => PhillipsPerronMethod::LongRunVariance,
                        "diffreg" | "difference_regression" => {
                            PhillipsPerronMethod::DifferenceRegression
                        }
                        _ => {
                            return Err(DiagnosticsError::InvalidParameter(format!(
                                "unknown pp_method '{}'",
                                value
                            )))
                        }
                    }
                }
                _ => {
                    return Err(DiagnosticsError::InvalidParameter(format!(
                        "unknown option '{}'",
                        key
                    )))
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the numeric options.
    pub fn validate(&self) -> Result<()> {
        if !(self.ci > 0.0 && self.ci < 1.0) {
            return Err(DiagnosticsError::InvalidParameter(format!(
                "confidence level must lie in (0, 1), got {}",
                self.ci
            )));
        }
        if self.lag == 0 {
            return Err(DiagnosticsError::InvalidLag("lag must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        DiagnosticsError::InvalidParameter(format!("cannot parse '{}' for option '{}'", value, key))
    })
}

/// One row of the per-lag table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagRow {
    pub lag: usize,
    pub acf: f64,
    pub pacf: f64,
    pub box_pierce: f64,
    pub box_pierce_p_value: f64,
    pub ljung_box: f64,
    pub ljung_box_p_value: f64,
}

/// Stationarity tests in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationarityTest {
    Adf,
    KpssLevel,
    KpssTrend,
    PhillipsPerron,
}

impl StationarityTest {
    /// Table order.
    pub const ALL: [StationarityTest; 4] = [
        StationarityTest::Adf,
        StationarityTest::KpssLevel,
        StationarityTest::KpssTrend,
        StationarityTest::PhillipsPerron,
    ];

    /// Display name used in result tables.
    pub fn name(&self) -> &'static str {
        match self {
            StationarityTest::Adf => "ADF",
            StationarityTest::KpssLevel => "KPSS-Level",
            StationarityTest::KpssTrend => "KPSS-Trend",
            StationarityTest::PhillipsPerron => "PP",
        }
    }
}

impl fmt::Display for StationarityTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the stationarity table; `None` cells mark a test that could not run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationarityRow {
    pub test: StationarityTest,
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    /// Lag order used by the test
    pub lags: Option<usize>,
}

impl StationarityRow {
    fn from_outcome(test: StationarityTest, outcome: &Result<StationarityResult>) -> Self {
        match outcome {
            Ok(r) => Self {
                test,
                statistic: finite(r.statistic),
                p_value: finite(r.p_value),
                lags: Some(r.lags),
            },
            Err(err) => {
                warn!(test = test.name(), %err, "stationarity test skipped");
                Self {
                    test,
                    statistic: None,
                    p_value: None,
                    lags: None,
                }
            }
        }
    }

    /// Whether the test ran.
    pub fn is_defined(&self) -> bool {
        self.statistic.is_some()
    }
}

/// NaN becomes an undefined cell; infinite statistics of exact fits are kept.
fn finite(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// Confidence band half-widths for lags `1..=L`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceBands {
    pub acf: Vec<f64>,
    pub pacf: Vec<f64>,
    /// Base half-width `z / sqrt(n)`
    pub scale: f64,
}

/// Output of one diagnostic run.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticsReport {
    /// Per-lag table, lags `1..=effective_lag`
    pub lags: Vec<LagRow>,
    /// ADF, KPSS-Level, KPSS-Trend, PP
    pub stationarity: Vec<StationarityRow>,
    pub normality: NormalityReport,
    pub bands: ConfidenceBands,
    /// Lag bound after clamping to the working length
    pub effective_lag: usize,
    pub transform: TransformMode,
    /// Length of the transformed series
    pub working_len: usize,
}

impl DiagnosticsReport {
    /// Stationarity row for `test`.
    pub fn stationarity_row(&self, test: StationarityTest) -> Option<&StationarityRow> {
        self.stationarity.iter().find(|row| row.test == test)
    }
}

/// Run the diagnostic pipeline on a raw series.
///
/// # Errors
/// * `InvalidInput` for an empty series or non-finite values
/// * `InsufficientData` if the series is too short for the requested transform
/// * `InvalidLag` for a zero lag or a working series of length 1
/// * `InvalidParameter` for a confidence level outside (0, 1)
///
/// Failures inside individual stationarity or normality tests do not abort
/// the run; their rows are left undefined.
pub fn analyze(series: &[f64], config: &AnalysisConfig) -> Result<DiagnosticsReport> {
    config.validate()?;

    let working = transform_series(series, config.delta)?;
    let n = working.len();
    debug!(transform = %config.delta, working_len = n, "series transformed");

    let effective_lag = if config.lag >= n {
        let clamped = n.saturating_sub(1);
        debug!(requested = config.lag, clamped, "lag clamped to series length");
        clamped
    } else {
        config.lag
    };
    if effective_lag == 0 {
        return Err(DiagnosticsError::InvalidLag(format!(
            "working series of length {} leaves no lags to compute",
            n
        )));
    }
    debug!(effective_lag, "computing correlogram");

    let r = acf(&working, effective_lag)?;
    let partial = pacf_from_acf(&r);
    let portmanteau = portmanteau_from_acf(&r, n);

    let bands = ConfidenceBands {
        acf: confidence_bands(&r[1..], n, config.ci, config.ci_method)?,
        pacf: confidence_bands(&partial[1..], n, config.ci, config.ci_method)?,
        scale: normal_band_scale(n, config.ci)?,
    };

    let lags = portmanteau
        .iter()
        .map(|p| LagRow {
            lag: p.lag,
            acf: r[p.lag],
            pacf: partial[p.lag],
            box_pierce: p.box_pierce,
            box_pierce_p_value: p.box_pierce_p_value,
            ljung_box: p.ljung_box,
            ljung_box_p_value: p.ljung_box_p_value,
        })
        .collect();

    let stationarity = stationarity_rows(&working, config.pp_method);

    let mut rng: StdRng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let normality = normality_tests(&working, &mut rng);

    Ok(DiagnosticsReport {
        lags,
        stationarity,
        normality,
        bands,
        effective_lag,
        transform: config.delta,
        working_len: n,
    })
}

/// Run the diagnostic pipeline on the values of a dated series.
pub fn analyze_time_series(
    series: &TimeSeries,
    config: &AnalysisConfig,
) -> Result<DiagnosticsReport> {
    if let Some(label) = series.label() {
        debug!(label, len = series.len(), "analysing time series");
    }
    analyze(series.values(), config)
}

/// Analyse a series and hand the report to the configured collaborators.
///
/// The presenter is called when `config.interactive` is set and the exporter
/// when `config.download` is set. A requested but missing collaborator is
/// logged and skipped. Collaborator failures propagate.
pub fn run(
    series: &[f64],
    config: &AnalysisConfig,
    collaborators: &mut Collaborators,
) -> Result<DiagnosticsReport> {
    let report = analyze(series, config)?;

    if config.interactive {
        match collaborators.presenter.as_mut() {
            Some(presenter) => presenter.present(&report)?,
            None => warn!("interactive output requested but no presenter is configured"),
        }
    }

    if config.download {
        match collaborators.exporter.as_mut() {
            Some(exporter) => exporter.export(&report)?,
            None => warn!("download requested but no exporter is configured"),
        }
    }

    Ok(report)
}

fn stationarity_rows(working: &[f64], pp_method: PhillipsPerronMethod) -> Vec<StationarityRow> {
    let adf = adf_test(working, &AdfOptions::default());
    let kpss_level = kpss_test(working, KpssRegression::Level, None);
    let kpss_trend = kpss_test(working, KpssRegression::Trend, None);
    let pp = match (&adf, pp_method) {
        (Ok(adf_result), PhillipsPerronMethod::DifferenceRegression) => {
            phillips_perron(working, pp_method, Some(adf_result))
        }
        _ => phillips_perron(working, pp_method, None),
    };

    vec![
        StationarityRow::from_outcome(StationarityTest::Adf, &adf),
        StationarityRow::from_outcome(StationarityTest::KpssLevel, &kpss_level),
        StationarityRow::from_outcome(StationarityTest::KpssTrend, &kpss_trend),
        StationarityRow::from_outcome(StationarityTest::PhillipsPerron, &pp),
    ]
}
