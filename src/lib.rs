//! # tsdiag
//!
//! Diagnostics for a single fixed-frequency time series.
//!
//! Computes ACF and PACF with confidence bands, Box-Pierce and Ljung-Box
//! tests at every lag, unit-root and stationarity tests (ADF, KPSS, Phillips-Perron)
//! and normality tests (Shapiro-Wilk, Kolmogorov-Smirnov, Box-Cox lambda),
//! assembled into one report.
//!
//! ```
//! use tsdiag::prelude::*;
//!
//! let series: Vec<f64> = (1..=40).map(|i| i as f64 + (i as f64).sin()).collect();
//! let report = analyze(&series, &AnalysisConfig::default().with_lag(8).with_seed(1)).unwrap();
//! assert_eq!(report.lags.len(), 8);
//! ```

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod error;
pub mod features;
pub mod report;
pub mod transform;
pub mod utils;
pub mod validation;

pub use error::{DiagnosticsError, Result};

pub mod prelude {
    pub use crate::core::TimeSeries;
    pub use crate::error::{DiagnosticsError, Result};
    pub use crate::report::{
        analyze, analyze_time_series, run, AnalysisConfig, Collaborators, DiagnosticsReport,
    };
    pub use crate::transform::TransformMode;
    pub use crate::utils::quantile_normal;
    pub use crate::validation::{CiMethod, NormalityReport, PhillipsPerronMethod};
}
