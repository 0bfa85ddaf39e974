//! Statistical diagnostics for a working series.
//!
//! Provides confidence bands for correlograms, portmanteau tests for serial
//! correlation, unit-root and stationarity tests, and normality tests.
//!
//! # Example
//!
//! ```
//! use tsdiag::validation::{adf_test, kpss_test, portmanteau, AdfOptions, KpssRegression};
//!
//! let series = vec![0.3, -0.2, 0.15, -0.1, 0.05, -0.08, 0.12, -0.15, 0.1, -0.05, 0.2, -0.1];
//!
//! // Check for serial correlation at lags 1..=3
//! let rows = portmanteau(&series, 3).unwrap();
//! println!("Ljung-Box Q(3) = {:.3}, p = {:.3}", rows[2].ljung_box, rows[2].ljung_box_p_value);
//!
//! // Test stationarity
//! let adf = adf_test(&series, &AdfOptions::default()).unwrap();
//! let kpss = kpss_test(&series, KpssRegression::Level, None).unwrap();
//! println!("ADF p = {:.3}, KPSS p = {:.3}", adf.p_value, kpss.p_value);
//! ```

pub mod confidence;
pub mod normality;
pub mod stationarity;

pub use confidence::{confidence_bands, normal_band_scale, CiMethod};

pub use normality::{
    kolmogorov_smirnov_normal, ks_two_sample, normal_reference_sample, normality_tests,
    shapiro_wilk, KolmogorovSmirnovResult, NormalityReport, NormalityRow, NormalityTest,
    ShapiroWilkResult, TestOutcome,
};

pub use residual_tests::{portmanteau, portmanteau_from_acf, PortmanteauLag};

pub use stationarity::{
    adf_test, kpss_test, mackinnon_critical_values, mackinnon_p_value, phillips_perron,
    AdfOptions, CriticalValues, KpssRegression, PhillipsPerronMethod, StationarityResult,
};
