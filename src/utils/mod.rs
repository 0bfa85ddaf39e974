//! Numeric helpers shared by the diagnostics.

pub mod ols;
pub mod stats;

pub use ols::{ols_fit, OlsFit};
pub use stats::{chi_squared_sf, normal_cdf, normal_sf, quantile_normal};
