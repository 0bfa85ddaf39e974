//! Autocorrelation structure of a series.
//!
//! # Example
//!
//! ```
//! use tsdiag::features::{acf, pacf};
//!
//! let series = vec![1.0, 3.0, 2.0, 5.0, 4.0, 6.0, 5.0, 8.0];
//!
//! let r = acf(&series, 3).unwrap();
//! let p = pacf(&series, 3).unwrap();
//! assert_eq!(r[0], 1.0);
//! assert_eq!(p[0], 1.0);
//! ```

pub mod autocorrelation;

pub use autocorrelation::{acf, autocovariance, pacf, pacf_from_acf};
