//! Series transformations.
//!
//! Provides the levels/difference transform that produces the working series
//! and the Box-Cox transform used by the normality diagnostics.
//!
//! # Example
//!
//! ```
//! use tsdiag::transform::{boxcox_lambda, TransformMode};
//!
//! let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
//!
//! // First difference
//! let working = TransformMode::Diff1.apply(&series).unwrap();
//! assert_eq!(working, vec![2.0, 3.0, 4.0, 5.0]);
//!
//! // Maximum-likelihood Box-Cox lambda
//! let lambda = boxcox_lambda(&series).unwrap();
//! assert!((-2.0..=2.0).contains(&lambda));
//! ```

pub mod boxcox;
pub mod difference;

pub use boxcox::{boxcox, boxcox_lambda, boxcox_llf, is_boxcox_suitable};
pub use difference::{difference, transform_series, validate_series, TransformMode};
