//! Error types for the tsdiag library.

use thiserror::Error;

/// Result type alias for diagnostic operations.
pub type Result<T> = std::result::Result<T, DiagnosticsError>;

/// Errors that can occur while analysing a series.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagnosticsError {
    /// Input series is empty, too short, or contains non-finite values.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unrecognised transform (delta) mode.
    #[error("invalid transform '{0}': expected one of levels, diff1, diff2, diff3")]
    InvalidTransform(String),

    /// Lag bound is zero or unusable after clamping.
    #[error("invalid lag: {0}")]
    InvalidLag(String),

    /// Unrecognised confidence-band method.
    #[error("invalid confidence-band method '{0}': expected white or ma")]
    InvalidCIMethod(String),

    /// Insufficient data points for a sub-test.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Computation error (e.g., numerical issues, degenerate data).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// A presentation or export collaborator failed.
    #[error("export failed: {0}")]
    Export(String),
}

impl From<std::io::Error> for DiagnosticsError {
    fn from(err: std::io::Error) -> Self {
        DiagnosticsError::Export(err.to_string())
    }
}
