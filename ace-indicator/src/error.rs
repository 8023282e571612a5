//! Indicator error types.

use thiserror::Error;

/// Result type for indicator operations.
pub type IndicatorResult<T> = Result<T, IndicatorError>;

/// Errors that can occur while configuring an indicator.
#[derive(Debug, Error)]
pub enum IndicatorError {
    /// The windowed layout cannot be used with this configuration.
    ///
    /// Callers fall back to the unbounded layout instead of failing.
    #[error("Invalid geometry request: {0}")]
    InvalidGeometryRequest(String),

    /// Configuration serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
