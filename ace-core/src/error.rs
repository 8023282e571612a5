//! Error types for core operations.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A curve description could not be parsed.
    #[error("Invalid curve: {0}")]
    InvalidCurve(String),

    /// A color literal could not be parsed.
    #[error("Invalid color: {0}")]
    InvalidColor(String),
}
