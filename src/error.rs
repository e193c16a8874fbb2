//! Error types for the demand-forecast engine.

use thiserror::Error;

/// Result type alias for forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while building series, fitting models, or
/// deriving recommendations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input is malformed: a missing required field, an unparseable date,
    /// a zero forecast horizon, or a forecast shorter than the lead time.
    #[error("validation error: {0}")]
    Validation(String),

    /// A strategy cannot fit on the data it received.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The optional backend for a strategy is not compiled in.
    ///
    /// Caught and converted to member exclusion inside [`Ensemble`], but
    /// surfaced directly when the caller requested that single strategy.
    ///
    /// [`Ensemble`]: crate::models::Ensemble
    #[error("strategy unavailable: {0}")]
    StrategyUnavailable(String),

    /// `predict` was called before a successful `fit`.
    #[error("model must be fitted before prediction")]
    NotFitted,
}

impl ForecastError {
    /// Shorthand for a [`ForecastError::Validation`] with a formatted message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for a missing-field validation error.
    pub fn missing_field(field: &str) -> Self {
        Self::Validation(format!("missing required field: {field}"))
    }
}
