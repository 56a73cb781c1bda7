//! Error types for the sales_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// The input table lacks columns the pipeline needs
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// No rows exist for the requested product
    #[error("Insufficient data: no rows for product '{0}'")]
    InsufficientData(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Model fitting or forecasting failed for a single series
    #[error("Model fitting error: {0}")]
    Fit(#[from] FitError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error while writing CSV output
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error while writing the JSON outcome report
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Reasons a model could not be fitted to one series.
///
/// These never abort a batch; the forecaster turns them into a skipped
/// outcome for the affected product.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("need at least {required} observations, got {actual}")]
    InsufficientObservations { required: usize, actual: usize },

    #[error("least squares system is singular")]
    SingularSystem,

    #[error("objective is not finite at the starting parameters")]
    NonFiniteObjective,

    #[error("optimizer did not converge after {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("fit exceeded its {limit_ms} ms time budget")]
    TimedOut { limit_ms: u128 },

    #[error("forecast produced non-finite values")]
    NonFiniteForecast,
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
