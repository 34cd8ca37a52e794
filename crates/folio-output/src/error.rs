//! Error types for backtesting and export.

use folio_data::DataError;
use folio_risk::RiskError;
use thiserror::Error;

/// Errors raised by the backtest engine and exporters.
#[derive(Debug, Error)]
pub enum OutputError {
    /// A returns column has no weight
    #[error("No weight for instrument: {0}")]
    MissingWeight(String),

    /// The returns table has no observations
    #[error("Returns table has no observations")]
    EmptyReturns,

    /// Data layer error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Risk evaluation error
    #[error(transparent)]
    Risk(#[from] RiskError),

    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Result type alias for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;
