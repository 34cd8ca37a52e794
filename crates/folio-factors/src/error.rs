//! Error types for factor loading and regression.

use folio_data::DataError;
use thiserror::Error;

/// Errors raised by factor loading and regression.
#[derive(Debug, Error)]
pub enum FactorError {
    /// The portfolio series and the factor table share no dates
    #[error("No overlapping dates between portfolio series and factor table")]
    NoOverlap,

    /// The regression design matrix is rank deficient
    #[error("Singular design matrix: regressors are collinear")]
    SingularMatrix,

    /// Too few observations for the number of regressors
    #[error("Insufficient data: need more than {required} observations, got {actual}")]
    InsufficientData {
        /// Number of regressors
        required: usize,
        /// Number of aligned observations
        actual: usize,
    },

    /// A required factor column is absent
    #[error("Missing factor column: {0}")]
    MissingFactor(String),

    /// A factor file could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Non-finite value in the regression inputs
    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),

    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data layer error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Statistical distribution error
    #[error("Distribution error: {0}")]
    Distribution(String),
}

/// Result type alias for factor operations.
pub type Result<T> = std::result::Result<T, FactorError>;
