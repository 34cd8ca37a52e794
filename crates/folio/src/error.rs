//! Pipeline error type.

use folio_data::{DataError, DataId};
use folio_factors::FactorError;
use folio_output::OutputError;
use folio_risk::RiskError;
use thiserror::Error;

/// Errors surfaced by pipeline stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The call itself is malformed (no instruments, unknown universe, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A consumer stage was given an id the store does not hold
    #[error("No data stored under id {0}")]
    MissingData(DataId),

    /// Price fetch or store error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Optimizer error
    #[error(transparent)]
    Risk(#[from] RiskError),

    /// Factor loading or regression error
    #[error(transparent)]
    Factor(#[from] FactorError),

    /// Backtest or export error
    #[error(transparent)]
    Output(#[from] OutputError),
}

impl From<crate::universe::gics::UnknownSector> for PipelineError {
    fn from(err: crate::universe::gics::UnknownSector) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
