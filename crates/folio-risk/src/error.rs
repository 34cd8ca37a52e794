//! Error types for risk evaluation and optimization.

use thiserror::Error;

/// Errors raised while evaluating risk or optimizing weights.
#[derive(Debug, Error)]
pub enum RiskError {
    /// A named option (objective, risk measure, ...) is not recognized
    #[error("Unknown {kind}: {value}")]
    UnknownOption {
        /// What kind of option was being parsed
        kind: &'static str,
        /// The rejected value
        value: String,
    },

    /// Weight bounds admit no fully invested portfolio
    #[error("Infeasible weight bounds: {0}")]
    InfeasibleBounds(String),

    /// Bounds reference an instrument that is not in the returns table
    #[error("Bounds given for unknown instrument: {0}")]
    UnknownSymbol(String),

    /// Not enough observations or instruments
    #[error("Insufficient data: need at least {required}, got {actual}")]
    InsufficientData {
        /// Required count
        required: usize,
        /// Actual count
        actual: usize,
    },

    /// A numeric parameter is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Input contains NaN or infinite values
    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),

    /// The numerical solver failed
    #[error("Solver error: {0}")]
    Solver(String),
}

impl From<argmin::core::Error> for RiskError {
    fn from(err: argmin::core::Error) -> Self {
        Self::Solver(err.to_string())
    }
}
