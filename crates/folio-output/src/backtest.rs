//! Fixed-weight backtesting.

use crate::error::{OutputError, Result};
use crate::summary::PerformanceSummary;
use folio_data::{DataError, ReturnsTable, WeightMapping};
use folio_risk::portfolio_returns;
use tracing::{info, warn};

/// Runs a weight mapping over a returns table.
pub trait BacktestEngine {
    /// Backtest `weights` over `returns`.
    fn run(&self, returns: &ReturnsTable, weights: &WeightMapping) -> Result<PerformanceSummary>;
}

/// Holds the same weights on every date (rebalanced each period).
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedWeightBacktest;

impl FixedWeightBacktest {
    /// Create the engine.
    pub const fn new() -> Self {
        Self
    }
}

impl BacktestEngine for FixedWeightBacktest {
    fn run(&self, returns: &ReturnsTable, weights: &WeightMapping) -> Result<PerformanceSummary> {
        if returns.is_empty() {
            return Err(OutputError::EmptyReturns);
        }

        let aligned = weights
            .aligned_to(returns.symbols())
            .map_err(|e| match e {
                DataError::MissingData { symbol, .. } => OutputError::MissingWeight(symbol),
                other => OutputError::from(other),
            })?;

        let unused: Vec<&str> = weights
            .symbols()
            .filter(|s| !returns.symbols().iter().any(|t| t == s))
            .collect();
        if !unused.is_empty() {
            warn!(?unused, "weights given for instruments outside the returns table");
        }

        let series = portfolio_returns(returns.values(), &aligned);
        let summary = PerformanceSummary::from_returns(returns.dates().to_vec(), series)?;
        info!(
            observations = summary.n_observations,
            total_return = summary.total_return,
            "backtest complete"
        );
        Ok(summary)
    }
}
