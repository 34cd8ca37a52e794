//! Performance summary of a backtested portfolio.

use crate::error::{OutputError, Result};
use chrono::NaiveDate;
use folio_data::ScalarSeries;
use folio_risk::measure::{mean, variance};
use folio_risk::{MeasureParams, RiskMeasure};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading periods per year used for annualization.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Return path and statistics of a backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Observation dates.
    pub dates: Vec<NaiveDate>,
    /// Portfolio return per period.
    pub returns: Vec<f64>,
    /// Compounded return since the first observation, which is `0.0`.
    pub cumulative_returns: Vec<f64>,
    /// Mean period return.
    pub mean_return: f64,
    /// Mean period return times [`PERIODS_PER_YEAR`].
    pub annualized_return: f64,
    /// Period standard deviation times `sqrt(PERIODS_PER_YEAR)`.
    pub annualized_volatility: f64,
    /// Annualized return over annualized volatility.
    pub sharpe_ratio: f64,
    /// Annualized return over annualized downside deviation.
    pub sortino_ratio: f64,
    /// Largest peak-to-trough loss of wealth compounded over every period,
    /// starting from 1.0.
    pub max_drawdown: f64,
    /// Expected shortfall of period returns at 95%.
    pub cvar_95: f64,
    /// Return compounded over every period, `prod(1 + r) - 1`.
    pub total_return: f64,
    /// Number of return observations.
    pub n_observations: usize,
}

impl PerformanceSummary {
    /// Summarize a series of period returns.
    pub fn from_returns(dates: Vec<NaiveDate>, returns: Vec<f64>) -> Result<Self> {
        if returns.is_empty() {
            return Err(OutputError::EmptyReturns);
        }
        if dates.len() != returns.len() {
            return Err(OutputError::InvalidFormat(format!(
                "{} dates for {} returns",
                dates.len(),
                returns.len()
            )));
        }

        let cumulative_returns = cumulative_returns(&returns);
        let compounded = compounded_returns(&returns);
        let mean_return = mean(&returns);
        let annualized_return = mean_return * PERIODS_PER_YEAR;
        let annualized_volatility = variance(&returns).sqrt() * PERIODS_PER_YEAR.sqrt();

        let downside = (returns.iter().map(|r| r.min(0.0).powi(2)).sum::<f64>()
            / returns.len() as f64)
            .sqrt()
            * PERIODS_PER_YEAR.sqrt();

        let cvar_95 = RiskMeasure::CVaR.evaluate(&returns, &MeasureParams::default())?;

        Ok(Self {
            dates,
            total_return: compounded.last().copied().unwrap_or_default(),
            max_drawdown: max_drawdown(&compounded),
            cumulative_returns,
            mean_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio: ratio(annualized_return, annualized_volatility),
            sortino_ratio: ratio(annualized_return, downside),
            cvar_95,
            n_observations: returns.len(),
            returns,
        })
    }

    /// Cumulative returns as a dated series.
    pub fn cumulative_series(&self) -> Result<ScalarSeries> {
        Ok(ScalarSeries::new(
            self.dates.clone(),
            self.cumulative_returns.clone(),
        )?)
    }
}

impl fmt::Display for PerformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(start), Some(end)) = (self.dates.first(), self.dates.last()) {
            writeln!(f, "Period:                {start} to {end}")?;
        }
        writeln!(f, "Observations:          {}", self.n_observations)?;
        writeln!(f, "Total return:          {:.2}%", self.total_return * 100.0)?;
        writeln!(f, "Annualized return:     {:.2}%", self.annualized_return * 100.0)?;
        writeln!(f, "Annualized volatility: {:.2}%", self.annualized_volatility * 100.0)?;
        writeln!(f, "Sharpe ratio:          {:.3}", self.sharpe_ratio)?;
        writeln!(f, "Sortino ratio:         {:.3}", self.sortino_ratio)?;
        writeln!(f, "Max drawdown:          {:.2}%", self.max_drawdown * 100.0)?;
        write!(f, "CVaR (95%):            {:.2}%", self.cvar_95 * 100.0)
    }
}

/// Compounded returns anchored at the first observation.
///
/// `c_0 = 0` and `c_t = prod_{s=1..t}(1 + r_s) - 1`, so the output has the
/// same length as the input.
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
    let mut growth = 1.0;
    returns
        .iter()
        .enumerate()
        .map(|(t, r)| {
            if t > 0 {
                growth *= 1.0 + r;
            }
            growth - 1.0
        })
        .collect()
}

/// Compounded returns including the first period, `prod_{s=0..t}(1 + r_s) - 1`.
pub fn compounded_returns(returns: &[f64]) -> Vec<f64> {
    let mut growth = 1.0;
    returns
        .iter()
        .map(|r| {
            growth *= 1.0 + r;
            growth - 1.0
        })
        .collect()
}

/// Largest relative decline of wealth `1 + c` from its running peak. Wealth
/// starts at 1.0, so a loss in the first period counts.
pub fn max_drawdown(cumulative: &[f64]) -> f64 {
    let mut peak = 1.0_f64;
    cumulative
        .iter()
        .map(|c| {
            let wealth = 1.0 + c;
            peak = peak.max(wealth);
            if peak > 0.0 { 1.0 - wealth / peak } else { 0.0 }
        })
        .fold(0.0, f64::max)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 1e-15 {
        numerator / denominator
    } else {
        0.0
    }
}
