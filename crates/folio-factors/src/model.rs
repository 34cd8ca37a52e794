//! Time-series factor regression of a portfolio series.

use crate::align::align;
use crate::error::{FactorError, Result};
use crate::ols::{Coefficient, ols};
use crate::table::{FactorTable, HML, MKT_RF, RF, SMB};
use chrono::NaiveDate;
use folio_data::ScalarSeries;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Name of the intercept coefficient.
pub const CONST: &str = "const";

/// Regression of a portfolio series, in excess of the risk-free rate, on a
/// set of factor columns plus an intercept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorModel {
    /// Factor columns used as regressors.
    pub factors: Vec<String>,
    /// Column subtracted from the portfolio series; `None` regresses the raw
    /// series.
    pub risk_free: Option<String>,
}

impl Default for FactorModel {
    /// The Fama-French three-factor model.
    fn default() -> Self {
        Self {
            factors: vec![MKT_RF.to_string(), SMB.to_string(), HML.to_string()],
            risk_free: Some(RF.to_string()),
        }
    }
}

impl FactorModel {
    /// Fama-French three-factor model.
    pub fn fama_french_3() -> Self {
        Self::default()
    }

    /// Fit the model to a cumulative return curve such as a backtest's
    /// equity curve. The curve is turned into period returns first, so its
    /// first date drops out of the sample.
    pub fn fit_cumulative(
        &self,
        cumulative: &ScalarSeries,
        factors: &FactorTable,
    ) -> Result<RegressionSummary> {
        self.fit(&period_returns(cumulative)?, factors)
    }

    /// Align the period returns in `portfolio` with `factors` on common dates
    /// and fit the model.
    pub fn fit(
        &self,
        portfolio: &ScalarSeries,
        factors: &FactorTable,
    ) -> Result<RegressionSummary> {
        let sample = align(portfolio, factors)?;

        let y: Vec<f64> = match &self.risk_free {
            Some(rf) => {
                let rf = sample.factor(rf)?;
                sample
                    .portfolio()
                    .iter()
                    .zip(rf.iter())
                    .map(|(r, f)| r - f)
                    .collect()
            }
            None => sample.portfolio().to_vec(),
        };

        let columns = self
            .factors
            .iter()
            .map(|name| sample.factor(name))
            .collect::<Result<Vec<_>>>()?;

        let x = DMatrix::from_fn(sample.len(), columns.len() + 1, |i, j| {
            if j == 0 { 1.0 } else { columns[j - 1][i] }
        });

        let mut names = Vec::with_capacity(self.factors.len() + 1);
        names.push(CONST.to_string());
        names.extend(self.factors.iter().cloned());

        let fit = ols(&y, &x, &names)?;
        let dates = sample.dates();
        let summary = RegressionSummary {
            dependent: match &self.risk_free {
                Some(_) => "Excess_Return".to_string(),
                None => "Return".to_string(),
            },
            start: dates.iter().min().copied(),
            end: dates.iter().max().copied(),
            coefficients: fit.coefficients,
            r_squared: fit.r_squared,
            adj_r_squared: fit.adj_r_squared,
            f_statistic: fit.f_statistic,
            f_p_value: fit.f_p_value,
            residual_std_error: fit.residual_std_error,
            nobs: fit.nobs,
            df_residuals: fit.df_residuals,
            df_model: fit.df_model,
        };

        info!(
            nobs = summary.nobs,
            r_squared = summary.r_squared,
            "fitted factor model"
        );
        Ok(summary)
    }
}

/// Period returns `(1 + c_t) / (1 + c_{t-1}) - 1` of a cumulative return
/// curve, dated at the end of each period.
pub fn period_returns(cumulative: &ScalarSeries) -> Result<ScalarSeries> {
    if cumulative.len() < 2 {
        return Err(FactorError::InsufficientData {
            required: 2,
            actual: cumulative.len(),
        });
    }

    let values = cumulative
        .values()
        .windows(2)
        .map(|pair| {
            let base = 1.0 + pair[0];
            let r = (1.0 + pair[1]) / base - 1.0;
            if base == 0.0 || !r.is_finite() {
                Err(FactorError::NonFinite("period return"))
            } else {
                Ok(r)
            }
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(ScalarSeries::new(cumulative.dates()[1..].to_vec(), values)?)
}

/// Coefficients and fit statistics of a factor regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionSummary {
    /// Name of the dependent variable.
    pub dependent: String,
    /// First date of the sample.
    pub start: Option<NaiveDate>,
    /// Last date of the sample.
    pub end: Option<NaiveDate>,
    /// Intercept first, then one entry per factor.
    pub coefficients: Vec<Coefficient>,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// Adjusted R-squared.
    pub adj_r_squared: f64,
    /// F-statistic.
    pub f_statistic: f64,
    /// p-value of the F-statistic.
    pub f_p_value: f64,
    /// Residual standard error.
    pub residual_std_error: f64,
    /// Observations used.
    pub nobs: usize,
    /// Residual degrees of freedom.
    pub df_residuals: usize,
    /// Model degrees of freedom.
    pub df_model: usize,
}

impl RegressionSummary {
    /// Coefficient named `name`.
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }

    /// Intercept estimate (alpha).
    pub fn alpha(&self) -> Option<f64> {
        self.coefficient(CONST).map(|c| c.estimate)
    }
}

impl fmt::Display for RegressionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "OLS Regression Results")?;
        writeln!(
            f,
            "Dep. Variable: {:<16} R-squared:      {:>10.4}",
            self.dependent, self.r_squared
        )?;
        writeln!(
            f,
            "No. Observations: {:<13} Adj. R-squared: {:>10.4}",
            self.nobs, self.adj_r_squared
        )?;
        writeln!(
            f,
            "Df Residuals: {:<17} F-statistic:    {:>10.4}",
            self.df_residuals, self.f_statistic
        )?;
        writeln!(
            f,
            "Df Model: {:<21} Prob (F):       {:>10.4}",
            self.df_model, self.f_p_value
        )?;
        if let (Some(start), Some(end)) = (self.start, self.end) {
            writeln!(f, "Sample: {start} to {end}")?;
        }
        writeln!(f, "{}", "=".repeat(66))?;
        writeln!(
            f,
            "{:<10} {:>12} {:>12} {:>12} {:>12}",
            "", "coef", "std err", "t", "P>|t|"
        )?;
        writeln!(f, "{}", "-".repeat(66))?;
        for c in &self.coefficients {
            writeln!(
                f,
                "{:<10} {:>12.6} {:>12.6} {:>12.3} {:>12.3}",
                c.name, c.estimate, c.std_error, c.t_stat, c.p_value
            )?;
        }
        write!(f, "{}", "=".repeat(66))
    }
}
