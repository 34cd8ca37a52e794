//! Ordinary least squares with classical standard errors.

use crate::error::{FactorError, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

/// Relative singular value below which the normal matrix counts as singular.
const RANK_TOLERANCE: f64 = 1e-12;

/// Estimate and test statistics of one regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    /// Regressor name.
    pub name: String,
    /// Point estimate.
    pub estimate: f64,
    /// Standard error.
    pub std_error: f64,
    /// t-statistic.
    pub t_stat: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// OLS fit of `y` on the columns of `x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OlsFit {
    /// One entry per regressor, in column order.
    pub coefficients: Vec<Coefficient>,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// R-squared adjusted for the number of regressors.
    pub adj_r_squared: f64,
    /// F-statistic of the joint test that all slopes are zero.
    pub f_statistic: f64,
    /// p-value of the F-test.
    pub f_p_value: f64,
    /// Square root of the residual variance.
    pub residual_std_error: f64,
    /// Number of observations.
    pub nobs: usize,
    /// Residual degrees of freedom.
    pub df_residuals: usize,
    /// Model degrees of freedom (regressors excluding the intercept).
    pub df_model: usize,
}

/// Fit `y = x * beta + e`.
///
/// `x` is `n x k` and `names` labels its columns. The first column is taken
/// to be the intercept when computing R-squared and the F-test.
pub fn ols(y: &[f64], x: &DMatrix<f64>, names: &[String]) -> Result<OlsFit> {
    let n = y.len();
    let k = x.ncols();
    if x.nrows() != n || names.len() != k {
        return Err(FactorError::Parse(format!(
            "design matrix is {}x{}, expected {n}x{}",
            x.nrows(),
            x.ncols(),
            names.len()
        )));
    }
    if n <= k {
        return Err(FactorError::InsufficientData {
            required: k,
            actual: n,
        });
    }
    if y.iter().chain(x.iter()).any(|v| !v.is_finite()) {
        return Err(FactorError::NonFinite("regression inputs"));
    }

    let y_vec = DVector::from_column_slice(y);
    let xtx = x.transpose() * x;

    let singular = xtx.clone().svd(false, false).singular_values;
    if singular.min() <= singular.max() * RANK_TOLERANCE {
        return Err(FactorError::SingularMatrix);
    }
    let Some(xtx_inv) = xtx.try_inverse() else {
        return Err(FactorError::SingularMatrix);
    };

    let beta = &xtx_inv * x.transpose() * &y_vec;
    let residuals = &y_vec - x * &beta;
    let ssr = residuals.dot(&residuals);

    let df_residuals = n - k;
    let df_model = k - 1;
    let sigma2 = ssr / df_residuals as f64;

    let y_mean = y_vec.mean();
    let sst: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = if sst > 0.0 { 1.0 - ssr / sst } else { 0.0 };
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n - 1) as f64 / df_residuals as f64;

    let t_dist = StudentsT::new(0.0, 1.0, df_residuals as f64)
        .map_err(|e| FactorError::Distribution(e.to_string()))?;

    let coefficients = names
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let std_error = (sigma2 * xtx_inv[(j, j)]).max(0.0).sqrt();
            let t_stat = beta[j] / std_error;
            let p_value = if t_stat.is_finite() {
                2.0 * (1.0 - t_dist.cdf(t_stat.abs()))
            } else {
                0.0
            };
            Coefficient {
                name: name.clone(),
                estimate: beta[j],
                std_error,
                t_stat,
                p_value,
            }
        })
        .collect();

    let (f_statistic, f_p_value) = if df_model > 0 && ssr > 0.0 {
        let f = ((sst - ssr) / df_model as f64) / sigma2;
        let f_dist = FisherSnedecor::new(df_model as f64, df_residuals as f64)
            .map_err(|e| FactorError::Distribution(e.to_string()))?;
        (f, 1.0 - f_dist.cdf(f.max(0.0)))
    } else {
        (f64::NAN, f64::NAN)
    };

    Ok(OlsFit {
        coefficients,
        r_squared,
        adj_r_squared,
        f_statistic,
        f_p_value,
        residual_std_error: sigma2.sqrt(),
        nobs: n,
        df_residuals,
        df_model,
    })
}
