//! Mean-risk portfolio optimization.
//!
//! Weights are searched with Nelder-Mead over an unconstrained vector which is
//! projected onto the fully invested, bounded simplex before every cost
//! evaluation, so every candidate the solver sees is a feasible portfolio.

use crate::bounds::{ResolvedBounds, WeightBounds};
use crate::error::RiskError;
use crate::measure::{MeasureParams, RiskMeasure, mean};
use crate::objective::ObjectiveFunction;
use argmin::core::{CostFunction, Executor};
use argmin::solver::neldermead::NelderMead;
use folio_data::{ReturnsTable, WeightMapping};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Floor on the denominator of the ratio objective.
const MIN_RATIO_RISK: f64 = 1e-12;

/// Settings of a mean-risk optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanRiskConfig {
    /// What to optimize.
    pub objective: ObjectiveFunction,
    /// Risk measure used by the risk based objectives.
    pub risk_measure: RiskMeasure,
    /// Weight constraints.
    pub bounds: WeightBounds,
    /// Risk aversion `lambda` of the utility objective.
    pub risk_aversion: f64,
    /// Risk-free rate per period for the ratio objective.
    pub risk_free_rate: f64,
    /// Parameters of the risk measure.
    pub measure_params: MeasureParams,
    /// Solver iteration cap.
    pub max_iters: u64,
}

impl Default for MeanRiskConfig {
    fn default() -> Self {
        Self {
            objective: ObjectiveFunction::default(),
            risk_measure: RiskMeasure::default(),
            bounds: WeightBounds::default(),
            risk_aversion: 1.0,
            risk_free_rate: 0.0,
            measure_params: MeasureParams::default(),
            max_iters: 2000,
        }
    }
}

/// Produces portfolio weights from a returns table.
pub trait PortfolioOptimizer {
    /// Optimize weights for the instruments of `returns`.
    fn optimize(
        &self,
        returns: &ReturnsTable,
        config: &MeanRiskConfig,
    ) -> Result<WeightMapping, RiskError>;
}

/// Per-period portfolio returns for weights aligned with the table columns.
pub fn portfolio_returns(values: &Array2<f64>, weights: &[f64]) -> Vec<f64> {
    values.dot(&Array1::from(weights.to_vec())).to_vec()
}

/// Nelder-Mead mean-risk optimizer.
#[derive(Debug, Clone, Copy)]
pub struct MeanRisk {
    sd_tolerance: f64,
}

impl Default for MeanRisk {
    fn default() -> Self {
        Self { sd_tolerance: 1e-12 }
    }
}

impl MeanRisk {
    /// Create an optimizer with the default convergence tolerance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop once the standard deviation of the simplex costs drops below
    /// `tolerance`.
    pub const fn with_sd_tolerance(mut self, tolerance: f64) -> Self {
        self.sd_tolerance = tolerance;
        self
    }

    fn initial_simplex(bounds: &ResolvedBounds) -> Vec<Vec<f64>> {
        let n = bounds.len();
        let x0 = bounds.project(&vec![1.0 / n as f64; n]);
        let mut simplex = Vec::with_capacity(n + 1);
        simplex.push(x0.clone());
        for i in 0..n {
            let mut point = x0.clone();
            point[i] += 0.5;
            simplex.push(point);
        }
        simplex
    }
}

struct MeanRiskCost {
    values: Array2<f64>,
    bounds: ResolvedBounds,
    config: MeanRiskConfig,
}

impl MeanRiskCost {
    fn evaluate(&self, weights: &[f64]) -> Result<f64, RiskError> {
        let series = portfolio_returns(&self.values, weights);
        let mu = mean(&series);
        let risk = || {
            self.config
                .risk_measure
                .evaluate(&series, &self.config.measure_params)
        };

        Ok(match self.config.objective {
            ObjectiveFunction::MinimizeRisk => risk()?,
            ObjectiveFunction::MaximizeReturn => -mu,
            ObjectiveFunction::MaximizeUtility => -(mu - self.config.risk_aversion * risk()?),
            ObjectiveFunction::MaximizeRatio => {
                -(mu - self.config.risk_free_rate) / risk()?.max(MIN_RATIO_RISK)
            }
        })
    }
}

impl CostFunction for MeanRiskCost {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        let weights = self.bounds.project(x);
        Ok(self.evaluate(&weights)?)
    }
}

impl PortfolioOptimizer for MeanRisk {
    fn optimize(
        &self,
        returns: &ReturnsTable,
        config: &MeanRiskConfig,
    ) -> Result<WeightMapping, RiskError> {
        if returns.n_assets() == 0 || returns.n_observations() == 0 {
            return Err(RiskError::InsufficientData {
                required: 1,
                actual: returns.n_observations().min(returns.n_assets()),
            });
        }
        if returns.values().iter().any(|v| !v.is_finite()) {
            return Err(RiskError::NonFinite("returns table"));
        }
        if !config.risk_aversion.is_finite() || !config.risk_free_rate.is_finite() {
            return Err(RiskError::NonFinite("optimizer parameters"));
        }

        let symbols = returns.symbols();
        let bounds = config.bounds.resolve(symbols)?;
        let weights = if symbols.len() == 1 {
            bounds.project(&[1.0])
        } else {
            let simplex = Self::initial_simplex(&bounds);
            let start = simplex[0].clone();
            let solver = NelderMead::new(simplex).with_sd_tolerance(self.sd_tolerance)?;
            let cost = MeanRiskCost {
                values: returns.values().clone(),
                bounds: bounds.clone(),
                config: config.clone(),
            };
            let res = Executor::new(cost, solver)
                .configure(|state| state.max_iters(config.max_iters))
                .run()?;

            debug!(
                iterations = res.state.iter,
                best_cost = res.state.best_cost,
                termination = ?res.state.termination_status,
                "nelder-mead finished"
            );
            bounds.project(&res.state.best_param.unwrap_or(start))
        };

        let mapping: WeightMapping = symbols.iter().cloned().zip(weights).collect();
        info!(
            objective = %config.objective,
            risk_measure = %config.risk_measure,
            assets = mapping.len(),
            "optimized portfolio"
        );
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ndarray::array;
    use rstest::rstest;

    fn table(symbols: &[&str], values: Array2<f64>) -> ReturnsTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..values.nrows())
            .map(|i| start + chrono::Days::new(i as u64))
            .collect();
        ReturnsTable::new(
            dates,
            symbols.iter().map(|s| s.to_string()).collect(),
            values,
        )
        .unwrap()
    }

    fn three_assets() -> ReturnsTable {
        table(
            &["AAPL", "MSFT", "NVDA"],
            array![
                [0.010, 0.002, 0.030],
                [-0.004, 0.001, -0.020],
                [0.006, 0.003, 0.040],
                [0.002, 0.000, -0.010],
                [0.001, 0.002, 0.025],
                [-0.003, 0.001, -0.015],
            ],
        )
    }

    #[rstest]
    #[case(ObjectiveFunction::MinimizeRisk, RiskMeasure::Variance)]
    #[case(ObjectiveFunction::MaximizeReturn, RiskMeasure::Variance)]
    #[case(ObjectiveFunction::MaximizeUtility, RiskMeasure::StandardDeviation)]
    #[case(ObjectiveFunction::MaximizeRatio, RiskMeasure::CVaR)]
    #[case(ObjectiveFunction::MinimizeRisk, RiskMeasure::MaxDrawdown)]
    fn test_weights_are_fully_invested(
        #[case] objective: ObjectiveFunction,
        #[case] risk_measure: RiskMeasure,
    ) {
        let config = MeanRiskConfig {
            objective,
            risk_measure,
            ..Default::default()
        };
        let weights = MeanRisk::new().optimize(&three_assets(), &config).unwrap();

        assert_eq!(weights.len(), 3);
        assert_relative_eq!(weights.sum(), 1.0, epsilon = 1e-8);
        for (_, w) in weights.iter() {
            assert!((-1e-10..=1.0 + 1e-10).contains(&w));
        }
    }

    #[test]
    fn test_weights_are_keyed_by_symbol() {
        let weights = MeanRisk::new()
            .optimize(&three_assets(), &MeanRiskConfig::default())
            .unwrap();
        let symbols: Vec<&str> = weights.symbols().collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT", "NVDA"]);
    }

    #[test]
    fn test_min_variance_splits_uncorrelated_equal_variance() {
        let returns = table(
            &["A", "B"],
            array![[0.01, 0.01], [-0.01, 0.01], [0.01, -0.01], [-0.01, -0.01]],
        );
        let weights = MeanRisk::new()
            .optimize(&returns, &MeanRiskConfig::default())
            .unwrap();

        assert_relative_eq!(weights.get("A").unwrap(), 0.5, epsilon = 1e-3);
        assert_relative_eq!(weights.get("B").unwrap(), 0.5, epsilon = 1e-3);
    }

    #[test]
    fn test_max_return_picks_best_asset() {
        let config = MeanRiskConfig {
            objective: ObjectiveFunction::MaximizeReturn,
            ..Default::default()
        };
        let weights = MeanRisk::new().optimize(&three_assets(), &config).unwrap();
        assert!(weights.get("NVDA").unwrap() > 0.95);
    }

    #[test]
    fn test_max_return_respects_upper_bound() {
        let config = MeanRiskConfig {
            objective: ObjectiveFunction::MaximizeReturn,
            bounds: WeightBounds::new(0.0, 0.4),
            ..Default::default()
        };
        let weights = MeanRisk::new().optimize(&three_assets(), &config).unwrap();

        for (_, w) in weights.iter() {
            assert!(w <= 0.4 + 1e-9);
        }
        assert_relative_eq!(weights.sum(), 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_single_asset_gets_full_weight() {
        let returns = table(&["SPY"], array![[0.01], [-0.02], [0.005]]);
        let weights = MeanRisk::new()
            .optimize(&returns, &MeanRiskConfig::default())
            .unwrap();
        assert_relative_eq!(weights.get("SPY").unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_infeasible_bounds_are_rejected() {
        let config = MeanRiskConfig {
            bounds: WeightBounds::new(0.0, 0.2),
            ..Default::default()
        };
        let result = MeanRisk::new().optimize(&three_assets(), &config);
        assert!(matches!(result, Err(RiskError::InfeasibleBounds(_))));
    }

    #[test]
    fn test_portfolio_returns() {
        let values = array![[0.01, 0.03], [-0.02, 0.00]];
        let series = portfolio_returns(&values, &[0.5, 0.5]);
        assert_relative_eq!(series[0], 0.02, epsilon = 1e-12);
        assert_relative_eq!(series[1], -0.01, epsilon = 1e-12);
    }
}
