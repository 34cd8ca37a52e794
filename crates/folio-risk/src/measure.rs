//! Risk measures on a portfolio return series.
//!
//! Every measure maps a series of periodic portfolio returns to a single
//! non-negative number where larger means riskier. Drawdown based measures
//! work on non-compounded cumulative returns.

use crate::error::RiskError;
use argmin::core::{CostFunction, Executor};
use argmin::solver::brent::BrentOpt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Search interval for `ln z` in the entropic measures.
const LN_Z_RANGE: (f64, f64) = (-20.0, 5.0);

/// Risk measure used by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskMeasure {
    /// Sample variance.
    #[default]
    Variance,
    /// Mean squared shortfall below the minimum acceptable return.
    SemiVariance,
    /// Square root of the variance.
    StandardDeviation,
    /// Square root of the semi-variance.
    SemiDeviation,
    /// Mean absolute deviation from the mean.
    MeanAbsoluteDeviation,
    /// Mean shortfall below the minimum acceptable return.
    FirstLowerPartialMoment,
    /// Conditional value at risk (expected shortfall) at `beta`.
    #[serde(rename = "cvar")]
    CVaR,
    /// Entropic value at risk at `beta`.
    #[serde(rename = "evar")]
    EVaR,
    /// Largest single-period loss.
    WorstRealization,
    /// Conditional drawdown at risk at `beta`.
    #[serde(rename = "cdar")]
    CDaR,
    /// Largest drawdown.
    MaxDrawdown,
    /// Mean drawdown.
    AverageDrawdown,
    /// Entropic drawdown at risk at `beta`.
    #[serde(rename = "edar")]
    EDaR,
    /// Root mean squared drawdown.
    UlcerIndex,
    /// Gini mean difference.
    GiniMeanDifference,
}

impl RiskMeasure {
    /// All risk measures, in declaration order.
    pub const ALL: [Self; 15] = [
        Self::Variance,
        Self::SemiVariance,
        Self::StandardDeviation,
        Self::SemiDeviation,
        Self::MeanAbsoluteDeviation,
        Self::FirstLowerPartialMoment,
        Self::CVaR,
        Self::EVaR,
        Self::WorstRealization,
        Self::CDaR,
        Self::MaxDrawdown,
        Self::AverageDrawdown,
        Self::EDaR,
        Self::UlcerIndex,
        Self::GiniMeanDifference,
    ];

    /// Canonical snake_case name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Variance => "variance",
            Self::SemiVariance => "semi_variance",
            Self::StandardDeviation => "standard_deviation",
            Self::SemiDeviation => "semi_deviation",
            Self::MeanAbsoluteDeviation => "mean_absolute_deviation",
            Self::FirstLowerPartialMoment => "first_lower_partial_moment",
            Self::CVaR => "cvar",
            Self::EVaR => "evar",
            Self::WorstRealization => "worst_realization",
            Self::CDaR => "cdar",
            Self::MaxDrawdown => "max_drawdown",
            Self::AverageDrawdown => "average_drawdown",
            Self::EDaR => "edar",
            Self::UlcerIndex => "ulcer_index",
            Self::GiniMeanDifference => "gini_mean_difference",
        }
    }

    /// Evaluate the measure on a series of portfolio returns.
    pub fn evaluate(&self, returns: &[f64], params: &MeasureParams) -> Result<f64, RiskError> {
        if returns.is_empty() {
            return Err(RiskError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        if returns.iter().any(|r| !r.is_finite()) {
            return Err(RiskError::NonFinite("portfolio returns"));
        }
        params.validate()?;

        let mar = params.min_acceptable_return.unwrap_or_else(|| mean(returns));

        let value = match self {
            Self::Variance => variance(returns),
            Self::StandardDeviation => variance(returns).sqrt(),
            Self::SemiVariance => semi_variance(returns, mar),
            Self::SemiDeviation => semi_variance(returns, mar).sqrt(),
            Self::MeanAbsoluteDeviation => {
                let m = mean(returns);
                mean_by(returns, |r| (r - m).abs())
            }
            Self::FirstLowerPartialMoment => mean_by(returns, |r| (mar - r).max(0.0)),
            Self::CVaR => {
                let losses: Vec<f64> = returns.iter().map(|r| -r).collect();
                tail_mean(losses, params.beta)
            }
            Self::EVaR => {
                let losses: Vec<f64> = returns.iter().map(|r| -r).collect();
                entropic_risk(&losses, params.beta)?
            }
            Self::WorstRealization => -returns.iter().copied().fold(f64::INFINITY, f64::min),
            Self::CDaR => tail_mean(drawdowns(returns), params.beta),
            Self::MaxDrawdown => drawdowns(returns).into_iter().fold(0.0, f64::max),
            Self::AverageDrawdown => mean(&drawdowns(returns)),
            Self::EDaR => entropic_risk(&drawdowns(returns), params.beta)?,
            Self::UlcerIndex => mean_by(&drawdowns(returns), |d| d * d).sqrt(),
            Self::GiniMeanDifference => gini_mean_difference(returns),
        };

        Ok(value)
    }
}

impl fmt::Display for RiskMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RiskMeasure {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_option(s);
        let measure = match normalized.as_str() {
            "variance" => Self::Variance,
            "semivariance" => Self::SemiVariance,
            "standarddeviation" | "std" | "stddev" => Self::StandardDeviation,
            "semideviation" => Self::SemiDeviation,
            "meanabsolutedeviation" | "mad" => Self::MeanAbsoluteDeviation,
            "firstlowerpartialmoment" | "flpm" => Self::FirstLowerPartialMoment,
            "cvar" => Self::CVaR,
            "evar" => Self::EVaR,
            "worstrealization" => Self::WorstRealization,
            "cdar" => Self::CDaR,
            "maxdrawdown" | "mdd" => Self::MaxDrawdown,
            "averagedrawdown" | "add" => Self::AverageDrawdown,
            "edar" => Self::EDaR,
            "ulcerindex" => Self::UlcerIndex,
            "ginimeandifference" | "ginimeandifferenceratio" | "gmd" => {
                Self::GiniMeanDifference
            }
            _ => {
                return Err(RiskError::UnknownOption {
                    kind: "risk measure",
                    value: s.to_string(),
                });
            }
        };
        Ok(measure)
    }
}

/// Lowercase and strip separators so `MAX_DRAWDOWN`, `max-drawdown` and
/// `maxDrawdown` all compare equal.
pub(crate) fn normalize_option(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parameters shared by the risk measures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasureParams {
    /// Confidence level of the tail measures (CVaR, EVaR, CDaR, EDaR).
    pub beta: f64,
    /// Threshold of the downside measures; the sample mean when `None`.
    pub min_acceptable_return: Option<f64>,
}

impl Default for MeasureParams {
    fn default() -> Self {
        Self {
            beta: 0.95,
            min_acceptable_return: None,
        }
    }
}

impl MeasureParams {
    fn validate(&self) -> Result<(), RiskError> {
        if !(self.beta > 0.0 && self.beta < 1.0) {
            return Err(RiskError::InvalidParameter(format!(
                "beta must be in (0, 1), got {}",
                self.beta
            )));
        }
        Ok(())
    }
}

/// Arithmetic mean; zero for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

fn mean_by(xs: &[f64], f: impl Fn(f64) -> f64) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().map(|&x| f(x)).sum::<f64>() / xs.len() as f64
    }
}

/// Sample variance (n - 1 denominator); zero below two observations.
pub fn variance(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64
}

fn semi_variance(xs: &[f64], mar: f64) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    xs.iter().map(|x| (x - mar).min(0.0).powi(2)).sum::<f64>() / (xs.len() - 1) as f64
}

/// Mean of the worst `1 - beta` share of `losses` (at least one value).
fn tail_mean(mut losses: Vec<f64>, beta: f64) -> f64 {
    losses.sort_by(|a, b| b.total_cmp(a));
    let k = ((losses.len() as f64) * (1.0 - beta)).ceil() as usize;
    let k = k.clamp(1, losses.len());
    losses[..k].iter().sum::<f64>() / k as f64
}

/// Drawdowns of the non-compounded cumulative return path, starting flat.
pub fn drawdowns(returns: &[f64]) -> Vec<f64> {
    let mut cumulative = 0.0;
    let mut peak: f64 = 0.0;
    returns
        .iter()
        .map(|r| {
            cumulative += r;
            peak = peak.max(cumulative);
            peak - cumulative
        })
        .collect()
}

fn gini_mean_difference(xs: &[f64]) -> f64 {
    let n = xs.len();
    if n < 2 {
        return 0.0;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(f64::total_cmp);
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| (2.0 * (i + 1) as f64 - n as f64 - 1.0) * x)
        .sum();
    2.0 * weighted / (n as f64 * (n - 1) as f64)
}

/// `z * ln(E[exp(L / z)] / (1 - beta))` as a function of `ln z`.
struct EntropicObjective<'a> {
    losses: &'a [f64],
    beta: f64,
}

impl EntropicObjective<'_> {
    fn value(&self, ln_z: f64) -> f64 {
        let z = ln_z.exp();
        let max = self.losses.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = self.losses.iter().map(|l| ((l - max) / z).exp()).sum();
        let log_mean_exp = max / z + (sum / self.losses.len() as f64).ln();
        z * (log_mean_exp - (1.0 - self.beta).ln())
    }
}

impl CostFunction for EntropicObjective<'_> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, ln_z: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        Ok(self.value(*ln_z))
    }
}

/// Entropic risk of `losses` at confidence `beta`, minimised over `z > 0`.
fn entropic_risk(losses: &[f64], beta: f64) -> Result<f64, RiskError> {
    let objective = EntropicObjective { losses, beta };
    let (lo, hi) = LN_Z_RANGE;
    let fallback = objective.value(lo).min(objective.value(hi));

    let solver = BrentOpt::new(lo, hi);
    let result = Executor::new(objective, solver)
        .configure(|state| state.max_iters(200))
        .run()?;

    Ok(result.state.best_cost.min(fallback))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const SAMPLE: [f64; 10] = [
        0.01, -0.02, 0.015, -0.005, 0.02, -0.03, 0.01, 0.005, -0.01, 0.012,
    ];

    #[rstest]
    #[case("variance", RiskMeasure::Variance)]
    #[case("VARIANCE", RiskMeasure::Variance)]
    #[case("semi_variance", RiskMeasure::SemiVariance)]
    #[case("STANDARD_DEVIATION", RiskMeasure::StandardDeviation)]
    #[case("semi-deviation", RiskMeasure::SemiDeviation)]
    #[case("MEAN_ABSOLUTE_DEVIATION", RiskMeasure::MeanAbsoluteDeviation)]
    #[case("first_lower_partial_moment", RiskMeasure::FirstLowerPartialMoment)]
    #[case("CVAR", RiskMeasure::CVaR)]
    #[case("evar", RiskMeasure::EVaR)]
    #[case("WORST_REALIZATION", RiskMeasure::WorstRealization)]
    #[case("CDaR", RiskMeasure::CDaR)]
    #[case("max_drawdown", RiskMeasure::MaxDrawdown)]
    #[case("AVERAGE_DRAWDOWN", RiskMeasure::AverageDrawdown)]
    #[case("EDAR", RiskMeasure::EDaR)]
    #[case("ulcer_index", RiskMeasure::UlcerIndex)]
    #[case("GINI_MEAN_DIFFERENCE_RATIO", RiskMeasure::GiniMeanDifference)]
    fn test_parse(#[case] input: &str, #[case] expected: RiskMeasure) {
        assert_eq!(input.parse::<RiskMeasure>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "sortino".parse::<RiskMeasure>().unwrap_err();
        assert!(matches!(
            err,
            RiskError::UnknownOption { kind: "risk measure", ref value } if value == "sortino"
        ));
    }

    #[test]
    fn test_name_round_trips_through_parse() {
        for measure in RiskMeasure::ALL {
            assert_eq!(measure.name().parse::<RiskMeasure>().unwrap(), measure);
        }
    }

    #[test]
    fn test_variance_and_std() {
        let params = MeasureParams::default();
        let var = RiskMeasure::Variance.evaluate(&SAMPLE, &params).unwrap();
        let std = RiskMeasure::StandardDeviation
            .evaluate(&SAMPLE, &params)
            .unwrap();
        assert_relative_eq!(var, variance(&SAMPLE), epsilon = 1e-15);
        assert_relative_eq!(std * std, var, epsilon = 1e-15);
    }

    #[test]
    fn test_worst_realization() {
        let worst = RiskMeasure::WorstRealization
            .evaluate(&SAMPLE, &MeasureParams::default())
            .unwrap();
        assert_relative_eq!(worst, 0.03);
    }

    #[test]
    fn test_cvar_averages_the_tail() {
        let params = MeasureParams {
            beta: 0.8,
            min_acceptable_return: None,
        };
        // Two worst returns out of ten: -0.03 and -0.02.
        let cvar = RiskMeasure::CVaR.evaluate(&SAMPLE, &params).unwrap();
        assert_relative_eq!(cvar, 0.025, epsilon = 1e-12);
    }

    #[test]
    fn test_evar_bounds_cvar() {
        let params = MeasureParams::default();
        let cvar = RiskMeasure::CVaR.evaluate(&SAMPLE, &params).unwrap();
        let evar = RiskMeasure::EVaR.evaluate(&SAMPLE, &params).unwrap();
        let worst = RiskMeasure::WorstRealization
            .evaluate(&SAMPLE, &params)
            .unwrap();
        assert!(evar >= cvar - 1e-9);
        assert!(evar <= worst + 1e-6);
    }

    #[test]
    fn test_drawdowns() {
        let dd = drawdowns(&[0.1, -0.05, -0.05, 0.2, -0.1]);
        let expected = [0.0, 0.05, 0.1, 0.0, 0.1];
        for (a, b) in dd.iter().zip(expected) {
            assert_relative_eq!(*a, b, epsilon = 1e-12);
        }

        let params = MeasureParams::default();
        let returns = [0.1, -0.05, -0.05, 0.2, -0.1];
        assert_relative_eq!(
            RiskMeasure::MaxDrawdown.evaluate(&returns, &params).unwrap(),
            0.1,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            RiskMeasure::AverageDrawdown
                .evaluate(&returns, &params)
                .unwrap(),
            0.05,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            RiskMeasure::UlcerIndex.evaluate(&returns, &params).unwrap(),
            (0.0225_f64 / 5.0).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_first_lower_partial_moment_with_threshold() {
        let params = MeasureParams {
            beta: 0.95,
            min_acceptable_return: Some(0.0),
        };
        let flpm = RiskMeasure::FirstLowerPartialMoment
            .evaluate(&[0.02, -0.01, -0.03, 0.01], &params)
            .unwrap();
        assert_relative_eq!(flpm, 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_gini_mean_difference() {
        // Pairwise absolute differences of [1, 2, 4]: 1, 3, 2 -> mean 2.
        let gmd = RiskMeasure::GiniMeanDifference
            .evaluate(&[4.0, 1.0, 2.0], &MeasureParams::default())
            .unwrap();
        assert_relative_eq!(gmd, 2.0, epsilon = 1e-12);
    }

    #[rstest]
    #[case(RiskMeasure::Variance)]
    #[case(RiskMeasure::SemiDeviation)]
    #[case(RiskMeasure::CDaR)]
    #[case(RiskMeasure::EDaR)]
    fn test_constant_series_has_no_dispersion(#[case] measure: RiskMeasure) {
        let value = measure
            .evaluate(&[0.01; 20], &MeasureParams::default())
            .unwrap();
        assert!(value.abs() < 1e-6, "{measure} = {value}");
    }

    #[test]
    fn test_empty_and_non_finite_input() {
        let params = MeasureParams::default();
        assert!(matches!(
            RiskMeasure::Variance.evaluate(&[], &params),
            Err(RiskError::InsufficientData { .. })
        ));
        assert!(matches!(
            RiskMeasure::Variance.evaluate(&[0.1, f64::NAN], &params),
            Err(RiskError::NonFinite(_))
        ));
    }
}
