//! Optimization objectives.

use crate::error::RiskError;
use crate::measure::normalize_option;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the mean-risk optimizer is asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveFunction {
    /// Minimize the risk measure.
    #[default]
    MinimizeRisk,
    /// Maximize the expected return.
    MaximizeReturn,
    /// Maximize `mean - risk_aversion * risk`.
    MaximizeUtility,
    /// Maximize `(mean - risk_free_rate) / risk`.
    MaximizeRatio,
}

impl ObjectiveFunction {
    /// All objectives, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::MinimizeRisk,
        Self::MaximizeReturn,
        Self::MaximizeUtility,
        Self::MaximizeRatio,
    ];

    /// Canonical snake_case name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MinimizeRisk => "minimize_risk",
            Self::MaximizeReturn => "maximize_return",
            Self::MaximizeUtility => "maximize_utility",
            Self::MaximizeRatio => "maximize_ratio",
        }
    }
}

impl fmt::Display for ObjectiveFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ObjectiveFunction {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_option(s).as_str() {
            "minimizerisk" | "minrisk" => Ok(Self::MinimizeRisk),
            "maximizereturn" | "maxreturn" => Ok(Self::MaximizeReturn),
            "maximizeutility" | "maxutility" => Ok(Self::MaximizeUtility),
            "maximizeratio" | "maxratio" | "sharpe" => Ok(Self::MaximizeRatio),
            _ => Err(RiskError::UnknownOption {
                kind: "objective function",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("MINIMIZE_RISK", ObjectiveFunction::MinimizeRisk)]
    #[case("maximize_return", ObjectiveFunction::MaximizeReturn)]
    #[case("maximize-utility", ObjectiveFunction::MaximizeUtility)]
    #[case("MaximizeRatio", ObjectiveFunction::MaximizeRatio)]
    fn test_parse(#[case] input: &str, #[case] expected: ObjectiveFunction) {
        assert_eq!(input.parse::<ObjectiveFunction>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_objective() {
        let err = "MINIMIZE_REGRET".parse::<ObjectiveFunction>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown objective function: MINIMIZE_REGRET");
    }

    #[test]
    fn test_default_is_minimize_risk() {
        assert_eq!(ObjectiveFunction::default(), ObjectiveFunction::MinimizeRisk);
        assert_eq!(ObjectiveFunction::default().to_string(), "minimize_risk");
    }
}
