//! Box constraints on portfolio weights.

use crate::error::RiskError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const PROJECTION_ITERATIONS: usize = 200;
const PROJECTION_TOLERANCE: f64 = 1e-12;

/// Lower and upper bound for every instrument, with optional per-instrument
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightBounds {
    /// Default minimum weight.
    pub min: f64,
    /// Default maximum weight.
    pub max: f64,
    /// `(min, max)` for specific symbols.
    #[serde(default)]
    pub overrides: BTreeMap<String, (f64, f64)>,
}

impl Default for WeightBounds {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 1.0,
            overrides: BTreeMap::new(),
        }
    }
}

impl WeightBounds {
    /// Long-only bounds in `[min, max]`.
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            overrides: BTreeMap::new(),
        }
    }

    /// Override the bounds of one instrument.
    pub fn with_override(mut self, symbol: impl Into<String>, min: f64, max: f64) -> Self {
        self.overrides.insert(symbol.into(), (min, max));
        self
    }

    /// Resolve the bounds for `symbols`, in that order.
    ///
    /// Fails when an override names an instrument outside `symbols`, or when
    /// no fully invested portfolio satisfies the bounds.
    pub fn resolve(&self, symbols: &[String]) -> Result<ResolvedBounds, RiskError> {
        if let Some(unknown) = self.overrides.keys().find(|s| !symbols.contains(s)) {
            return Err(RiskError::UnknownSymbol(unknown.clone()));
        }

        let (lower, upper): (Vec<f64>, Vec<f64>) = symbols
            .iter()
            .map(|s| self.overrides.get(s).copied().unwrap_or((self.min, self.max)))
            .unzip();

        for ((lo, hi), symbol) in lower.iter().zip(&upper).zip(symbols) {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(RiskError::NonFinite("weight bounds"));
            }
            if lo > hi {
                return Err(RiskError::InfeasibleBounds(format!(
                    "{symbol}: min {lo} exceeds max {hi}"
                )));
            }
        }

        let total_lower: f64 = lower.iter().sum();
        let total_upper: f64 = upper.iter().sum();
        if total_lower > 1.0 + PROJECTION_TOLERANCE {
            return Err(RiskError::InfeasibleBounds(format!(
                "minimum weights sum to {total_lower}"
            )));
        }
        if total_upper < 1.0 - PROJECTION_TOLERANCE {
            return Err(RiskError::InfeasibleBounds(format!(
                "maximum weights sum to {total_upper}"
            )));
        }

        Ok(ResolvedBounds { lower, upper })
    }
}

/// Per-instrument bounds known to admit a fully invested portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl ResolvedBounds {
    /// Lower bounds.
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Upper bounds.
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Number of instruments.
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    /// Whether there are no instruments.
    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Map `x` onto `{w : sum(w) = 1, lower <= w <= upper}`.
    ///
    /// Finds the shift `tau` with `sum(clamp(x - tau, lower, upper)) = 1` by
    /// bisection. Non-finite coordinates are treated as zero.
    pub fn project(&self, x: &[f64]) -> Vec<f64> {
        let x: Vec<f64> = x
            .iter()
            .map(|v| if v.is_finite() { *v } else { 0.0 })
            .collect();

        let shifted = |tau: f64| -> Vec<f64> {
            x.iter()
                .zip(self.lower.iter().zip(&self.upper))
                .map(|(v, (lo, hi))| (v - tau).clamp(*lo, *hi))
                .collect()
        };

        // At `hi_tau` every weight sits at its lower bound, at `lo_tau` at its
        // upper bound; the sum is non-increasing in tau.
        let mut lo_tau = x
            .iter()
            .zip(&self.upper)
            .map(|(v, hi)| v - hi)
            .fold(f64::INFINITY, f64::min);
        let mut hi_tau = x
            .iter()
            .zip(&self.lower)
            .map(|(v, lo)| v - lo)
            .fold(f64::NEG_INFINITY, f64::max);

        if !lo_tau.is_finite() || !hi_tau.is_finite() {
            return x;
        }

        for _ in 0..PROJECTION_ITERATIONS {
            let mid = 0.5 * (lo_tau + hi_tau);
            let total: f64 = shifted(mid).iter().sum();
            if total > 1.0 {
                lo_tau = mid;
            } else {
                hi_tau = mid;
            }
            if hi_tau - lo_tau < PROJECTION_TOLERANCE {
                break;
            }
        }

        shifted(0.5 * (lo_tau + hi_tau))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn symbols(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("S{i}")).collect()
    }

    #[rstest]
    #[case(vec![0.0, 0.0, 0.0])]
    #[case(vec![5.0, -3.0, 0.2])]
    #[case(vec![0.2, 0.3, 0.5])]
    #[case(vec![-100.0, 40.0, 1e3])]
    fn test_projection_is_feasible(#[case] x: Vec<f64>) {
        let bounds = WeightBounds::new(0.0, 0.6).resolve(&symbols(3)).unwrap();
        let w = bounds.project(&x);

        assert_relative_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        for wi in &w {
            assert!(*wi >= -1e-12 && *wi <= 0.6 + 1e-12);
        }
    }

    #[test]
    fn test_projection_keeps_feasible_point() {
        let bounds = WeightBounds::default().resolve(&symbols(3)).unwrap();
        let w = bounds.project(&[0.2, 0.3, 0.5]);

        assert_relative_eq!(w[0], 0.2, epsilon = 1e-9);
        assert_relative_eq!(w[1], 0.3, epsilon = 1e-9);
        assert_relative_eq!(w[2], 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_override_applies_to_one_symbol() {
        let bounds = WeightBounds::default()
            .with_override("S1", 0.5, 0.5)
            .resolve(&symbols(3))
            .unwrap();

        assert_eq!(bounds.lower(), &[0.0, 0.5, 0.0]);
        let w = bounds.project(&[1.0, 0.0, 1.0]);
        assert_relative_eq!(w[1], 0.5, epsilon = 1e-9);
        assert_relative_eq!(w[0], 0.25, epsilon = 1e-9);
    }

    #[rstest]
    #[case(WeightBounds::new(0.5, 1.0), 3)]
    #[case(WeightBounds::new(0.0, 0.2), 3)]
    #[case(WeightBounds::new(0.3, 0.1), 2)]
    fn test_infeasible_bounds(#[case] bounds: WeightBounds, #[case] n: usize) {
        assert!(matches!(
            bounds.resolve(&symbols(n)),
            Err(RiskError::InfeasibleBounds(_))
        ));
    }

    #[test]
    fn test_override_for_unknown_symbol() {
        let result = WeightBounds::default()
            .with_override("NVDA", 0.0, 0.1)
            .resolve(&symbols(2));
        assert!(matches!(result, Err(RiskError::UnknownSymbol(s)) if s == "NVDA"));
    }
}
