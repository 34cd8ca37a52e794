//! Portfolio options and process settings.

use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use folio_data::StoreConfig;
use folio_risk::{MeanRiskConfig, MeasureParams, ObjectiveFunction, RiskMeasure, WeightBounds};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Options of the portfolio stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    /// Optimization objective.
    pub objective: ObjectiveFunction,
    /// Risk measure.
    pub risk_measure: RiskMeasure,
    /// Minimum weight of every instrument.
    pub min_weight: f64,
    /// Maximum weight of every instrument.
    pub max_weight: f64,
    /// Per-instrument `(min, max)` overrides.
    pub bounds: BTreeMap<String, (f64, f64)>,
    /// Risk aversion of the utility objective.
    pub risk_aversion: f64,
    /// Per-period risk-free rate of the ratio objective.
    pub risk_free_rate: f64,
    /// Confidence level of the tail risk measures.
    pub beta: f64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            objective: ObjectiveFunction::default(),
            risk_measure: RiskMeasure::default(),
            min_weight: 0.0,
            max_weight: 1.0,
            bounds: BTreeMap::new(),
            risk_aversion: 1.0,
            risk_free_rate: 0.0,
            beta: MeasureParams::default().beta,
        }
    }
}

impl PortfolioConfig {
    /// Parse objective and risk measure names, e.g. `MINIMIZE_RISK` and
    /// `CVAR`. Unknown names fail before any work is done.
    pub fn from_options(objective: &str, risk_measure: &str) -> Result<Self> {
        Ok(Self {
            objective: objective.parse()?,
            risk_measure: risk_measure.parse()?,
            ..Self::default()
        })
    }

    /// Optimizer settings for this configuration.
    pub fn to_mean_risk(&self) -> MeanRiskConfig {
        MeanRiskConfig {
            objective: self.objective,
            risk_measure: self.risk_measure,
            bounds: WeightBounds {
                min: self.min_weight,
                max: self.max_weight,
                overrides: self.bounds.clone(),
            },
            risk_aversion: self.risk_aversion,
            risk_free_rate: self.risk_free_rate,
            measure_params: MeasureParams {
                beta: self.beta,
                ..MeasureParams::default()
            },
            ..MeanRiskConfig::default()
        }
    }
}

/// Process settings read from a JSON file.
///
/// Every field is optional in the file; missing ones take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// First date of price history.
    pub start_date: NaiveDate,
    /// Last date of price history; today when unset.
    pub end_date: Option<NaiveDate>,
    /// Pause after each symbol fetch, in milliseconds.
    pub rate_limit_ms: u64,
    /// Kenneth French daily factor CSV.
    pub factors_csv: Option<PathBuf>,
    /// Expire store entries after this many seconds.
    pub store_max_age_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            end_date: None,
            rate_limit_ms: 1000,
            factors_csv: None,
            store_max_age_secs: None,
        }
    }
}

impl Settings {
    /// Platform config location, e.g. `~/.config/folio/config.json` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("folio")
            .join("config.json")
    }

    /// Read settings from `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))
    }

    /// Parse settings from a JSON document.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read `path`, or the default location when `None`. A missing default
    /// file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    debug!(path = %path.display(), "no settings file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Pause between symbol fetches.
    pub const fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// Lifecycle policy for the result store.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_age: self
                .store_max_age_secs
                .and_then(|secs| i64::try_from(secs).ok())
                .map(chrono::Duration::seconds),
        }
    }
}
