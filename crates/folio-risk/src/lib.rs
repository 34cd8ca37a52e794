#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/folio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod bounds;
pub mod error;
pub mod mean_risk;
pub mod measure;
pub mod objective;

// Re-export main types
pub use bounds::{ResolvedBounds, WeightBounds};
pub use error::RiskError;
pub use mean_risk::{MeanRisk, MeanRiskConfig, PortfolioOptimizer, portfolio_returns};
pub use measure::{MeasureParams, RiskMeasure};
pub use objective::ObjectiveFunction;
