#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/folio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod backtest;
pub mod error;
pub mod export;
pub mod summary;

pub use backtest::{BacktestEngine, FixedWeightBacktest};
pub use error::{OutputError, Result};
pub use export::{ExportFormat, Exporter};
pub use summary::{PerformanceSummary, compounded_returns, cumulative_returns, max_drawdown};
