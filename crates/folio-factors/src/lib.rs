#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/folio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod align;
pub mod error;
pub mod model;
pub mod ols;
pub mod synthetic;
pub mod table;

pub use align::{AlignedSample, align};
pub use error::{FactorError, Result};
pub use model::{FactorModel, RegressionSummary};
pub use ols::{Coefficient, OlsFit, ols};
pub use synthetic::{DEFAULT_SEED, business_days, synthetic_portfolio_series};
pub use table::{FactorSource, FactorTable, FamaFrenchCsv};
