#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/folio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod envelope;
pub mod error;
pub mod pipeline;
pub mod universe;

// Re-export main types from sub-crates
pub use folio_data as data;
pub use folio_factors as factors;
pub use folio_output as output;
pub use folio_risk as risk;

pub use config::{PortfolioConfig, Settings};
pub use envelope::{BacktestReport, Envelope, RenderType};
pub use error::{PipelineError, Result};
pub use pipeline::Pipeline;
pub use universe::{GicsSector, SP500Universe, Universe, UniverseSelection};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
