#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/folio/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod returns;
pub mod source;
pub mod store;
pub mod yahoo;

pub use error::{DataError, Result};
pub use returns::{PriceTable, prices_to_returns};
pub use source::PriceSource;
pub use store::{
    DataId, MemoryStore, Payload, PayloadKind, ResultStore, ReturnsTable, ScalarSeries,
    StoreConfig, StoreExt, WeightMapping,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
