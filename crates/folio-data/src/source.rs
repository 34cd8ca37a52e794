//! Price source abstraction.

use crate::error::Result;
use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;

/// Anything that can deliver historical close prices.
///
/// Implementations return a long-format frame with columns
/// `symbol` (string), `date` (date) and `close` (f64, split/dividend adjusted),
/// covering every requested symbol. A symbol that cannot be fetched fails the
/// whole call.
#[allow(async_fn_in_trait)]
pub trait PriceSource {
    /// Fetch adjusted closes for `symbols` between `start` and `end`.
    async fn fetch_closes(
        &self,
        symbols: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<DataFrame>;
}
