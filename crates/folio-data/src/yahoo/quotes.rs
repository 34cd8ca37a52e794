//! Close price fetching from Yahoo Finance.

use crate::error::{DataError, Result};
use crate::source::PriceSource;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use polars::prelude::*;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};
use yahoo_finance_api as yahoo;

/// Default number of concurrent symbol fetches.
const DEFAULT_CONCURRENCY: usize = 10;

/// Yahoo Finance quote provider with rate limiting.
pub struct YahooQuoteProvider {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
    concurrency: usize,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl YahooQuoteProvider {
    /// Create a provider with default rate limiting (1 req/sec per task).
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(1000))
    }

    /// Create a provider with custom rate limiting.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            rate_limit_delay,
            concurrency: DEFAULT_CONCURRENCY,
        })
    }

    /// Limit the number of symbols fetched at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch adjusted closes for a single symbol.
    ///
    /// # Returns
    /// A Polars DataFrame with columns: symbol, date, close
    pub async fn fetch_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<DataFrame> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }

        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let start_time = time::OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;
        let end_time = time::OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;

        debug!(symbol, %start, %end, "requesting quote history");
        let response = self
            .provider
            .get_quote_history(symbol, start_time, end_time)
            .await?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        if quotes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }

        let timestamps: Vec<i64> = quotes.iter().map(|q| q.timestamp).collect();
        let closes: Vec<f64> = quotes.iter().map(|q| q.adjclose).collect();

        let df = DataFrame::new(vec![
            Series::new("symbol".into(), vec![symbol; timestamps.len()]).into(),
            Series::new("timestamp".into(), timestamps).into(),
            Series::new("close".into(), closes).into(),
        ])?;

        let df = df
            .lazy()
            .with_column(
                (col("timestamp") * lit(1_000_000_000))
                    .cast(DataType::Datetime(TimeUnit::Nanoseconds, None))
                    .cast(DataType::Date)
                    .alias("date"),
            )
            .select(&[col("symbol"), col("date"), col("close")])
            .collect()?;

        sleep(self.rate_limit_delay).await;

        Ok(df)
    }
}

impl PriceSource for YahooQuoteProvider {
    async fn fetch_closes(
        &self,
        symbols: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<DataFrame> {
        if symbols.is_empty() {
            return Err(DataError::InvalidSymbol("No symbols requested".to_string()));
        }

        let frames: Vec<LazyFrame> = stream::iter(symbols)
            .map(|symbol| async move {
                self.fetch_quotes(symbol, start, end)
                    .await
                    .map(|df| df.lazy())
            })
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;

        let combined = concat(frames, UnionArgs::default())?.collect()?;
        info!(
            symbols = symbols.len(),
            rows = combined.height(),
            "fetched close prices"
        );
        Ok(combined)
    }
}
