//! Close prices to simple returns.
//!
//! Price sources deliver long-format frames (`symbol`, `date`, `close`). This
//! module pivots them onto a common date grid, forward-fills gaps and turns the
//! result into a [`ReturnsTable`].

use crate::error::{DataError, Result};
use crate::store::ReturnsTable;
use chrono::NaiveDate;
use ndarray::Array2;
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};

/// Days between 0001-01-01 and 1970-01-01, the epoch of polars `Date`.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Wide close-price table; `None` marks a missing observation.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    prices: Vec<Vec<Option<f64>>>,
}

impl PriceTable {
    /// Pivot a long-format quotes frame into one column per requested symbol.
    ///
    /// The frame must have `symbol` (string), `date` (date) and `close` (f64)
    /// columns. Rows for symbols that were not requested are ignored; a
    /// requested symbol without any row is an error.
    pub fn from_quotes(quotes: &DataFrame, symbols: &[String]) -> Result<Self> {
        let symbol_col = quotes.column("symbol")?.as_materialized_series().clone();
        let date_col = quotes
            .column("date")?
            .as_materialized_series()
            .cast(&DataType::Int32)?;
        let close_col = quotes
            .column("close")?
            .as_materialized_series()
            .cast(&DataType::Float64)?;

        let index: HashMap<&str, usize> = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i))
            .collect();

        let mut grid: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
        let mut seen = vec![false; symbols.len()];

        let rows = symbol_col
            .str()?
            .into_iter()
            .zip(date_col.i32()?)
            .zip(close_col.f64()?);

        for ((symbol, days), close) in rows {
            let (Some(symbol), Some(days)) = (symbol, days) else {
                continue;
            };
            let Some(&col) = index.get(symbol) else {
                continue;
            };
            let date = NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
                .ok_or_else(|| DataError::TimeConversion(format!("day offset {days}")))?;

            let row = grid
                .entry(date)
                .or_insert_with(|| vec![None; symbols.len()]);
            row[col] = close.filter(|p| p.is_finite());
            seen[col] = true;
        }

        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(DataError::MissingData {
                symbol: symbols[missing].clone(),
                reason: "no quotes returned".to_string(),
            });
        }

        let (dates, prices): (Vec<_>, Vec<_>) = grid.into_iter().unzip();
        Ok(Self {
            dates,
            symbols: symbols.to_vec(),
            prices,
        })
    }

    /// Dates of the grid.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Price of `symbol` on every grid date.
    pub fn prices(&self, symbol: &str) -> Option<Vec<Option<f64>>> {
        let col = self.symbols.iter().position(|s| s == symbol)?;
        Some(self.prices.iter().map(|row| row[col]).collect())
    }

    /// Replace missing prices with the last observed price of the same
    /// instrument. Gaps before the first observation stay missing.
    pub fn forward_fill(mut self) -> Self {
        let mut last = vec![None; self.symbols.len()];
        for row in &mut self.prices {
            for (cell, prev) in row.iter_mut().zip(last.iter_mut()) {
                if cell.is_some() {
                    *prev = *cell;
                } else {
                    *cell = *prev;
                }
            }
        }
        self
    }

    /// Simple returns `p_t / p_{t-1} - 1`.
    ///
    /// The first date has no return and is dropped, as is any date where an
    /// instrument still lacks a price on it or the previous date. A zero
    /// close cannot be a return base and is an error.
    pub fn to_returns(&self) -> Result<ReturnsTable> {
        if self.dates.len() < 2 {
            return Err(DataError::InsufficientData {
                required: 2,
                actual: self.dates.len(),
            });
        }

        let n_assets = self.symbols.len();
        let mut dates = Vec::with_capacity(self.dates.len() - 1);
        let mut flat = Vec::with_capacity((self.dates.len() - 1) * n_assets);

        for (t, pair) in self.prices.windows(2).enumerate() {
            let mut row = Vec::with_capacity(n_assets);
            for (col, (prev, cur)) in pair[0].iter().zip(&pair[1]).enumerate() {
                match (prev, cur) {
                    (Some(p0), _) if *p0 == 0.0 => {
                        return Err(DataError::MissingData {
                            symbol: self.symbols[col].clone(),
                            reason: format!("zero close on {}", self.dates[t]),
                        });
                    }
                    (Some(p0), Some(p1)) => row.push(p1 / p0 - 1.0),
                    _ => {}
                }
            }

            if row.len() == n_assets {
                dates.push(self.dates[t + 1]);
                flat.extend(row);
            }
        }

        if dates.is_empty() {
            return Err(DataError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let values = Array2::from_shape_vec((dates.len(), n_assets), flat)
            .map_err(|e| DataError::Shape(e.to_string()))?;
        ReturnsTable::new(dates, self.symbols.clone(), values)
    }
}

/// Pivot, forward-fill and convert a quotes frame to simple returns.
pub fn prices_to_returns(quotes: &DataFrame, symbols: &[String]) -> Result<ReturnsTable> {
    PriceTable::from_quotes(quotes, symbols)?
        .forward_fill()
        .to_returns()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quotes() -> DataFrame {
        let dates = [
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
        ];
        df!(
            "symbol" => ["AAPL", "AAPL", "AAPL", "MSFT", "MSFT"],
            "date" => dates,
            "close" => [100.0, 110.0, 99.0, 200.0, 210.0],
        )
        .unwrap()
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pivot_uses_union_of_dates() {
        let table = PriceTable::from_quotes(&quotes(), &symbols(&["AAPL", "MSFT"])).unwrap();

        assert_eq!(table.dates().len(), 3);
        assert_eq!(
            table.prices("MSFT").unwrap(),
            vec![Some(200.0), None, Some(210.0)]
        );
    }

    #[test]
    fn test_forward_fill() {
        let table = PriceTable::from_quotes(&quotes(), &symbols(&["AAPL", "MSFT"]))
            .unwrap()
            .forward_fill();

        assert_eq!(
            table.prices("MSFT").unwrap(),
            vec![Some(200.0), Some(200.0), Some(210.0)]
        );
    }

    #[test]
    fn test_returns_after_forward_fill() {
        let returns = prices_to_returns(&quotes(), &symbols(&["AAPL", "MSFT"])).unwrap();

        assert_eq!(returns.n_observations(), 2);
        assert_eq!(returns.symbols(), &["AAPL".to_string(), "MSFT".to_string()]);
        assert_eq!(
            returns.dates()[0],
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
        );

        let aapl = returns.column("AAPL").unwrap();
        assert_relative_eq!(aapl[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(aapl[1], -0.1, epsilon = 1e-12);

        let msft = returns.column("MSFT").unwrap();
        assert_relative_eq!(msft[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(msft[1], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_column_order_follows_request() {
        let returns = prices_to_returns(&quotes(), &symbols(&["MSFT", "AAPL"])).unwrap();
        assert_eq!(returns.symbols(), &["MSFT".to_string(), "AAPL".to_string()]);
    }

    #[test]
    fn test_requested_symbol_without_quotes() {
        let result = PriceTable::from_quotes(&quotes(), &symbols(&["AAPL", "NVDA"]));
        assert!(matches!(result, Err(DataError::MissingData { symbol, .. }) if symbol == "NVDA"));
    }

    #[test]
    fn test_zero_close_is_an_error() {
        let df = df!(
            "symbol" => ["AAPL", "AAPL", "AAPL"],
            "date" => [
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            ],
            "close" => [100.0, 0.0, 50.0],
        )
        .unwrap();

        let err = prices_to_returns(&df, &symbols(&["AAPL"])).unwrap_err();
        assert!(matches!(
            err,
            DataError::MissingData { symbol, reason }
                if symbol == "AAPL" && reason.contains("2024-01-03")
        ));
    }

    #[test]
    fn test_single_date_is_insufficient() {
        let df = df!(
            "symbol" => ["AAPL"],
            "date" => [NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()],
            "close" => [100.0],
        )
        .unwrap();

        let result = prices_to_returns(&df, &symbols(&["AAPL"]));
        assert!(matches!(
            result,
            Err(DataError::InsufficientData { required: 2, .. })
        ));
    }
}
