//! Date alignment of a portfolio series with a factor table.

use crate::error::{FactorError, Result};
use crate::table::FactorTable;
use chrono::NaiveDate;
use folio_data::ScalarSeries;
use ndarray::{Array2, ArrayView1};

/// Portfolio observations and factor rows that share a date.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSample {
    dates: Vec<NaiveDate>,
    portfolio: Vec<f64>,
    names: Vec<String>,
    factors: Array2<f64>,
}

impl AlignedSample {
    /// Common dates, in portfolio order.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Portfolio values on the common dates.
    pub fn portfolio(&self) -> &[f64] {
        &self.portfolio
    }

    /// Factor values on the common dates.
    pub const fn factors(&self) -> &Array2<f64> {
        &self.factors
    }

    /// Factor column of `name` on the common dates.
    pub fn factor(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        let idx = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| FactorError::MissingFactor(name.to_string()))?;
        Ok(self.factors.column(idx))
    }

    /// Number of common dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether no dates are shared.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Inner join of `portfolio` and `factors` on date.
///
/// Dates present on only one side are dropped; nothing is filled. An empty
/// intersection is [`FactorError::NoOverlap`].
pub fn align(portfolio: &ScalarSeries, factors: &FactorTable) -> Result<AlignedSample> {
    let mut dates = Vec::new();
    let mut values = Vec::new();
    let mut rows = Vec::new();

    for (date, value) in portfolio.iter() {
        if let Some(row) = factors.position(date) {
            dates.push(date);
            values.push(value);
            rows.push(row);
        }
    }

    if dates.is_empty() {
        return Err(FactorError::NoOverlap);
    }

    let factors_view = factors.values();
    let aligned = Array2::from_shape_fn((rows.len(), factors_view.ncols()), |(i, j)| {
        factors_view[[rows[i], j]]
    });

    Ok(AlignedSample {
        dates,
        portfolio: values,
        names: factors.names().to_vec(),
        factors: aligned,
    })
}
