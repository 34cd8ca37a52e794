//! Typed payloads held by the result store.
//!
//! The store only ever holds one of three shapes: a returns table, a weight
//! mapping or a scalar time series. Consumers match on [`Payload`] instead of
//! guessing the shape of whatever a producer happened to cache.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Discriminant of a [`Payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// [`ReturnsTable`]
    Table,
    /// [`WeightMapping`]
    Weights,
    /// [`ScalarSeries`]
    Series,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Table => "returns table",
            Self::Weights => "weight mapping",
            Self::Series => "scalar series",
        };
        f.write_str(name)
    }
}

/// A cached analysis result.
///
/// Variants share their contents through [`Arc`], so handing a payload to a
/// reader never copies the data and a later overwrite of the same key cannot
/// change what the reader already holds.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Time-indexed table with one column per instrument.
    Table(Arc<ReturnsTable>),
    /// Instrument to weight mapping.
    Weights(Arc<WeightMapping>),
    /// Time-indexed scalar values.
    Series(Arc<ScalarSeries>),
}

impl Payload {
    /// Kind of this payload.
    pub const fn kind(&self) -> PayloadKind {
        match self {
            Self::Table(_) => PayloadKind::Table,
            Self::Weights(_) => PayloadKind::Weights,
            Self::Series(_) => PayloadKind::Series,
        }
    }

    /// The returns table, if this payload is one.
    pub fn as_table(&self) -> Option<&Arc<ReturnsTable>> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    /// The weight mapping, if this payload is one.
    pub fn as_weights(&self) -> Option<&Arc<WeightMapping>> {
        match self {
            Self::Weights(weights) => Some(weights),
            _ => None,
        }
    }

    /// The scalar series, if this payload is one.
    pub fn as_series(&self) -> Option<&Arc<ScalarSeries>> {
        match self {
            Self::Series(series) => Some(series),
            _ => None,
        }
    }
}

impl From<ReturnsTable> for Payload {
    fn from(table: ReturnsTable) -> Self {
        Self::Table(Arc::new(table))
    }
}

impl From<WeightMapping> for Payload {
    fn from(weights: WeightMapping) -> Self {
        Self::Weights(Arc::new(weights))
    }
}

impl From<ScalarSeries> for Payload {
    fn from(series: ScalarSeries) -> Self {
        Self::Series(Arc::new(series))
    }
}

/// Simple returns, one row per date and one column per instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnsTable {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    values: Array2<f64>,
}

impl ReturnsTable {
    /// Create a table, checking that `values` is `dates.len() x symbols.len()`
    /// and that every symbol appears once.
    pub fn new(dates: Vec<NaiveDate>, symbols: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if values.dim() != (dates.len(), symbols.len()) {
            return Err(DataError::Shape(format!(
                "values are {:?}, expected ({}, {})",
                values.dim(),
                dates.len(),
                symbols.len()
            )));
        }

        let mut seen = HashSet::with_capacity(symbols.len());
        for symbol in &symbols {
            if !seen.insert(symbol.as_str()) {
                return Err(DataError::DuplicateSymbol(symbol.clone()));
            }
        }

        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DataError::Shape(
                "dates must be strictly increasing".to_string(),
            ));
        }

        Ok(Self {
            dates,
            symbols,
            values,
        })
    }

    /// Observation dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Instrument identifiers in column order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Return matrix (dates x instruments).
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of return observations (rows).
    pub fn n_observations(&self) -> usize {
        self.dates.len()
    }

    /// Number of instruments (columns).
    pub fn n_assets(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the table has no observations or no instruments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns of a single instrument.
    pub fn column(&self, symbol: &str) -> Option<ArrayView1<'_, f64>> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|idx| self.values.index_axis(Axis(1), idx))
    }
}

/// Portfolio allocation keyed by instrument identifier.
///
/// The association between instrument and weight is explicit; nothing relies
/// on the position of a weight in some other table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightMapping(BTreeMap<String, f64>);

impl WeightMapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the weight of an instrument, returning the previous weight.
    pub fn insert(&mut self, symbol: impl Into<String>, weight: f64) -> Option<f64> {
        self.0.insert(symbol.into(), weight)
    }

    /// Weight of an instrument.
    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.0.get(symbol).copied()
    }

    /// Sum of all weights.
    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    /// Number of instruments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Instrument identifiers in sorted order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate over `(symbol, weight)` pairs in sorted symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(s, w)| (s.as_str(), *w))
    }

    /// Weights laid out in the order of `symbols`.
    ///
    /// Fails if any requested symbol has no weight.
    pub fn aligned_to(&self, symbols: &[String]) -> Result<Vec<f64>> {
        symbols
            .iter()
            .map(|symbol| {
                self.get(symbol).ok_or_else(|| DataError::MissingData {
                    symbol: symbol.clone(),
                    reason: "no weight for instrument".to_string(),
                })
            })
            .collect()
    }

    /// Borrow the underlying map.
    pub const fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.0
    }
}

impl FromIterator<(String, f64)> for WeightMapping {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, f64>> for WeightMapping {
    fn from(map: BTreeMap<String, f64>) -> Self {
        Self(map)
    }
}

/// Time-indexed scalar values, e.g. a cumulative return curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl ScalarSeries {
    /// Create a series; `dates` and `values` must have equal length.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(DataError::Shape(format!(
                "{} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        Ok(Self { dates, values })
    }

    /// Observation dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Observed values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First value, if any.
    pub fn first(&self) -> Option<f64> {
        self.values.first().copied()
    }

    /// Last value, if any.
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Iterate over `(date, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}
