//! Factor return tables and their sources.

use crate::error::{FactorError, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use ndarray::{Array2, ArrayView1};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Market excess return column.
pub const MKT_RF: &str = "Mkt-RF";
/// Small-minus-big column.
pub const SMB: &str = "SMB";
/// High-minus-low column.
pub const HML: &str = "HML";
/// Risk-free rate column.
pub const RF: &str = "RF";

/// Daily factor returns, one row per date and one column per factor.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorTable {
    dates: Vec<NaiveDate>,
    names: Vec<String>,
    values: Array2<f64>,
}

impl FactorTable {
    /// Build a table; dates must be strictly increasing and match the rows.
    pub fn new(dates: Vec<NaiveDate>, names: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if values.nrows() != dates.len() || values.ncols() != names.len() {
            return Err(FactorError::Parse(format!(
                "factor values are {}x{}, expected {}x{}",
                values.nrows(),
                values.ncols(),
                dates.len(),
                names.len()
            )));
        }
        if let Some(pair) = dates.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(FactorError::Parse(format!(
                "factor dates not strictly increasing at {}",
                pair[1]
            )));
        }

        Ok(Self {
            dates,
            names,
            values,
        })
    }

    /// Observation dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Factor names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Value matrix (dates x factors).
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the table has no dates.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Column of `name`.
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let idx = self.names.iter().position(|n| n == name)?;
        Some(self.values.column(idx))
    }

    /// Column of `name`, or [`FactorError::MissingFactor`].
    pub fn require(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        self.column(name)
            .ok_or_else(|| FactorError::MissingFactor(name.to_string()))
    }

    /// Row index of `date`.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }
}

/// Provider of factor return tables.
pub trait FactorSource {
    /// Load the factor table.
    fn load(&self) -> Result<FactorTable>;
}

/// Reader for the daily CSV files of the Kenneth French data library.
///
/// The files open with free-text description lines, followed by a header
/// row whose first cell is empty (`,Mkt-RF,SMB,HML,RF`) and rows keyed by
/// `YYYYMMDD` dates. Values are in percent. The first row after the header
/// that does not start with a date ends the table, which skips the copyright
/// footer and any annual section further down.
#[derive(Debug, Clone)]
pub struct FamaFrenchCsv {
    path: PathBuf,
    percent: bool,
}

impl FamaFrenchCsv {
    /// Read factors from `path`, converting percent to decimals.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            percent: true,
        }
    }

    /// Treat values as already being decimals.
    pub const fn decimal(mut self) -> Self {
        self.percent = false;
        self
    }

    /// The file this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse a factor table from any reader.
    pub fn from_reader<R: Read>(reader: R, percent: bool) -> Result<FactorTable> {
        let mut csv = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let scale = if percent { 0.01 } else { 1.0 };
        let mut names: Option<Vec<String>> = None;
        let mut dates = Vec::new();
        let mut flat = Vec::new();

        for record in csv.records() {
            let record = record?;
            let Some(n_factors) = names.as_ref().map(Vec::len) else {
                if is_header(&record) {
                    names = Some(record.iter().skip(1).map(str::to_string).collect());
                }
                continue;
            };

            let Some(date) = record.get(0).and_then(parse_date) else {
                break;
            };
            if record.len() != n_factors + 1 {
                return Err(FactorError::Parse(format!(
                    "row {date} has {} values, expected {n_factors}",
                    record.len() - 1
                )));
            }
            for cell in record.iter().skip(1) {
                let value: f64 = cell
                    .parse()
                    .map_err(|_| FactorError::Parse(format!("bad value {cell:?} on {date}")))?;
                flat.push(value * scale);
            }
            dates.push(date);
        }

        let names = names.ok_or_else(|| FactorError::Parse("no factor header row".to_string()))?;
        let values = Array2::from_shape_vec((dates.len(), names.len()), flat)
            .map_err(|e| FactorError::Parse(e.to_string()))?;
        debug!(rows = dates.len(), factors = names.len(), "parsed factor table");
        FactorTable::new(dates, names, values)
    }
}

impl FactorSource for FamaFrenchCsv {
    fn load(&self) -> Result<FactorTable> {
        let file = File::open(&self.path)?;
        let table = Self::from_reader(file, self.percent)?;
        info!(
            path = %self.path.display(),
            rows = table.len(),
            "loaded factor table"
        );
        Ok(table)
    }
}

fn is_header(record: &StringRecord) -> bool {
    let first = record.get(0).unwrap_or_default();
    (first.is_empty() || first.eq_ignore_ascii_case("date"))
        && record.iter().skip(1).any(|cell| cell == MKT_RF)
}

fn parse_date(cell: &str) -> Option<NaiveDate> {
    if cell.len() != 8 || !cell.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(cell, "%Y%m%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE: &str = "\
This file was created by CMPT_ME_BEME_RETS using the 202312 CRSP database.
The 1-month TBill return is from Ibbotson and Associates Inc.

,Mkt-RF,SMB,HML,RF
20240102,   -0.71,    0.26,    1.03,    0.02
20240103,   -1.06,   -0.05,    0.62,    0.02
20240104,   -0.30,    0.31,    0.11,    0.02

 Copyright 2024 Kenneth R. French
";

    #[test]
    fn test_parse_french_layout() {
        let table = FamaFrenchCsv::from_reader(SAMPLE.as_bytes(), true).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.names(), &["Mkt-RF", "SMB", "HML", "RF"]);
        assert_eq!(table.dates()[0], NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_relative_eq!(table.require(MKT_RF).unwrap()[0], -0.0071, epsilon = 1e-12);
        assert_relative_eq!(table.require(RF).unwrap()[2], 0.0002, epsilon = 1e-12);
    }

    #[test]
    fn test_decimal_values_with_date_header() {
        let csv = "date,Mkt-RF,SMB,HML,RF\n20240102,0.01,0.02,0.03,0.0001\n";
        let table = FamaFrenchCsv::from_reader(csv.as_bytes(), false).unwrap();
        assert_relative_eq!(table.require(HML).unwrap()[0], 0.03, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_header() {
        let result = FamaFrenchCsv::from_reader("20240102,1,2,3,4\n".as_bytes(), true);
        assert!(matches!(result, Err(FactorError::Parse(_))));
    }

    #[test]
    fn test_bad_value() {
        let csv = ",Mkt-RF,SMB,HML,RF\n20240102,x,0.2,0.3,0.01\n";
        let result = FamaFrenchCsv::from_reader(csv.as_bytes(), true);
        assert!(matches!(result, Err(FactorError::Parse(_))));
    }

    #[test]
    fn test_missing_factor_column() {
        let csv = ",Mkt-RF,RF\n20240102,0.1,0.01\n";
        let table = FamaFrenchCsv::from_reader(csv.as_bytes(), true).unwrap();
        assert!(matches!(
            table.require(SMB),
            Err(FactorError::MissingFactor(name)) if name == "SMB"
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = FamaFrenchCsv::new("/nonexistent/F-F_Research_Data_Factors_daily.csv").load();
        assert!(matches!(result, Err(FactorError::Io(_))));
    }
}
