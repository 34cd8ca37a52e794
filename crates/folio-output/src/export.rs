//! CSV and JSON export of weights, series and backtest summaries.

use crate::error::{OutputError, Result};
use crate::summary::PerformanceSummary;
use chrono::NaiveDate;
use folio_data::{ScalarSeries, WeightMapping};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Infer the format from a file extension; JSON files are pretty-printed.
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| OutputError::InvalidFormat(path.display().to_string()))?
            .parse()
    }
}

impl FromStr for ExportFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::PrettyJson),
            "compact-json" | "jsonl" => Ok(Self::Json),
            other => Err(OutputError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<()> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WeightRow<'a> {
    symbol: &'a str,
    weight: f64,
}

#[derive(Debug, Serialize)]
struct SeriesRow {
    date: NaiveDate,
    value: f64,
}

#[derive(Debug, Serialize)]
struct BacktestRow {
    date: NaiveDate,
    portfolio_return: f64,
    cumulative_return: f64,
}

fn write_csv<S: Serialize>(rows: impl IntoIterator<Item = S>) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| OutputError::InvalidFormat(e.to_string()))
}

fn write_json<T: Serialize + ?Sized>(value: &T, format: ExportFormat) -> Result<String> {
    Ok(match format {
        ExportFormat::PrettyJson => serde_json::to_string_pretty(value)?,
        _ => serde_json::to_string(value)?,
    })
}

impl Exporter for WeightMapping {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => write_csv(
                self.iter()
                    .map(|(symbol, weight)| WeightRow { symbol, weight }),
            ),
            _ => write_json(self, format),
        }
    }
}

impl Exporter for ScalarSeries {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => {
                write_csv(self.iter().map(|(date, value)| SeriesRow { date, value }))
            }
            _ => write_json(self, format),
        }
    }
}

impl Exporter for PerformanceSummary {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => write_csv(
                self.dates
                    .iter()
                    .zip(&self.returns)
                    .zip(&self.cumulative_returns)
                    .map(|((date, r), c)| BacktestRow {
                        date: *date,
                        portfolio_return: *r,
                        cumulative_return: *c,
                    }),
            ),
            _ => write_json(self, format),
        }
    }
}
