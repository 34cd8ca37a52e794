//! What producer stages hand back to their callers.

use folio_data::{DataId, WeightMapping};
use folio_output::PerformanceSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Presentation hint for a stored result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderType {
    /// Show as a table.
    Table,
    /// Show as a line plot.
    Plot,
}

/// Reference to a stored result, optionally with a rendering hint and the
/// weights inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Presentation hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_type: Option<RenderType>,
    /// Weights, present for the portfolio stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_data: Option<BTreeMap<String, f64>>,
    /// Key of the stored result.
    pub data_id: DataId,
}

impl Envelope {
    /// Bare reference to `data_id`.
    pub const fn data(data_id: DataId) -> Self {
        Self {
            render_type: None,
            table_data: None,
            data_id,
        }
    }

    /// Weights shown as a table.
    pub fn table(data_id: DataId, weights: &WeightMapping) -> Self {
        Self {
            render_type: Some(RenderType::Table),
            table_data: Some(weights.as_map().clone()),
            data_id,
        }
    }

    /// Series shown as a plot.
    pub const fn plot(data_id: DataId) -> Self {
        Self {
            render_type: Some(RenderType::Plot),
            table_data: None,
            data_id,
        }
    }
}

/// Backtest summary carrying the id of the stored cumulative returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Performance statistics.
    #[serde(flatten)]
    pub summary: PerformanceSummary,
    /// Key of the cumulative-returns series.
    pub data_id: DataId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_envelope_shape() {
        let envelope = Envelope::data(DataId::from("r1"));
        assert_eq!(serde_json::to_value(&envelope).unwrap(), json!({"data_id": "r1"}));
    }

    #[test]
    fn test_table_envelope_shape() {
        let weights: WeightMapping = [("AAPL".to_string(), 0.4), ("MSFT".to_string(), 0.6)]
            .into_iter()
            .collect();
        let envelope = Envelope::table(DataId::from("w1"), &weights);

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "render_type": "table",
                "table_data": {"AAPL": 0.4, "MSFT": 0.6},
                "data_id": "w1"
            })
        );
    }

    #[test]
    fn test_plot_envelope_round_trip() {
        let envelope = Envelope::plot(DataId::from("c1"));
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json, r#"{"render_type":"plot","data_id":"c1"}"#);
        assert_eq!(serde_json::from_str::<Envelope>(&json).unwrap(), envelope);
    }
}
