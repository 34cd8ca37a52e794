//! End-to-end pipeline tests against an in-memory price source.

use approx::assert_relative_eq;
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use folio::data::{DataError, DataId, MemoryStore, PriceSource, ResultStore, StoreExt};
use folio::factors::{FactorSource, FactorTable, FamaFrenchCsv};
use folio::{Pipeline, PipelineError, PortfolioConfig, RenderType, UniverseSelection};
use polars::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn trading_days(n: usize) -> Vec<NaiveDate> {
    let mut day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut days = Vec::with_capacity(n);
    while days.len() < n {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(day);
        }
        day = day.succ_opt().unwrap();
    }
    days
}

fn quotes(n: usize) -> DataFrame {
    let days = trading_days(n);
    let mut symbols = Vec::new();
    let mut dates = Vec::new();
    let mut closes = Vec::new();
    for (k, symbol) in ["AAPL", "MSFT", "NVDA"].iter().enumerate() {
        let mut price = 100.0 + 50.0 * k as f64;
        for (t, day) in days.iter().enumerate() {
            price *= 1.0 + 0.01 * ((t as f64) * (0.7 + 0.3 * k as f64)).sin() + 0.0005 * k as f64;
            symbols.push(*symbol);
            dates.push(*day);
            closes.push(price);
        }
    }
    df!("symbol" => symbols, "date" => dates, "close" => closes).unwrap()
}

struct FakeSource {
    quotes: DataFrame,
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl FakeSource {
    fn new(n: usize) -> Self {
        Self::with_quotes(quotes(n))
    }

    fn with_quotes(quotes: DataFrame) -> Self {
        Self {
            quotes,
            calls: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }

    /// Shared counter of `fetch_closes` calls.
    fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(2)
        }
    }
}

impl PriceSource for FakeSource {
    async fn fetch_closes(
        &self,
        _symbols: &[String],
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> folio::data::Result<DataFrame> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DataError::YahooApi("connection refused".to_string()));
        }
        Ok(self.quotes.clone())
    }
}

struct CsvFactors(String);

impl FactorSource for CsvFactors {
    fn load(&self) -> folio::factors::Result<FactorTable> {
        FamaFrenchCsv::from_reader(self.0.as_bytes(), true)
    }
}

fn factor_csv(days: &[NaiveDate]) -> String {
    let mut csv = String::from("Daily factors\n\n,Mkt-RF,SMB,HML,RF\n");
    for (t, day) in days.iter().enumerate() {
        let t = t as f64;
        csv.push_str(&format!(
            "{},{:.4},{:.4},{:.4},0.0200\n",
            day.format("%Y%m%d"),
            (t * 0.9).sin(),
            0.5 * (t * 1.7).cos(),
            0.4 * (t * 0.3 + 0.5).sin(),
        ));
    }
    csv
}

fn pipeline(source: FakeSource) -> (Pipeline<FakeSource>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (Pipeline::new(store.clone(), source), store)
}

fn range() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
    )
}

#[tokio::test]
async fn test_two_asset_scenario() {
    let (pipeline, store) = pipeline(FakeSource::new(40));
    let (start, end) = range();

    let returns = pipeline
        .prepare_returns(&UniverseSelection::symbols(["AAPL", "MSFT"]), start, end)
        .await
        .unwrap();
    assert!(returns.render_type.is_none());
    let r1 = returns.data_id;
    let table = store.get_table(&r1).unwrap().unwrap();
    assert_eq!(table.n_observations(), 39);

    let weights = pipeline.portfolio(&r1, &PortfolioConfig::default()).unwrap();
    assert_eq!(weights.render_type, Some(RenderType::Table));
    let table_data = weights.table_data.unwrap();
    assert_eq!(
        table_data.keys().collect::<Vec<_>>(),
        vec!["AAPL", "MSFT"]
    );

    let report = pipeline.backtest(&weights.data_id, &r1).unwrap();
    let cumulative = store.get_series(&report.data_id).unwrap().unwrap();
    assert_eq!(cumulative.len(), table.n_observations());
    assert_eq!(cumulative.first(), Some(0.0));
    assert_eq!(report.summary.n_observations, 39);

    let curve = pipeline.equity_curve(&report.data_id).unwrap();
    assert_eq!(curve.render_type, Some(RenderType::Plot));
    assert_eq!(pipeline.equity_points(&report.data_id).unwrap(), cumulative);

    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn test_weight_envelope_resolves_to_requested_instruments() {
    let (pipeline, store) = pipeline(FakeSource::new(60));
    let (start, end) = range();
    let requested = ["NVDA", "AAPL", "MSFT"];

    let r = pipeline
        .prepare_returns(&UniverseSelection::symbols(requested), start, end)
        .await
        .unwrap()
        .data_id;
    let envelope = pipeline.portfolio(&r, &PortfolioConfig::default()).unwrap();

    let stored = store.get_weights(&envelope.data_id).unwrap().unwrap();
    let mut keys: Vec<&str> = stored.symbols().collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["AAPL", "MSFT", "NVDA"]);
    assert_relative_eq!(stored.sum(), 1.0, epsilon = 1e-6);
    assert_eq!(envelope.table_data.as_ref(), Some(stored.as_map()));
}

#[tokio::test]
async fn test_unknown_universe_writes_nothing() {
    let source = FakeSource::new(10);
    let calls = source.calls();
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(store.clone(), source);
    let (start, end) = range();

    let err = pipeline
        .prepare_returns(&UniverseSelection::universe("ftse-mib"), start, end)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Config(_)));
    assert!(store.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_fetch_writes_nothing() {
    let source = FakeSource::failing();
    let calls = source.calls();
    let (pipeline, store) = pipeline(source);
    let (start, end) = range();

    let err = pipeline
        .prepare_returns(&UniverseSelection::symbols(["AAPL"]), start, end)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Data(DataError::YahooApi(_))));
    assert!(store.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_inverted_date_range_is_rejected_before_fetch() {
    let source = FakeSource::new(10);
    let calls = source.calls();
    let store = Arc::new(MemoryStore::new());
    let pipeline = Pipeline::new(store.clone(), source);
    let (start, end) = range();

    let err = pipeline
        .prepare_returns(&UniverseSelection::symbols(["AAPL"]), end, start)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
    assert!(store.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_consumers_report_missing_ids() {
    let (pipeline, _store) = pipeline(FakeSource::new(10));
    let unknown = DataId::from("never-stored");

    assert!(matches!(
        pipeline.portfolio(&unknown, &PortfolioConfig::default()),
        Err(PipelineError::MissingData(id)) if id == unknown
    ));
    assert!(matches!(
        pipeline.equity_curve(&unknown),
        Err(PipelineError::MissingData(_))
    ));
}

#[tokio::test]
async fn test_wrong_payload_kind_is_an_error() {
    let (pipeline, store) = pipeline(FakeSource::new(20));
    let (start, end) = range();
    let r = pipeline
        .prepare_returns(&UniverseSelection::symbols(["AAPL", "MSFT"]), start, end)
        .await
        .unwrap()
        .data_id;

    assert!(matches!(
        pipeline.backtest(&r, &r),
        Err(PipelineError::Data(DataError::PayloadKind { .. }))
    ));
    assert!(matches!(
        pipeline.equity_curve(&r),
        Err(PipelineError::Data(DataError::PayloadKind { .. }))
    ));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_failed_optimization_writes_nothing() {
    let (pipeline, store) = pipeline(FakeSource::new(20));
    let (start, end) = range();
    let r = pipeline
        .prepare_returns(&UniverseSelection::symbols(["AAPL", "MSFT"]), start, end)
        .await
        .unwrap()
        .data_id;

    let config = PortfolioConfig {
        max_weight: 0.3,
        ..Default::default()
    };
    assert!(matches!(
        pipeline.portfolio(&r, &config),
        Err(PipelineError::Risk(_))
    ));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_factor_model_on_backtest_series() {
    let (pipeline, _store) = pipeline(FakeSource::new(50));
    let (start, end) = range();
    let r = pipeline
        .prepare_returns(&UniverseSelection::symbols(["AAPL", "MSFT"]), start, end)
        .await
        .unwrap()
        .data_id;
    let w = pipeline
        .portfolio(&r, &PortfolioConfig::default())
        .unwrap()
        .data_id;
    let report = pipeline.backtest(&w, &r).unwrap();

    // factor file covers only part of the backtest window
    let days = trading_days(50);
    let factors = CsvFactors(factor_csv(&days[10..]));
    let summary = pipeline
        .factor_model(Some(&report.data_id), &factors)
        .unwrap();

    assert_eq!(summary.nobs, 40);
    assert_eq!(summary.coefficients.len(), 4);
    assert_eq!(summary.coefficients[0].name, "const");
}

#[tokio::test]
async fn test_factor_model_recovers_market_loading() {
    let days = trading_days(60);
    let factors = CsvFactors(factor_csv(&days));
    let table = factors.load().unwrap();
    let mkt = table.column("Mkt-RF").unwrap();
    let rf = table.column("RF").unwrap();

    // a single asset whose return is exactly the market return
    let mut price = 100.0;
    let closes: Vec<f64> = (0..days.len())
        .map(|t| {
            if t > 0 {
                price *= 1.0 + rf[t] + mkt[t];
            }
            price
        })
        .collect();
    let quotes = df!(
        "symbol" => vec!["SPY"; days.len()],
        "date" => days.clone(),
        "close" => closes,
    )
    .unwrap();

    let (pipeline, _store) = pipeline(FakeSource::with_quotes(quotes));
    let (start, end) = range();
    let r = pipeline
        .prepare_returns(&UniverseSelection::symbols(["SPY"]), start, end)
        .await
        .unwrap()
        .data_id;
    let w = pipeline
        .portfolio(&r, &PortfolioConfig::default())
        .unwrap()
        .data_id;
    let report = pipeline.backtest(&w, &r).unwrap();

    let summary = pipeline
        .factor_model(Some(&report.data_id), &factors)
        .unwrap();

    // the first return date is the curve's inception and has no period return
    assert_eq!(summary.nobs, days.len() - 2);
    assert_relative_eq!(summary.coefficient("Mkt-RF").unwrap().estimate, 1.0, epsilon = 1e-8);
    assert_relative_eq!(summary.coefficient("SMB").unwrap().estimate, 0.0, epsilon = 1e-8);
    assert_relative_eq!(summary.alpha().unwrap(), 0.0, epsilon = 1e-10);
    assert_relative_eq!(summary.r_squared, 1.0, epsilon = 1e-8);
}

#[test]
fn test_factor_model_without_id_uses_synthetic_series() {
    let (pipeline, store) = pipeline(FakeSource::new(10));
    let today = Utc::now().date_naive();
    let days = folio::factors::business_days(
        today.checked_sub_days(chrono::Days::new(400)).unwrap(),
        today,
    );
    let factors = CsvFactors(factor_csv(&days));

    let summary = pipeline.factor_model(None, &factors).unwrap();
    assert!(summary.nobs > 250);
    assert!(store.is_empty());
}
