//! Analysis stages connected through a result store.
//!
//! Each producer stage stores its result and returns an [`Envelope`] (or a
//! [`BacktestReport`]) carrying the new [`DataId`]. Consumer stages take ids,
//! never payloads, so every stage can run on its own as long as it shares the
//! store. A stage that fails stores nothing.

use crate::config::PortfolioConfig;
use crate::envelope::{BacktestReport, Envelope};
use crate::error::{PipelineError, Result};
use crate::universe::UniverseSelection;
use chrono::{Days, NaiveDate, NaiveTime, Utc};
use folio_data::{
    DataId, Payload, PriceSource, ResultStore, ReturnsTable, ScalarSeries, StoreExt,
    WeightMapping, prices_to_returns,
};
use folio_factors::{DEFAULT_SEED, FactorModel, FactorSource, RegressionSummary};
use folio_output::{BacktestEngine, FixedWeightBacktest};
use folio_risk::{MeanRisk, PortfolioOptimizer};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Calendar span of the synthetic series used when the factor model runs
/// without a stored portfolio.
const SYNTHETIC_CALENDAR_DAYS: u64 = 3 * 365;

/// Returns, portfolio, backtest and factor stages over one shared store.
pub struct Pipeline<P> {
    store: Arc<dyn ResultStore>,
    source: P,
    optimizer: Box<dyn PortfolioOptimizer + Send + Sync>,
    engine: Box<dyn BacktestEngine + Send + Sync>,
    factor_model: FactorModel,
}

impl<P> fmt::Debug for Pipeline<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("store", &self.store)
            .field("factor_model", &self.factor_model)
            .finish_non_exhaustive()
    }
}

impl<P: PriceSource> Pipeline<P> {
    /// Pipeline with the mean-risk optimizer, a fixed-weight backtest and the
    /// Fama-French three-factor model.
    pub fn new(store: Arc<dyn ResultStore>, source: P) -> Self {
        Self {
            store,
            source,
            optimizer: Box::new(MeanRisk::new()),
            engine: Box::new(FixedWeightBacktest::new()),
            factor_model: FactorModel::fama_french_3(),
        }
    }

    /// Replace the optimizer.
    pub fn with_optimizer(
        mut self,
        optimizer: impl PortfolioOptimizer + Send + Sync + 'static,
    ) -> Self {
        self.optimizer = Box::new(optimizer);
        self
    }

    /// Replace the backtest engine.
    pub fn with_engine(mut self, engine: impl BacktestEngine + Send + Sync + 'static) -> Self {
        self.engine = Box::new(engine);
        self
    }

    /// Replace the factor model.
    pub fn with_factor_model(mut self, model: FactorModel) -> Self {
        self.factor_model = model;
        self
    }

    /// The shared store.
    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Fetch closes for the selected instruments, forward-fill them, convert
    /// to simple returns and store the table.
    ///
    /// The selection is resolved before anything is fetched, so an unknown
    /// universe fails without network or store traffic.
    pub async fn prepare_returns(
        &self,
        selection: &UniverseSelection,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Envelope> {
        let symbols = selection.resolve()?;
        if start > end {
            return Err(PipelineError::Config(format!(
                "start date {start} is after end date {end}"
            )));
        }

        let from = start.and_time(NaiveTime::MIN).and_utc();
        let to = end
            .checked_add_days(Days::new(1))
            .unwrap_or(end)
            .and_time(NaiveTime::MIN)
            .and_utc();

        debug!(symbols = symbols.len(), %start, %end, "preparing returns");
        let quotes = self.source.fetch_closes(&symbols, from, to).await?;
        let table = prices_to_returns(&quotes, &symbols)?;

        let observations = table.n_observations();
        let data_id = self.store.put(Payload::from(table));
        info!(%data_id, observations, assets = symbols.len(), "stored returns");
        Ok(Envelope::data(data_id))
    }

    /// Optimize weights on the returns stored under `returns_id` and store
    /// them.
    pub fn portfolio(&self, returns_id: &DataId, config: &PortfolioConfig) -> Result<Envelope> {
        let returns = self.returns(returns_id)?;
        let weights = self.optimizer.optimize(&returns, &config.to_mean_risk())?;

        let envelope_weights = weights.clone();
        let data_id = self.store.put(Payload::from(weights));
        info!(%data_id, %returns_id, "stored portfolio weights");
        Ok(Envelope::table(data_id, &envelope_weights))
    }

    /// Backtest the stored weights over the stored returns and store the
    /// cumulative returns.
    pub fn backtest(&self, weights_id: &DataId, returns_id: &DataId) -> Result<BacktestReport> {
        let weights = self.weights(weights_id)?;
        let returns = self.returns(returns_id)?;

        let summary = self.engine.run(&returns, &weights)?;
        let cumulative = summary.cumulative_series()?;

        let data_id = self.store.put(Payload::from(cumulative));
        info!(%data_id, %weights_id, %returns_id, "stored cumulative returns");
        Ok(BacktestReport { summary, data_id })
    }

    /// Plot hint for the series stored under `data_id`.
    pub fn equity_curve(&self, data_id: &DataId) -> Result<Envelope> {
        self.series(data_id)?;
        Ok(Envelope::plot(data_id.clone()))
    }

    /// The series stored under `data_id`.
    pub fn equity_points(&self, data_id: &DataId) -> Result<Arc<ScalarSeries>> {
        self.series(data_id)
    }

    /// Regress the period returns behind the stored cumulative curve (or a
    /// seeded synthetic curve when `data_id` is `None`) on the factors from
    /// `factors`.
    pub fn factor_model(
        &self,
        data_id: Option<&DataId>,
        factors: &dyn FactorSource,
    ) -> Result<RegressionSummary> {
        let portfolio = match data_id {
            Some(id) => self.series(id)?,
            None => {
                let today = Utc::now().date_naive();
                debug!(%today, "no portfolio id, using synthetic series");
                Arc::new(folio_factors::synthetic_portfolio_series(
                    today,
                    SYNTHETIC_CALENDAR_DAYS,
                    DEFAULT_SEED,
                )?)
            }
        };

        let table = factors.load()?;
        Ok(self.factor_model.fit_cumulative(&portfolio, &table)?)
    }

    fn returns(&self, id: &DataId) -> Result<Arc<ReturnsTable>> {
        self.store
            .get_table(id)?
            .ok_or_else(|| PipelineError::MissingData(id.clone()))
    }

    fn weights(&self, id: &DataId) -> Result<Arc<WeightMapping>> {
        self.store
            .get_weights(id)?
            .ok_or_else(|| PipelineError::MissingData(id.clone()))
    }

    fn series(&self, id: &DataId) -> Result<Arc<ScalarSeries>> {
        self.store
            .get_series(id)?
            .ok_or_else(|| PipelineError::MissingData(id.clone()))
    }
}
