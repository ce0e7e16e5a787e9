//! Forecast orchestration
//!
//! [`ForecastRunner`] builds a fresh [`Forecaster`] for every call, fits it on
//! a [`TrainingSeries`], extends the index past the history and predicts every
//! row. The bundled model is [`AdditiveModel`].

mod additive;
mod linalg;

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::reshape::TrainingSeries;

pub use self::additive::{AdditiveModel, AdditiveParams, Seasonality};
pub use self::linalg::solve;

/// One predicted row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastRow {
    pub ds: NaiveDate,
    /// Point estimate
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    /// Trend component
    pub trend: f64,
    /// Weekly seasonal component (0 when disabled)
    pub weekly: f64,
    /// Yearly seasonal component (0 when disabled)
    pub yearly: f64,
}

/// Forecasting model driven by the runner
pub trait Forecaster: Send {
    /// Model name
    fn name(&self) -> &str;

    /// Fit on the whole training series
    fn fit(&mut self, series: &TrainingSeries) -> Result<()>;

    /// Distinct training timestamps in ascending order followed by
    /// `horizon_days` daily steps past the last one
    fn make_future_index(&self, horizon_days: usize) -> Result<Vec<NaiveDate>>;

    /// Predict every timestamp of `index`
    fn predict(&self, index: &[NaiveDate]) -> Result<Vec<ForecastRow>>;
}

/// Full output of one forecast run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    rows: Vec<ForecastRow>,
    model: String,
    history_len: usize,
}

impl ForecastResult {
    /// Assemble a result
    pub fn new(rows: Vec<ForecastRow>, model: impl Into<String>, history_len: usize) -> Self {
        ForecastResult {
            rows,
            model: model.into(),
            history_len,
        }
    }

    /// All rows, ascending by `ds`
    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Name of the model that produced the rows
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Number of rows covering the history
    pub fn history_len(&self) -> usize {
        self.history_len
    }

    /// Rows past the last training timestamp
    pub fn future_rows(&self) -> &[ForecastRow] {
        &self.rows[self.history_len.min(self.rows.len())..]
    }

    /// Last `n` rows
    pub fn tail(&self, n: usize) -> &[ForecastRow] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }

    /// `yhat` at the furthest-future row
    pub fn last_predicted(&self) -> Option<f64> {
        self.rows.last().map(|r| r.yhat)
    }
}

impl fmt::Display for ForecastResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<12} {:>14} {:>14} {:>14}",
            "ds", "yhat", "yhat_lower", "yhat_upper"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<12} {:>14.4} {:>14.4} {:>14.4}",
                row.ds.format("%Y-%m-%d"),
                row.yhat,
                row.yhat_lower,
                row.yhat_upper
            )?;
        }
        Ok(())
    }
}

/// Builds a new, unfitted model
pub type ModelFactory = Arc<dyn Fn() -> Box<dyn Forecaster> + Send + Sync>;

/// Runs one fit/extend/predict cycle per call on a fresh model
#[derive(Clone)]
pub struct ForecastRunner {
    factory: ModelFactory,
}

impl fmt::Debug for ForecastRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastRunner").finish_non_exhaustive()
    }
}

impl ForecastRunner {
    /// Runner over an arbitrary model factory
    pub fn new(factory: ModelFactory) -> Self {
        ForecastRunner { factory }
    }

    /// Runner over the additive model
    pub fn additive(params: AdditiveParams) -> Self {
        Self::new(Arc::new(move || {
            Box::new(AdditiveModel::new(params.clone())) as Box<dyn Forecaster>
        }))
    }

    /// Fit a fresh model on `series` and predict `horizon_days` past it
    ///
    /// Every failure is reported as [`Error::Forecast`] for the series' entity.
    pub fn run(&self, series: &TrainingSeries, horizon_days: usize) -> Result<ForecastResult> {
        let entity = series.name();
        let wrap = |err: Error| match err {
            Error::Forecast { .. } => err,
            other => Error::Forecast {
                entity: entity.to_string(),
                reason: other.to_string(),
            },
        };

        let mut model = (self.factory)();
        log::debug!(
            "fitting {} on {} points for {}",
            model.name(),
            series.len(),
            entity
        );
        model.fit(series).map_err(wrap)?;

        let index = model.make_future_index(horizon_days).map_err(wrap)?;
        let history_len = index.len().saturating_sub(horizon_days);
        let rows = model.predict(&index).map_err(wrap)?;

        log::info!(
            "forecast for {}: {} rows ({} history, {} ahead)",
            entity,
            rows.len(),
            history_len,
            horizon_days
        );
        Ok(ForecastResult::new(rows, model.name(), history_len))
    }
}

impl Default for ForecastRunner {
    fn default() -> Self {
        Self::additive(AdditiveParams::default())
    }
}
