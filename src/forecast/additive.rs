//! Additive trend + seasonality model
//!
//! `y(t) = trend(t) + yearly(t) + weekly(t)`, where the trend is piecewise
//! linear with changepoints spread over the early part of the history and
//! each seasonality is a truncated Fourier series. All coefficients are
//! fitted jointly by ridge-penalised least squares on scaled data.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::linalg::solve;
use super::{ForecastRow, Forecaster};
use crate::error::{Error, Result};
use crate::reshape::TrainingSeries;

const YEARLY_PERIOD: f64 = 365.25;
const YEARLY_ORDER: usize = 10;
const YEARLY_MIN_SPAN_DAYS: i64 = 730;

const WEEKLY_PERIOD: f64 = 7.0;
const WEEKLY_ORDER: usize = 3;
const WEEKLY_MIN_SPAN_DAYS: i64 = 14;

/// Assumed noise level of the scaled target; converts prior scales into
/// ridge penalties
const NOISE_SCALE: f64 = 0.05;

/// Penalty on the base intercept and slope; keeps the system non-singular
const BASE_PENALTY: f64 = 1e-6;

/// Whether a seasonal component is fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seasonality {
    /// On when the history is long enough
    #[default]
    Auto,
    Enabled,
    Disabled,
}

impl Seasonality {
    fn resolve(self, span_days: i64, min_span_days: i64) -> bool {
        match self {
            Seasonality::Auto => span_days >= min_span_days,
            Seasonality::Enabled => true,
            Seasonality::Disabled => false,
        }
    }
}

/// Model hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdditiveParams {
    /// Maximum number of potential trend changepoints
    pub n_changepoints: usize,
    /// Share of the history in which changepoints are placed
    pub changepoint_range: f64,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    pub yearly_seasonality: Seasonality,
    pub weekly_seasonality: Seasonality,
    /// Coverage of the uncertainty interval
    pub interval_width: f64,
}

impl Default for AdditiveParams {
    fn default() -> Self {
        AdditiveParams {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            yearly_seasonality: Seasonality::Auto,
            weekly_seasonality: Seasonality::Auto,
            interval_width: 0.8,
        }
    }
}

impl AdditiveParams {
    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(Error::Config(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        if !(self.changepoint_prior_scale > 0.0 && self.seasonality_prior_scale > 0.0) {
            return Err(Error::Config("prior scales must be positive".into()));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(Error::Config(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        Ok(())
    }
}

/// State learned by `fit`
#[derive(Debug, Clone)]
struct Fitted {
    start: NaiveDate,
    span_days: f64,
    y_scale: f64,
    /// Distinct training timestamps, ascending
    history: Vec<NaiveDate>,
    /// Changepoint locations in scaled time
    changepoints: Vec<f64>,
    yearly: bool,
    weekly: bool,
    beta: Vec<f64>,
    /// Residual standard deviation on the scaled target
    sigma: f64,
    /// Mean absolute changepoint rate
    delta_rate: f64,
}

impl Fitted {
    fn scaled_time(&self, ds: NaiveDate) -> f64 {
        (ds - self.start).num_days() as f64 / self.span_days
    }

    fn n_features(&self) -> usize {
        2 + self.changepoints.len()
            + if self.yearly { 2 * YEARLY_ORDER } else { 0 }
            + if self.weekly { 2 * WEEKLY_ORDER } else { 0 }
    }

    /// Design row: intercept, slope, changepoint hinges, yearly terms, weekly terms
    fn features(&self, ds: NaiveDate) -> Vec<f64> {
        let t = self.scaled_time(ds);
        let mut row = Vec::with_capacity(self.n_features());
        row.push(1.0);
        row.push(t);
        row.extend(self.changepoints.iter().map(|s| (t - s).max(0.0)));
        if self.yearly {
            fourier_terms(ds, YEARLY_PERIOD, YEARLY_ORDER, &mut row);
        }
        if self.weekly {
            fourier_terms(ds, WEEKLY_PERIOD, WEEKLY_ORDER, &mut row);
        }
        row
    }

    /// (trend, yearly, weekly) on the scaled target
    fn components(&self, x: &[f64]) -> (f64, f64, f64) {
        let n_trend = 2 + self.changepoints.len();
        let dot = |range: std::ops::Range<usize>| -> f64 {
            range.map(|i| self.beta[i] * x[i]).sum()
        };

        let trend = dot(0..n_trend);
        let mut offset = n_trend;
        let yearly = if self.yearly {
            let v = dot(offset..offset + 2 * YEARLY_ORDER);
            offset += 2 * YEARLY_ORDER;
            v
        } else {
            0.0
        };
        let weekly = if self.weekly {
            dot(offset..offset + 2 * WEEKLY_ORDER)
        } else {
            0.0
        };
        (trend, yearly, weekly)
    }
}

fn fourier_terms(ds: NaiveDate, period: f64, order: usize, out: &mut Vec<f64>) {
    let days = ds.signed_duration_since(NaiveDate::default()).num_days() as f64;
    for k in 1..=order {
        let x = 2.0 * PI * k as f64 * days / period;
        out.push(x.sin());
        out.push(x.cos());
    }
}

/// Changepoint dates: `n` points evenly spaced over the first
/// `range` share of the history, excluding the first timestamp
fn changepoint_dates(history: &[NaiveDate], n_max: usize, range: f64) -> Vec<NaiveDate> {
    let hist_size = (history.len() as f64 * range).floor() as usize;
    let n = n_max.min(hist_size.saturating_sub(1));
    if n == 0 {
        return Vec::new();
    }

    let last = (hist_size - 1) as f64;
    let mut dates: Vec<NaiveDate> = (1..=n)
        .map(|i| history[(i as f64 * last / n as f64).round() as usize])
        .collect();
    dates.dedup();
    dates
}

/// z-score for a two-sided interval of the given coverage
fn get_z_score(interval_width: f64) -> f64 {
    normal_quantile(0.5 + interval_width / 2.0)
}

/// Standard normal quantile by Acklam's rational approximation; `p` must be
/// in (0, 1)
fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e1,
        2.209460984245205e2,
        -2.759285104469687e2,
        1.383577518672690e2,
        -3.066479806614716e1,
        2.506628277459239e0,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e1,
        1.615858368580409e2,
        -1.556989798598866e2,
        6.680131188771972e1,
        -1.328068155288572e1,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-3,
        -3.223964580411365e-1,
        -2.400758277161838e0,
        -2.549732539343734e0,
        4.374664141464968e0,
        2.938163982698783e0,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-3,
        3.224671290700398e-1,
        2.445134137142996e0,
        3.754408661907416e0,
    ];
    const P_LOW: f64 = 0.02425;

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

/// Piecewise-linear trend plus Fourier seasonality
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    params: AdditiveParams,
    fitted: Option<Fitted>,
}

impl AdditiveModel {
    /// Unfitted model
    pub fn new(params: AdditiveParams) -> Self {
        AdditiveModel {
            params,
            fitted: None,
        }
    }

    /// Hyperparameters
    pub fn params(&self) -> &AdditiveParams {
        &self.params
    }

    /// Whether `fit` has succeeded
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn fitted(&self) -> Result<&Fitted> {
        self.fitted
            .as_ref()
            .ok_or_else(|| Error::Model("model has not been fitted".into()))
    }
}

impl Default for AdditiveModel {
    fn default() -> Self {
        Self::new(AdditiveParams::default())
    }
}

impl Forecaster for AdditiveModel {
    fn name(&self) -> &str {
        "additive"
    }

    fn fit(&mut self, series: &TrainingSeries) -> Result<()> {
        self.params.validate()?;
        self.fitted = None;

        let mut points = series.points().to_vec();
        if points.len() < 2 {
            return Err(Error::Model(format!(
                "need at least 2 observations, got {}",
                points.len()
            )));
        }
        if points.iter().any(|p| !p.y.is_finite()) {
            return Err(Error::Model("observations must be finite".into()));
        }
        points.sort_by_key(|p| p.ds);

        let start = points[0].ds;
        let end = points[points.len() - 1].ds;
        let span_days = (end - start).num_days();
        if span_days == 0 {
            return Err(Error::Model(
                "time span is zero; need at least two distinct timestamps".into(),
            ));
        }

        let max_abs = points.iter().map(|p| p.y.abs()).fold(0.0, f64::max);
        let y_scale = if max_abs > 0.0 { max_abs } else { 1.0 };

        let mut history: Vec<NaiveDate> = points.iter().map(|p| p.ds).collect();
        history.dedup();

        let mut state = Fitted {
            start,
            span_days: span_days as f64,
            y_scale,
            changepoints: Vec::new(),
            yearly: self
                .params
                .yearly_seasonality
                .resolve(span_days, YEARLY_MIN_SPAN_DAYS),
            weekly: self
                .params
                .weekly_seasonality
                .resolve(span_days, WEEKLY_MIN_SPAN_DAYS),
            beta: Vec::new(),
            sigma: 0.0,
            delta_rate: 0.0,
            history: Vec::new(),
        };
        let changepoints: Vec<f64> = changepoint_dates(
            &history,
            self.params.n_changepoints,
            self.params.changepoint_range,
        )
        .into_iter()
        .map(|d| state.scaled_time(d))
        .filter(|&t| t > 0.0)
        .collect();
        state.changepoints = changepoints;
        state.history = history;

        // Penalised normal equations
        let p = state.n_features();
        let mut ata = vec![vec![0.0; p]; p];
        let mut aty = vec![0.0; p];
        let mut design = Vec::with_capacity(points.len());
        for point in &points {
            let x = state.features(point.ds);
            let y = point.y / y_scale;
            for i in 0..p {
                aty[i] += x[i] * y;
                for j in i..p {
                    ata[i][j] += x[i] * x[j];
                }
            }
            design.push((x, y));
        }
        for i in 0..p {
            for j in 0..i {
                ata[i][j] = ata[j][i];
            }
        }

        let n_cp = state.changepoints.len();
        let cp_penalty = (NOISE_SCALE / self.params.changepoint_prior_scale).powi(2);
        let season_penalty = (NOISE_SCALE / self.params.seasonality_prior_scale).powi(2);
        for (i, row) in ata.iter_mut().enumerate() {
            row[i] += match i {
                0 | 1 => BASE_PENALTY,
                i if i < 2 + n_cp => cp_penalty,
                _ => season_penalty,
            };
        }

        let beta = solve(&ata, &aty)?;
        if beta.iter().any(|b| !b.is_finite()) {
            return Err(Error::ComputationError(
                "fit produced non-finite coefficients".into(),
            ));
        }
        state.beta = beta;

        let sse: f64 = design
            .iter()
            .map(|(x, y)| {
                let (trend, yearly, weekly) = state.components(x);
                (y - trend - yearly - weekly).powi(2)
            })
            .sum();
        state.sigma = (sse / points.len() as f64).sqrt();
        state.delta_rate = if n_cp > 0 {
            state.beta[2..2 + n_cp].iter().map(|d| d.abs()).sum::<f64>() / n_cp as f64
        } else {
            0.0
        };

        log::debug!(
            "additive fit: {} rows, {} changepoints, yearly={}, weekly={}, sigma={:.4}",
            points.len(),
            n_cp,
            state.yearly,
            state.weekly,
            state.sigma * y_scale
        );
        self.fitted = Some(state);
        Ok(())
    }

    fn make_future_index(&self, horizon_days: usize) -> Result<Vec<NaiveDate>> {
        let fitted = self.fitted()?;
        let last = *fitted
            .history
            .last()
            .ok_or_else(|| Error::Model("empty history".into()))?;

        let mut index = Vec::with_capacity(fitted.history.len() + horizon_days);
        index.extend_from_slice(&fitted.history);
        for step in 1..=horizon_days {
            let ds = last
                .checked_add_signed(Duration::days(step as i64))
                .ok_or_else(|| Error::Model(format!("horizon overflows the calendar at step {}", step)))?;
            index.push(ds);
        }
        Ok(index)
    }

    fn predict(&self, index: &[NaiveDate]) -> Result<Vec<ForecastRow>> {
        let fitted = self.fitted()?;
        let z = get_z_score(self.params.interval_width);
        let scale = fitted.y_scale;

        index
            .iter()
            .map(|&ds| {
                let x = fitted.features(ds);
                let (trend, yearly, weekly) = fitted.components(&x);
                let yhat = (trend + yearly + weekly) * scale;
                if !yhat.is_finite() {
                    return Err(Error::ComputationError(format!(
                        "non-finite prediction at {}",
                        ds
                    )));
                }
                let drift = fitted.delta_rate * (x[1] - 1.0).max(0.0);
                let half_width = z * (fitted.sigma.powi(2) + drift.powi(2)).sqrt() * scale;
                Ok(ForecastRow {
                    ds,
                    yhat,
                    yhat_lower: yhat - half_width,
                    yhat_upper: yhat + half_width,
                    trend: trend * scale,
                    weekly: weekly * scale,
                    yearly: yearly * scale,
                })
            })
            .collect()
    }
}
