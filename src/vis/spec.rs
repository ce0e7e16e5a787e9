use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::forecast::ForecastResult;
use crate::reshape::TrainingSeries;

/// One named line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: String,
    pub x: Vec<NaiveDate>,
    pub y: Vec<f64>,
}

impl Trace {
    pub fn new(name: impl Into<String>, x: Vec<NaiveDate>, y: Vec<f64>) -> Self {
        Trace {
            name: name.into(),
            x,
            y,
        }
    }
}

/// Shaded uncertainty region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Band {
    pub x: Vec<NaiveDate>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Renderer-independent chart description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub traces: Vec<Trace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<Band>,
    /// Show an x-axis range selector
    pub range_slider: bool,
}

impl ChartSpec {
    pub fn new(title: impl Into<String>) -> Self {
        ChartSpec {
            title: title.into(),
            traces: Vec::new(),
            band: None,
            range_slider: false,
        }
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.traces.push(trace);
        self
    }

    pub fn with_band(mut self, band: Band) -> Self {
        self.band = Some(band);
        self
    }

    pub fn with_range_slider(mut self) -> Self {
        self.range_slider = true;
        self
    }

    /// First and last x value over all traces and the band
    pub fn x_extent(&self) -> Option<(NaiveDate, NaiveDate)> {
        let xs = self
            .traces
            .iter()
            .flat_map(|t| t.x.iter())
            .chain(self.band.iter().flat_map(|b| b.x.iter()));
        xs.fold(None, |acc, &d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Observed points plus the forecast line and its interval
pub fn forecast_chart(title: impl Into<String>, series: &TrainingSeries, result: &ForecastResult) -> ChartSpec {
    let rows = result.rows();
    let x: Vec<NaiveDate> = rows.iter().map(|r| r.ds).collect();
    ChartSpec::new(title)
        .with_trace(Trace::new("actual", series.timestamps(), series.values()))
        .with_trace(Trace::new(
            "yhat",
            x.clone(),
            rows.iter().map(|r| r.yhat).collect(),
        ))
        .with_band(Band {
            x,
            lower: rows.iter().map(|r| r.yhat_lower).collect(),
            upper: rows.iter().map(|r| r.yhat_upper).collect(),
        })
        .with_range_slider()
}

/// Trend and seasonal components over the whole index
///
/// Components that are identically zero (disabled seasonality) are omitted.
pub fn components_chart(title: impl Into<String>, result: &ForecastResult) -> ChartSpec {
    let rows = result.rows();
    let x: Vec<NaiveDate> = rows.iter().map(|r| r.ds).collect();
    let mut chart = ChartSpec::new(title).with_trace(Trace::new(
        "trend",
        x.clone(),
        rows.iter().map(|r| r.trend).collect(),
    ));

    let weekly: Vec<f64> = rows.iter().map(|r| r.weekly).collect();
    if weekly.iter().any(|v| *v != 0.0) {
        chart = chart.with_trace(Trace::new("weekly", x.clone(), weekly));
    }
    let yearly: Vec<f64> = rows.iter().map(|r| r.yearly).collect();
    if yearly.iter().any(|v| *v != 0.0) {
        chart = chart.with_trace(Trace::new("yearly", x, yearly));
    }
    chart
}
