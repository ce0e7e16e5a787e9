//! One forecast branch end to end, and the dashboard-level report
//!
//! A branch runs filter → (synthesize dates) → reshape → forecast for one
//! panel. Any error stops that branch only and is kept as a [`BranchFailure`]
//! next to whatever was computed before it failed.

use chrono::NaiveDate;
use serde::Serialize;

use crate::compare::{ComparisonEngine, ComparisonVerdict};
use crate::config::{horizon_days, SourceConfig, SourceKind};
use crate::dataset::{names, Dataset};
use crate::error::{Error, Result};
use crate::filter::{filter, synthesize_timestamps, FilterCriterion};
use crate::forecast::{ForecastResult, ForecastRow, ForecastRunner};
use crate::na::NA;
use crate::notify::{NotificationRequest, Notifier};
use crate::reshape::{reshape, TrainingSeries};
use crate::vis::{components_chart, forecast_chart, ChartSpec, Trace};

/// Rows of the forecast table shown per branch
pub const FORECAST_TAIL_ROWS: usize = 5;
/// Rows of the filtered subset shown as diagnostics
pub const DIAGNOSTIC_HEAD_ROWS: usize = 5;

/// What one panel asks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelRequest {
    /// Source name
    pub source: String,
    /// Entity value, or symbol for remote sources
    pub entity: String,
    /// Years of prediction (1..=4)
    pub years: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl PanelRequest {
    /// Heading shown above the panel
    pub fn heading(&self) -> String {
        match &self.caption {
            Some(caption) => format!("Analysis for {} from {}", self.entity, caption),
            None => format!("Analysis for {}", self.entity),
        }
    }
}

/// Everything the dashboard is asked to show
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DashboardRequest {
    pub panels: Vec<PanelRequest>,
    pub recipient: Option<String>,
}

/// Size and first rows of a filtered subset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterDiagnostics {
    pub matched_rows: usize,
    pub columns: Vec<String>,
    pub head: Vec<Vec<String>>,
}

impl FilterDiagnostics {
    pub fn from_subset(subset: &Dataset) -> Self {
        FilterDiagnostics {
            matched_rows: subset.row_count(),
            columns: subset.column_names().iter().map(|c| c.to_string()).collect(),
            head: subset.head(DIAGNOSTIC_HEAD_ROWS).display_rows(),
        }
    }
}

/// A branch that produced a forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchReport {
    pub entity: String,
    pub heading: String,
    pub years: u32,
    pub diagnostics: FilterDiagnostics,
    pub raw_chart: ChartSpec,
    pub series: TrainingSeries,
    pub forecast: ForecastResult,
    pub forecast_chart: ChartSpec,
    pub components_chart: ChartSpec,
}

impl BranchReport {
    /// Value of the last training row
    pub fn last_actual(&self) -> f64 {
        self.series.last_value()
    }

    /// Last rows of the forecast table
    pub fn forecast_tail(&self) -> &[ForecastRow] {
        self.forecast.tail(FORECAST_TAIL_ROWS)
    }
}

/// A branch that stopped early
#[derive(Debug)]
pub struct BranchFailure {
    pub entity: String,
    pub heading: String,
    /// Present when filtering ran before the failure
    pub diagnostics: Option<FilterDiagnostics>,
    /// Present when the raw series could be charted before the failure
    pub raw_chart: Option<ChartSpec>,
    pub error: Error,
}

impl BranchFailure {
    /// Inline message shown in place of the forecast
    pub fn message(&self) -> String {
        match &self.error {
            Error::InsufficientData { .. } => {
                format!("Not enough data for {} to create a forecast.", self.entity)
            }
            other => format!("{}: {}", other.kind(), other),
        }
    }
}

/// Result of one branch
#[derive(Debug)]
pub enum BranchOutcome {
    Ready(Box<BranchReport>),
    Failed(BranchFailure),
}

impl BranchOutcome {
    /// Failure before any data was available
    pub fn failed(panel: &PanelRequest, error: Error) -> Self {
        BranchOutcome::Failed(BranchFailure {
            entity: panel.entity.clone(),
            heading: panel.heading(),
            diagnostics: None,
            raw_chart: None,
            error,
        })
    }

    pub fn entity(&self) -> &str {
        match self {
            BranchOutcome::Ready(report) => &report.entity,
            BranchOutcome::Failed(failure) => &failure.entity,
        }
    }

    pub fn heading(&self) -> &str {
        match self {
            BranchOutcome::Ready(report) => &report.heading,
            BranchOutcome::Failed(failure) => &failure.heading,
        }
    }

    pub fn report(&self) -> Option<&BranchReport> {
        match self {
            BranchOutcome::Ready(report) => Some(report),
            BranchOutcome::Failed(_) => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, BranchOutcome::Ready(_))
    }
}

/// Points of `column` that have both a timestamp and a value
fn dated_values(subset: &Dataset, column: &str) -> (Vec<NaiveDate>, Vec<f64>) {
    let (dates, values) = match (subset.dates(names::TIMESTAMP), subset.numbers(column)) {
        (Ok(d), Ok(v)) => (d, v),
        _ => return (Vec::new(), Vec::new()),
    };
    dates
        .iter()
        .zip(values)
        .filter_map(|pair| match pair {
            (NA::Value(d), NA::Value(v)) => Some((*d, *v)),
            _ => None,
        })
        .unzip()
}

/// Chart of the raw subset: open and close for market data, the value
/// column otherwise
pub fn raw_series_chart(kind: SourceKind, entity: &str, subset: &Dataset) -> ChartSpec {
    match kind {
        SourceKind::Remote => {
            let (x_open, open) = dated_values(subset, names::OPEN);
            let (x_close, close) = dated_values(subset, names::CLOSE);
            ChartSpec::new(format!("Time Series data for {} with Rangeslider", entity))
                .with_trace(Trace::new("stock_open", x_open, open))
                .with_trace(Trace::new("stock_close", x_close, close))
                .with_range_slider()
        }
        SourceKind::Csv | SourceKind::UnitSales => {
            let (x, y) = dated_values(subset, names::VALUE);
            ChartSpec::new(format!("Raw Data - {} Sales", entity))
                .with_trace(Trace::new(entity, x, y))
                .with_range_slider()
        }
    }
}

/// Run one panel against an already loaded dataset
pub fn run_branch(
    source: &SourceConfig,
    dataset: &Dataset,
    panel: &PanelRequest,
    runner: &ForecastRunner,
) -> BranchOutcome {
    let entity = panel.entity.as_str();
    let horizon = match horizon_days(panel.years) {
        Ok(h) => h,
        Err(e) => return BranchOutcome::failed(panel, e),
    };

    let subset = filter(dataset, &FilterCriterion::entity(entity));
    let diagnostics = FilterDiagnostics::from_subset(&subset);
    log::info!("{}: {} rows matched", entity, diagnostics.matched_rows);

    let fail = |error: Error, raw_chart: Option<ChartSpec>| {
        log::warn!("branch {} failed: {}", entity, error);
        BranchOutcome::Failed(BranchFailure {
            entity: entity.to_string(),
            heading: panel.heading(),
            diagnostics: Some(diagnostics.clone()),
            raw_chart,
            error,
        })
    };

    let subset = if source.kind == SourceKind::UnitSales {
        let dated = source
            .anchor()
            .and_then(|anchor| Ok((anchor, source.frequency()?)))
            .and_then(|(anchor, freq)| synthesize_timestamps(&subset, anchor, freq));
        match dated {
            Ok(dated) => dated,
            Err(e) => return fail(e, None),
        }
    } else {
        subset
    };

    let raw_chart = raw_series_chart(source.kind, entity, &subset);
    let series = match reshape(&subset, names::TIMESTAMP, names::VALUE, entity).into_series(entity) {
        Ok(series) => series,
        Err(e) => return fail(e, Some(raw_chart)),
    };
    let forecast = match runner.run(&series, horizon) {
        Ok(forecast) => forecast,
        Err(e) => return fail(e, Some(raw_chart)),
    };

    let forecast_chart = forecast_chart(
        format!("Forecast plot for {} for {} years", entity, panel.years),
        &series,
        &forecast,
    );
    let components_chart = components_chart(format!("Forecast components for {}", entity), &forecast);

    BranchOutcome::Ready(Box::new(BranchReport {
        entity: entity.to_string(),
        heading: panel.heading(),
        years: panel.years,
        diagnostics,
        raw_chart,
        series,
        forecast,
        forecast_chart,
        components_chart,
    }))
}

/// Compare the first two branches when both succeeded
pub fn compare_branches(
    engine: &ComparisonEngine,
    branches: &[BranchOutcome],
) -> Option<Result<ComparisonVerdict>> {
    match branches {
        [a, b] => {
            let (a, b) = (a.report()?, b.report()?);
            Some(engine.compare(
                &a.forecast,
                a.last_actual(),
                &a.entity,
                &b.forecast,
                b.last_actual(),
                &b.entity,
            ))
        }
        _ => None,
    }
}

/// Outcome of the notification step
#[derive(Debug)]
pub enum NotificationStatus {
    Sent { recipient: String, transport: String },
    Skipped(String),
    Failed(Error),
}

/// Send the verdict to `recipient` if both are available
pub fn notify_verdict(
    notifier: Option<&dyn Notifier>,
    recipient: Option<&str>,
    verdict: Option<&ComparisonVerdict>,
    kind: &str,
) -> Option<NotificationStatus> {
    let recipient = recipient.filter(|r| !r.trim().is_empty())?;
    let notifier = match notifier {
        Some(n) => n,
        None => return Some(NotificationStatus::Skipped("notifications are not configured".into())),
    };
    let verdict = match verdict {
        Some(v) => v,
        None => return Some(NotificationStatus::Skipped("no comparison available".into())),
    };

    let sent = NotificationRequest::from_verdict(recipient, verdict, kind)
        .and_then(|request| notifier.send(&request).map(|_| request));
    Some(match sent {
        Ok(request) => NotificationStatus::Sent {
            recipient: request.recipient,
            transport: notifier.name().to_string(),
        },
        Err(e) => {
            log::warn!("notification failed: {}", e);
            NotificationStatus::Failed(e)
        }
    })
}

/// Everything the presenter shows
#[derive(Debug)]
pub struct DashboardReport<'a> {
    pub title: &'a str,
    pub label_kind: &'a str,
    pub branches: &'a [BranchOutcome],
    pub comparison: Option<&'a Result<ComparisonVerdict>>,
    pub notification: Option<&'a NotificationStatus>,
}
