use std::io::Write;

use chrono::NaiveDate;

use super::ascii::{Chart, ChartConfig, ChartStyle, LinePlot, LinePlotConfig, MultiSparkline};
use super::{ChartSpec, Presenter};
use crate::error::Result;
use crate::forecast::ForecastRow;
use crate::pipeline::{BranchOutcome, DashboardReport, FilterDiagnostics, NotificationStatus};

/// Renders dashboards as text charts on any writer
pub struct TerminalPresenter<W: Write> {
    out: W,
    width: usize,
    height: usize,
    style: ChartStyle,
}

impl TerminalPresenter<std::io::Stdout> {
    /// Presenter writing to stdout
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        TerminalPresenter {
            out,
            width: 72,
            height: 12,
            style: ChartStyle::Unicode,
        }
    }

    /// Chart area size in characters
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_style(mut self, style: ChartStyle) -> Self {
        self.style = style;
        self
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Line plot of a chart spec; the band is drawn under the traces
    ///
    /// Points are placed by date, so a trace covering part of the range only
    /// occupies its share of the columns.
    pub fn render_chart(&self, spec: &ChartSpec) -> String {
        let origin = spec.x_extent().map(|(first, _)| first);
        let offsets = |dates: &[NaiveDate]| -> Vec<f64> {
            match origin {
                Some(origin) => dates.iter().map(|d| (*d - origin).num_days() as f64).collect(),
                None => Vec::new(),
            }
        };
        let config = LinePlotConfig {
            base: ChartConfig {
                width: self.width,
                height: self.height,
                show_labels: true,
                title: Some(spec.title.clone()),
            },
            style: self.style,
            x_labels: spec.x_extent().map(|(first, last)| {
                (
                    first.format("%Y-%m-%d").to_string(),
                    last.format("%Y-%m-%d").to_string(),
                )
            }),
        };

        let mut plot = LinePlot::new(config);
        if let Some(band) = &spec.band {
            let marker = self.style.marker(2);
            let xs = offsets(&band.x);
            plot.add_series_at("lower", &xs, &band.lower, marker)
                .add_series_at("upper", &xs, &band.upper, marker);
        }
        for (i, trace) in spec.traces.iter().enumerate() {
            plot.add_series_at(&trace.name, &offsets(&trace.x), &trace.y, self.style.marker(i));
        }
        plot.render()
    }

    /// Components as aligned sparklines
    pub fn render_components(&self, spec: &ChartSpec) -> String {
        let mut multi = MultiSparkline::new();
        for trace in &spec.traces {
            multi.add_series(&trace.name, &trace.y, self.width);
        }
        format!("{}\n{}", spec.title, multi.render())
    }

    fn write_diagnostics(&mut self, entity: &str, diagnostics: &FilterDiagnostics) -> Result<()> {
        writeln!(self.out, "Filtered data for {}:", entity)?;
        writeln!(self.out, "  {}", diagnostics.columns.join(" | "))?;
        for row in &diagnostics.head {
            writeln!(self.out, "  {}", row.join(" | "))?;
        }
        writeln!(self.out, "Number of rows: {}", diagnostics.matched_rows)?;
        Ok(())
    }

    fn write_tail(&mut self, entity: &str, rows: &[ForecastRow]) -> Result<()> {
        writeln!(self.out, "Forecast data for {}", entity)?;
        writeln!(
            self.out,
            "  {:<12} {:>12} {:>12} {:>12} {:>12}",
            "ds", "yhat", "yhat_lower", "yhat_upper", "trend"
        )?;
        for row in rows {
            writeln!(
                self.out,
                "  {:<12} {:>12.2} {:>12.2} {:>12.2} {:>12.2}",
                row.ds.format("%Y-%m-%d"),
                row.yhat,
                row.yhat_lower,
                row.yhat_upper,
                row.trend
            )?;
        }
        Ok(())
    }

    fn write_branch(&mut self, branch: &BranchOutcome) -> Result<()> {
        writeln!(self.out, "== {} ==", branch.heading())?;
        match branch {
            BranchOutcome::Ready(report) => {
                self.write_diagnostics(&report.entity, &report.diagnostics)?;
                let raw = self.render_chart(&report.raw_chart);
                writeln!(self.out, "{}", raw)?;
                self.write_tail(&report.entity, report.forecast_tail())?;
                let forecast = self.render_chart(&report.forecast_chart);
                writeln!(self.out, "\n{}", forecast)?;
                let components = self.render_components(&report.components_chart);
                writeln!(self.out, "{}", components)?;
            }
            BranchOutcome::Failed(failure) => {
                if let Some(diagnostics) = &failure.diagnostics {
                    self.write_diagnostics(&failure.entity, diagnostics)?;
                }
                if let Some(raw_chart) = &failure.raw_chart {
                    let raw = self.render_chart(raw_chart);
                    writeln!(self.out, "{}", raw)?;
                }
                writeln!(self.out, "Error: {}", failure.message())?;
            }
        }
        writeln!(self.out)?;
        Ok(())
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn present(&mut self, report: &DashboardReport<'_>) -> Result<()> {
        writeln!(self.out, "{}", report.title)?;
        writeln!(self.out, "{}\n", "=".repeat(report.title.chars().count()))?;

        for branch in report.branches {
            self.write_branch(branch)?;
        }

        match report.comparison {
            Some(Ok(verdict)) => writeln!(self.out, "{}", verdict.message(report.label_kind))?,
            Some(Err(e)) => writeln!(self.out, "Comparison unavailable: {}", e)?,
            None => {}
        }
        match report.notification {
            Some(NotificationStatus::Sent { recipient, transport }) => {
                writeln!(self.out, "Notification sent to {} ({})", recipient, transport)?
            }
            Some(NotificationStatus::Skipped(reason)) => {
                writeln!(self.out, "Notification skipped: {}", reason)?
            }
            Some(NotificationStatus::Failed(e)) => {
                writeln!(self.out, "Failed to send notification: {}", e)?
            }
            None => {}
        }
        self.out.flush()?;
        Ok(())
    }
}
