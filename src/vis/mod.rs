//! Chart descriptions and their terminal rendering
//!
//! [`ChartSpec`] is a renderer-independent description of a chart (traces,
//! an optional uncertainty band, an x-axis range selector). A [`Presenter`]
//! turns a whole [`DashboardReport`](crate::pipeline::DashboardReport) into
//! output; [`TerminalPresenter`] draws it with the text charts in [`ascii`].

pub mod ascii;
mod spec;
mod terminal;

use crate::error::Result;
use crate::pipeline::DashboardReport;

pub use self::spec::{components_chart, forecast_chart, Band, ChartSpec, Trace};
pub use self::terminal::TerminalPresenter;

/// Sink for a computed dashboard
pub trait Presenter {
    fn present(&mut self, report: &DashboardReport<'_>) -> Result<()>;
}
