//! Side-by-side forecast comparison for sales and market time series
//!
//! Two panels each pick an entity from a data source, forecast its series a
//! number of years ahead and show the result. When both forecasts succeed
//! they are compared by percentage change and the winner can be emailed.
//!
//! The stages are plain functions over immutable values:
//! [`DataSource`] → [`filter`](filter::filter) → [`reshape`](reshape::reshape)
//! → [`ForecastRunner`] → [`ComparisonEngine`], wired per panel by
//! [`pipeline`] and driven interactively by [`Session`].

pub mod compare;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod forecast;
pub mod io;
pub mod na;
pub mod notify;
pub mod pipeline;
pub mod reshape;
pub mod session;
pub mod source;
pub mod temporal;
pub mod vis;

// Re-export commonly used types
pub use compare::{ComparisonEngine, ComparisonVerdict, TieBreak};
pub use config::DashboardConfig;
pub use dataset::Dataset;
pub use error::{Error, Result};
pub use forecast::{ForecastResult, ForecastRunner, Forecaster};
pub use na::NA;
pub use notify::{LogNotifier, Notifier, SmtpNotifier};
pub use pipeline::{BranchOutcome, DashboardReport, DashboardRequest, PanelRequest};
pub use reshape::TrainingSeries;
pub use session::{Event, Session};
pub use source::DataSource;
pub use vis::{ChartSpec, Presenter, TerminalPresenter};

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
