//! Dataset and provider fixtures

use chrono::{Duration, NaiveDate};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

use forecast_dash::config::{ComparisonConfig, PanelConfig, SourceConfig, SourceKind};
use forecast_dash::io::{MarketDataProvider, Quote};
use forecast_dash::{DashboardConfig, Result};

use super::test_utils::create_test_csv;

/// `days` consecutive daily rows for `entity` starting 2020-01-01
///
/// Values follow `base + slope * day`.
pub fn daily_rows(entity: &str, days: i64, base: f64, slope: f64) -> Vec<Vec<String>> {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date");
    (0..days)
        .map(|i| {
            vec![
                (start + Duration::days(i)).format("%Y-%m-%d").to_string(),
                entity.to_string(),
                format!("{:.2}", base + slope * i as f64),
            ]
        })
        .collect()
}

/// Sales CSV with `date,product,revenue` columns
pub fn sales_csv(test_name: &str, rows: &[Vec<String>]) -> NamedTempFile {
    create_test_csv(test_name, &["date", "product", "revenue"], rows)
}

/// Two-panel configuration over one sales CSV
pub fn sales_config(path: &Path, entities: [&str; 2], years: [u32; 2]) -> DashboardConfig {
    let mut source = SourceConfig::new("sales", SourceKind::Csv);
    source.path = Some(path.to_path_buf());
    source.entity_column = Some("product".into());
    source.timestamp_column = Some("date".into());
    source.value_column = Some("revenue".into());

    let panel = |entity: &str, years: u32| PanelConfig {
        source: "sales".into(),
        entity: Some(entity.into()),
        years,
        caption: None,
    };

    DashboardConfig {
        title: "Sales Forecast Comparison".into(),
        sources: vec![source],
        panels: vec![panel(entities[0], years[0]), panel(entities[1], years[1])],
        forecast: Default::default(),
        comparison: ComparisonConfig {
            label_kind: "item".into(),
            ..Default::default()
        },
        notification: None,
        network_timeout_secs: 30,
    }
}

/// Market provider returning a linear close series per symbol
///
/// Counts fetches so tests can check that rejected symbols never reach it.
pub struct ScriptedMarket {
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedMarket {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            ScriptedMarket {
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl MarketDataProvider for ScriptedMarket {
    fn fetch_daily(&self, symbol: &str, start: NaiveDate, _end: NaiveDate) -> Result<Vec<Quote>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let slope = symbol.len() as f64;
        Ok((0..60)
            .map(|i| {
                let close = 50.0 + slope * i as f64;
                Quote {
                    date: start + Duration::days(i),
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    adj_close: close,
                    volume: 10_000,
                }
            })
            .collect())
    }
}
