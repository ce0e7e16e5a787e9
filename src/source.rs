//! Dataset loading and column normalization

use chrono::Local;
use std::time::Duration;

use crate::config::{SourceConfig, SourceKind};
use crate::dataset::{names, ColumnData, Dataset};
use crate::error::{Error, Result};
use crate::io::{read_csv, MarketDataProvider, Quote, YahooFinance};
use crate::na::NA;
use crate::temporal::DateBounds;

/// Loads datasets described by [`SourceConfig`]s
///
/// Nothing is cached: every call reads or fetches again.
pub struct DataSource {
    market: Box<dyn MarketDataProvider>,
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource").finish_non_exhaustive()
    }
}

impl DataSource {
    /// Loader fetching market data from Yahoo Finance
    pub fn new(timeout: Duration) -> Self {
        Self::with_provider(Box::new(YahooFinance::new(timeout)))
    }

    /// Loader over any market data provider
    pub fn with_provider(market: Box<dyn MarketDataProvider>) -> Self {
        DataSource { market }
    }

    /// Load one source
    ///
    /// `symbol` selects the instrument for remote sources and is ignored
    /// otherwise. Every failure is reported as [`Error::DataLoad`] naming the
    /// source.
    pub fn load(&self, config: &SourceConfig, symbol: Option<&str>) -> Result<Dataset> {
        let label = match (config.kind, symbol) {
            (SourceKind::Remote, Some(symbol)) => format!("{}:{}", config.name, symbol),
            _ => config.name.clone(),
        };

        let loaded = match config.kind {
            SourceKind::Csv => load_dated_csv(config),
            SourceKind::UnitSales => load_unit_sales(config),
            SourceKind::Remote => self.load_remote(config, symbol),
        };

        match loaded {
            Ok(dataset) => {
                log::info!(
                    "loaded {} rows from {} ({:?})",
                    dataset.row_count(),
                    label,
                    config.kind
                );
                Ok(dataset)
            }
            Err(Error::DataLoad { reason, .. }) => Err(Error::data_load(label, reason)),
            Err(other) => Err(Error::data_load(label, other)),
        }
    }

    fn load_remote(&self, config: &SourceConfig, symbol: Option<&str>) -> Result<Dataset> {
        let symbol = symbol.ok_or_else(|| Error::data_load(&config.name, "no symbol selected"))?;
        if !config.allows_symbol(symbol) {
            return Err(Error::data_load(
                &config.name,
                format!(
                    "unsupported symbol '{}'; expected one of {:?}",
                    symbol, config.symbols
                ),
            ));
        }

        let start = config.market_start()?;
        let today = Local::now().date_naive();
        let quotes = self.market.fetch_daily(symbol, start, today)?;

        let dataset = quotes_to_dataset(symbol, &quotes, &config.value_field)?;
        Ok(apply_bounds(&dataset, &config.bounds()?))
    }
}

/// Columns every source of the given kind must name
fn required_columns(config: &SourceConfig) -> Vec<(&str, &'static str)> {
    let mut renames = Vec::new();
    if let Some(col) = config.entity_column.as_deref() {
        renames.push((col, names::ENTITY));
    }
    if config.kind == SourceKind::Csv {
        if let Some(col) = config.timestamp_column.as_deref() {
            renames.push((col, names::TIMESTAMP));
        }
    }
    if let Some(col) = config.value_column.as_deref() {
        renames.push((col, names::VALUE));
    }
    renames
}

fn read_and_rename(config: &SourceConfig) -> Result<Dataset> {
    let path = config
        .path
        .as_ref()
        .ok_or_else(|| Error::data_load(&config.name, "no path configured"))?;
    let mut dataset = read_csv(path)?;

    let renames = required_columns(config);
    for (source_column, _) in &renames {
        if !dataset.has_column(source_column) {
            return Err(Error::data_load(
                &config.name,
                format!("column '{}' not found in {}", source_column, path.display()),
            ));
        }
    }
    dataset.rename_columns(&renames);
    dataset.convert_column(names::VALUE, ColumnData::to_numbers)?;
    Ok(dataset)
}

fn load_dated_csv(config: &SourceConfig) -> Result<Dataset> {
    let mut dataset = read_and_rename(config)?;
    let format = config.date_format.as_deref();
    dataset.convert_column(names::TIMESTAMP, |col| col.to_dates(format))?;
    Ok(apply_bounds(&dataset, &config.bounds()?))
}

fn load_unit_sales(config: &SourceConfig) -> Result<Dataset> {
    read_and_rename(config)
}

/// Drop rows outside the inclusive bounds, and rows without a timestamp when
/// any bound is set
pub fn apply_bounds(dataset: &Dataset, bounds: &DateBounds) -> Dataset {
    if bounds.is_unbounded() {
        return dataset.clone();
    }
    match dataset.dates(names::TIMESTAMP) {
        Ok(dates) => dataset.filter_rows(|row| match &dates[row] {
            NA::Value(d) => bounds.contains(d),
            NA::NA => false,
        }),
        Err(_) => dataset.clone(),
    }
}

/// Flatten daily bars into named columns; `value` copies `value_field`
fn quotes_to_dataset(symbol: &str, quotes: &[Quote], value_field: &str) -> Result<Dataset> {
    let numbers = |f: fn(&Quote) -> f64| -> ColumnData {
        ColumnData::Number(quotes.iter().map(|q| NA::finite(f(q))).collect())
    };

    let mut dataset = Dataset::new();
    dataset.add_column(
        names::TIMESTAMP,
        ColumnData::Date(quotes.iter().map(|q| NA::Value(q.date)).collect()),
    )?;
    dataset.add_column(
        names::ENTITY,
        ColumnData::Text(vec![NA::Value(symbol.to_string()); quotes.len()]),
    )?;
    dataset.add_column(names::OPEN, numbers(|q| q.open))?;
    dataset.add_column(names::HIGH, numbers(|q| q.high))?;
    dataset.add_column(names::LOW, numbers(|q| q.low))?;
    dataset.add_column(names::CLOSE, numbers(|q| q.close))?;
    dataset.add_column(names::ADJ_CLOSE, numbers(|q| q.adj_close))?;
    dataset.add_column(names::VOLUME, numbers(|q| q.volume as f64))?;

    let value = dataset
        .column(value_field)
        .cloned()
        .ok_or_else(|| Error::ColumnNotFound(value_field.to_string()))?;
    dataset.add_column(names::VALUE, value)?;
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    struct StubMarket {
        calls: Arc<AtomicUsize>,
    }

    impl MarketDataProvider for StubMarket {
        fn fetch_daily(
            &self,
            _symbol: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<Quote>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((0..3)
                .map(|i| Quote {
                    date: start + chrono::Duration::days(i),
                    open: 10.0 + i as f64,
                    high: 12.0,
                    low: 9.0,
                    close: 11.0 + i as f64,
                    adj_close: 11.0,
                    volume: 100,
                })
                .collect())
        }
    }

    fn stub() -> (DataSource, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = DataSource::with_provider(Box::new(StubMarket {
            calls: Arc::clone(&calls),
        }));
        (source, calls)
    }

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn sneaker_config(path: &std::path::Path) -> SourceConfig {
        let mut config = SourceConfig::new("sneakers", SourceKind::Csv);
        config.path = Some(path.to_path_buf());
        config.entity_column = Some("Sneaker Name".into());
        config.timestamp_column = Some("Order Date".into());
        config.value_column = Some("Sale Price".into());
        config
    }

    #[test]
    fn test_load_csv_normalizes_columns() {
        let file = csv_file(
            "Order Date,Brand,Sneaker Name,Sale Price\n\
             9/1/17,Yeezy,Boost-350,\"$1,097\"\n\
             not a date,Yeezy,Boost-350,$685\n\
             9/3/17,Off-White,Air-Jordan,oops\n",
        );
        let dataset = stub().0.load(&sneaker_config(file.path()), None).unwrap();

        assert_eq!(dataset.row_count(), 3);
        assert_eq!(
            dataset.column_names(),
            vec!["timestamp", "Brand", "entity", "value"]
        );
        let dates = dataset.dates(names::TIMESTAMP).unwrap();
        assert_eq!(dates[0], NA::Value(NaiveDate::from_ymd_opt(2017, 9, 1).unwrap()));
        assert!(dates[1].is_na());
        let values = dataset.numbers(names::VALUE).unwrap();
        assert_eq!(values[0], NA::Value(1097.0));
        assert!(values[2].is_na());
    }

    #[test]
    fn test_load_csv_applies_bounds_and_format() {
        let file = csv_file(
            "Order Date,Sneaker Name,Sale Price\n\
             31-08-2017,A,1\n\
             01-09-2017,A,2\n\
             ,A,3\n\
             13-02-2019,B,4\n\
             14-02-2019,B,5\n",
        );
        let mut config = sneaker_config(file.path());
        config.date_format = Some("%d-%m-%Y".into());
        config.start = Some("2017-09-01".into());
        config.end = Some("2019-02-13".into());

        let dataset = stub().0.load(&config, None).unwrap();
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(
            dataset.numbers(names::VALUE).unwrap(),
            &[NA::Value(2.0), NA::Value(4.0)]
        );
    }

    #[test]
    fn test_load_csv_missing_column_is_data_load_error() {
        let file = csv_file("Date,Name,Price\n2018-01-01,A,1\n");
        let err = stub().0.load(&sneaker_config(file.path()), None).unwrap_err();
        match err {
            Error::DataLoad { source_name, reason } => {
                assert_eq!(source_name, "sneakers");
                assert!(reason.contains("Sneaker Name"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_file_is_data_load_error() {
        let config = sneaker_config(std::path::Path::new("/nonexistent/sales.csv"));
        assert!(matches!(
            stub().0.load(&config, None),
            Err(Error::DataLoad { .. })
        ));
    }

    #[test]
    fn test_load_unit_sales_has_no_timestamp() {
        let file = csv_file("State,Product,Units Sold\nKA,Phone A,10\nTN,Phone B,7\n");
        let mut config = SourceConfig::new("mobile", SourceKind::UnitSales);
        config.path = Some(file.path().to_path_buf());
        config.entity_column = Some("Product".into());
        config.value_column = Some("Units Sold".into());

        let dataset = stub().0.load(&config, None).unwrap();
        assert!(!dataset.has_column(names::TIMESTAMP));
        assert_eq!(dataset.unique_text(names::ENTITY).unwrap(), vec!["Phone A", "Phone B"]);
    }

    #[test]
    fn test_remote_rejects_unsupported_symbol_without_fetch() {
        let (source, calls) = stub();
        let config = SourceConfig::new("stocks", SourceKind::Remote);
        let err = source.load(&config, Some("TSLA")).unwrap_err();
        match err {
            Error::DataLoad { source_name, reason } => {
                assert_eq!(source_name, "stocks:TSLA");
                assert!(reason.contains("unsupported symbol"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_remote_flattens_quotes() {
        let (source, calls) = stub();
        let config = SourceConfig::new("stocks", SourceKind::Remote);
        let dataset = source.load(&config, Some("AAPL")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(dataset.row_count(), 3);
        assert!(dataset.has_column(names::OPEN));
        assert_eq!(
            dataset.numbers(names::VALUE).unwrap(),
            dataset.numbers(names::CLOSE).unwrap()
        );
        assert_eq!(dataset.unique_text(names::ENTITY).unwrap(), vec!["AAPL"]);
    }
}
