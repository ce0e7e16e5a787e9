mod common;

use std::path::{Path, PathBuf};

use common::{create_test_csv, ScriptedMarket};
use forecast_dash::config::{SourceConfig, SourceKind};
use forecast_dash::dataset::names;
use forecast_dash::{DashboardConfig, DataSource};

fn shipped_configs() -> Vec<PathBuf> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut paths = vec![root.join("dashboard.toml")];
    let mut extra: Vec<PathBuf> = std::fs::read_dir(root.join("configs"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().map_or(false, |ext| ext == "toml"))
        .collect();
    extra.sort();
    paths.extend(extra);
    paths
}

/// Rows laid out with the headers of the published datasets
fn raw_fixture(source: &SourceConfig) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let row = |cells: &[&str]| cells.iter().map(|c| c.to_string()).collect::<Vec<_>>();
    match source.kind {
        SourceKind::UnitSales => (
            vec!["State", "Product", "Units Sold"],
            vec![
                row(&["Karnataka", "Phone A", "12"]),
                row(&["Tamil Nadu", "Phone B", "7"]),
                row(&["Kerala", "Phone A", "9"]),
            ],
        ),
        _ => {
            let date = |iso: &str, ymd: &str| {
                if source.date_format.is_some() {
                    ymd.to_string()
                } else {
                    iso.to_string()
                }
            };
            let d1 = date("2018-01-05", "05-01-2018");
            let d2 = date("2018-01-06", "06-01-2018");
            (
                vec!["Order Date", "Brand", "Sneaker Name", "Sale Price"],
                vec![
                    row(&[d1.as_str(), "Brand", "Runner One", "\"$1,097\""]),
                    row(&[d2.as_str(), "Brand", "Runner One", "\"$685\""]),
                    row(&[d2.as_str(), "Brand", "Runner Two", "\"$220\""]),
                ],
            )
        }
    }
}

#[test]
fn test_shipped_configs_parse_and_validate() {
    let paths = shipped_configs();
    assert!(paths.len() >= 3);
    for path in paths {
        let config = DashboardConfig::load_from_file(&path)
            .unwrap_or_else(|e| panic!("{}: {}", path.display(), e));
        config
            .validate()
            .unwrap_or_else(|e| panic!("{}: {}", path.display(), e));
    }
}

#[test]
fn test_shipped_configs_load_their_datasets() {
    for path in shipped_configs() {
        let config = DashboardConfig::load_from_file(&path).unwrap();
        for source in &config.sources {
            let (market, _) = ScriptedMarket::new();
            let data_source = DataSource::with_provider(Box::new(market));

            let dataset = if source.kind == SourceKind::Remote {
                let symbol = source.symbols[0].clone();
                data_source.load(source, Some(&symbol))
            } else {
                let (headers, rows) = raw_fixture(source);
                let file = create_test_csv(&source.name, &headers, &rows);
                let mut redirected = source.clone();
                redirected.path = Some(file.path().to_path_buf());
                data_source.load(&redirected, None)
            }
            .unwrap_or_else(|e| panic!("{} / {}: {}", path.display(), source.name, e));

            assert!(!dataset.is_empty(), "{} / {}", path.display(), source.name);
            assert!(dataset.has_column(names::ENTITY));
            assert!(dataset.has_column(names::VALUE));
        }
    }
}
