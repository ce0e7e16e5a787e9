mod common;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{daily_rows, sales_config, sales_csv, ScriptedMarket};
use forecast_dash::config::{SourceConfig, SourceKind};
use forecast_dash::forecast::{AdditiveModel, Forecaster, ModelFactory};
use forecast_dash::pipeline::{run_branch, PanelRequest};
use forecast_dash::vis::TerminalPresenter;
use forecast_dash::{
    BranchOutcome, DataSource, Error, Event, ForecastRunner, LogNotifier, Presenter, Session,
};

fn offline_source() -> DataSource {
    DataSource::with_provider(Box::new(ScriptedMarket::new().0))
}

fn ready_len(outcome: &BranchOutcome) -> usize {
    outcome
        .report()
        .unwrap_or_else(|| panic!("branch {} failed", outcome.entity()))
        .forecast
        .len()
}

#[test]
fn test_two_entities_forecast_over_their_horizons() {
    let mut rows = daily_rows("X", 30, 100.0, 1.0);
    rows.extend(daily_rows("Y", 30, 80.0, 2.0));
    let file = sales_csv("two_entities", &rows);

    let mut session = Session::new(sales_config(file.path(), ["X", "Y"], [1, 2]), offline_source(), None).unwrap();
    session.refresh();

    let branches = session.branches();
    assert_eq!(ready_len(&branches[0]), 395);
    assert_eq!(ready_len(&branches[1]), 760);
    for branch in branches {
        let rows = branch.report().unwrap().forecast.rows();
        assert!(rows.windows(2).all(|w| w[0].ds < w[1].ds));
    }

    let verdict = session.comparison().unwrap().as_ref().unwrap();
    assert_eq!(verdict.label_a, "X");
    assert_eq!(verdict.label_b, "Y");
    assert!(verdict.winner == "X" || verdict.winner == "Y");
}

#[test]
fn test_single_point_entity_never_reaches_the_model() {
    let mut rows = daily_rows("X", 30, 100.0, 1.0);
    rows.extend(daily_rows("Z", 1, 5.0, 0.0));
    let file = sales_csv("single_point", &rows);
    let config = sales_config(file.path(), ["X", "Z"], [1, 1]);
    let dataset = offline_source().load(&config.sources[0], None).unwrap();

    let fits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fits);
    let factory: ModelFactory = Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Box::new(AdditiveModel::default()) as Box<dyn Forecaster>
    });
    let runner = ForecastRunner::new(factory);

    let panel = PanelRequest {
        source: "sales".into(),
        entity: "Z".into(),
        years: 1,
        caption: None,
    };
    match run_branch(&config.sources[0], &dataset, &panel, &runner) {
        BranchOutcome::Failed(failure) => {
            assert!(matches!(
                failure.error,
                Error::InsufficientData { valid_rows: 1, .. }
            ));
            assert_eq!(failure.message(), "Not enough data for Z to create a forecast.");
            assert_eq!(failure.diagnostics.unwrap().matched_rows, 1);
        }
        BranchOutcome::Ready(_) => panic!("Z should not be forecast"),
    }
    assert_eq!(fits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_zero_last_actual_is_an_invalid_comparison() {
    let mut rows = daily_rows("X", 30, 100.0, 1.0);
    let mut zero = daily_rows("Y", 30, 29.0, -1.0);
    assert_eq!(zero[29][2], "0.00");
    rows.append(&mut zero);
    let file = sales_csv("zero_last", &rows);

    let mut session = Session::new(sales_config(file.path(), ["X", "Y"], [1, 1]), offline_source(), None).unwrap();
    session.refresh();

    assert!(session.branches().iter().all(|b| b.is_ready()));
    match session.comparison() {
        Some(Err(Error::InvalidComparison(message))) => assert!(message.starts_with("Y: ")),
        other => panic!("expected an invalid comparison, got {:?}", other),
    }
}

#[test]
fn test_unsupported_symbol_fails_only_its_panel() {
    let (market, calls) = ScriptedMarket::new();
    let mut config = sales_config(Path::new("unused.csv"), ["GOOG", "TSLA"], [1, 1]);
    config.sources = vec![SourceConfig::new("stocks", SourceKind::Remote)];
    for panel in &mut config.panels {
        panel.source = "stocks".into();
    }
    config.comparison.label_kind = "stock".into();

    let mut session = Session::new(config, DataSource::with_provider(Box::new(market)), None).unwrap();
    session.refresh();

    assert_eq!(ready_len(&session.branches()[0]), 60 + 365);
    match &session.branches()[1] {
        BranchOutcome::Failed(failure) => {
            assert!(matches!(failure.error, Error::DataLoad { .. }));
            assert!(failure.message().starts_with("DataLoadError: "));
        }
        BranchOutcome::Ready(_) => panic!("TSLA is not an offered symbol"),
    }
    assert!(session.comparison().is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let raw = &session.branches()[0].report().unwrap().raw_chart;
    assert_eq!(raw.title, "Time Series data for GOOG with Rangeslider");
    let names: Vec<&str> = raw.traces.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["stock_open", "stock_close"]);
}

#[test]
fn test_recipient_notified_once_per_verdict() {
    let mut rows = daily_rows("X", 30, 100.0, 1.0);
    rows.extend(daily_rows("Y", 30, 80.0, 2.0));
    let file = sales_csv("notify", &rows);

    let mut session = Session::new(
        sales_config(file.path(), ["X", "Y"], [1, 1]),
        offline_source(),
        Some(Box::new(LogNotifier::default())),
    )
    .unwrap();
    session.refresh();
    assert!(session.notification().is_none());

    let recomputed = session
        .apply(Event::SetRecipient(Some("owner@example.com".into())))
        .unwrap();
    assert!(recomputed.branches.is_empty());
    assert!(!recomputed.comparison);
    assert!(session.notification().is_some());

    session.apply(Event::SetRecipient(Some("not-an-address".into()))).unwrap();
    assert!(matches!(
        session.notification(),
        Some(forecast_dash::pipeline::NotificationStatus::Failed(Error::Notification(_)))
    ));
}

#[test]
fn test_terminal_rendering_of_a_session() {
    let mut rows = daily_rows("X", 30, 100.0, 1.0);
    rows.extend(daily_rows("Y", 30, 80.0, 2.0));
    let file = sales_csv("render", &rows);

    let mut session = Session::new(sales_config(file.path(), ["X", "Y"], [1, 1]), offline_source(), None).unwrap();
    session.refresh();

    let mut presenter = TerminalPresenter::new(Vec::new()).with_size(50, 8);
    presenter.present(&session.report()).unwrap();
    let text = String::from_utf8(presenter.into_inner()).unwrap();

    assert!(text.starts_with("Sales Forecast Comparison\n"));
    assert!(text.contains("== Analysis for X =="));
    assert!(text.contains("Number of rows: 30"));
    assert!(text.contains("Forecast data for Y"));
    assert!(text.contains("Forecast plot for Y for 1 years"));
    assert!(text.contains("Forecast components for X"));
    assert!(text.contains("The best trending item is"));
}
