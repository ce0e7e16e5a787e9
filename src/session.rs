//! Interactive dashboard state
//!
//! A [`Session`] holds the loaded datasets and the current
//! [`DashboardRequest`]. Each [`Event`] updates the request and recomputes
//! only the stages downstream of the change.

use std::collections::HashMap;

use crate::compare::{ComparisonEngine, ComparisonVerdict};
use crate::config::{horizon_days, DashboardConfig, SourceKind};
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::filter::distinct_entities;
use crate::forecast::ForecastRunner;
use crate::notify::Notifier;
use crate::pipeline::{
    compare_branches, notify_verdict, run_branch, BranchOutcome, DashboardReport,
    DashboardRequest, NotificationStatus, PanelRequest,
};
use crate::source::DataSource;

/// Source name plus the symbol for remote sources
type DatasetKey = (String, Option<String>);

/// A user interaction
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SelectEntity { panel: usize, entity: String },
    SetYears { panel: usize, years: u32 },
    SetRecipient(Option<String>),
}

/// Stages recomputed by one event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recomputed {
    pub branches: Vec<usize>,
    pub comparison: bool,
    pub notification: bool,
}

impl Recomputed {
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty() && !self.comparison && !self.notification
    }
}

pub struct Session {
    config: DashboardConfig,
    source: DataSource,
    runner: ForecastRunner,
    engine: ComparisonEngine,
    notifier: Option<Box<dyn Notifier>>,
    datasets: HashMap<DatasetKey, Dataset>,
    request: DashboardRequest,
    branches: Vec<BranchOutcome>,
    comparison: Option<Result<ComparisonVerdict>>,
    notification: Option<NotificationStatus>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("title", &self.config.title)
            .field("request", &self.request)
            .field("datasets", &self.datasets.len())
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session and fill the initial request
    ///
    /// Panels without a configured entity start on the first symbol of a
    /// remote source or the first entity of a loaded dataset. Nothing is
    /// forecast until [`Session::refresh`].
    pub fn new(
        config: DashboardConfig,
        source: DataSource,
        notifier: Option<Box<dyn Notifier>>,
    ) -> Result<Self> {
        config.validate()?;
        let recipient = config
            .notification
            .as_ref()
            .and_then(|n| n.recipient.clone());

        let mut session = Session {
            runner: ForecastRunner::additive(config.forecast.clone()),
            engine: ComparisonEngine::new(config.comparison.tie_break),
            config,
            source,
            notifier,
            datasets: HashMap::new(),
            request: DashboardRequest {
                panels: Vec::new(),
                recipient,
            },
            branches: Vec::new(),
            comparison: None,
            notification: None,
        };

        let panels = session.config.panels.clone();
        for panel in panels {
            let entity = match panel.entity {
                Some(entity) => entity,
                None => session.default_entity(&panel.source),
            };
            session.request.panels.push(PanelRequest {
                source: panel.source,
                entity,
                years: panel.years,
                caption: panel.caption,
            });
        }
        Ok(session)
    }

    fn default_entity(&mut self, source_name: &str) -> String {
        match self.config.source(source_name) {
            Some(source) if source.kind == SourceKind::Remote => {
                return source.symbols.first().cloned().unwrap_or_default();
            }
            Some(_) => {}
            None => return String::new(),
        }
        let key = (source_name.to_string(), None);
        match self.ensure_loaded(key) {
            Ok(key) => self
                .datasets
                .get(&key)
                .and_then(|d| distinct_entities(d).into_iter().next())
                .unwrap_or_default(),
            Err(e) => {
                log::warn!("no default entity for {}: {}", source_name, e);
                String::new()
            }
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn request(&self) -> &DashboardRequest {
        &self.request
    }

    pub fn branches(&self) -> &[BranchOutcome] {
        &self.branches
    }

    pub fn comparison(&self) -> Option<&Result<ComparisonVerdict>> {
        self.comparison.as_ref()
    }

    pub fn notification(&self) -> Option<&NotificationStatus> {
        self.notification.as_ref()
    }

    /// Distinct entities a panel can select
    pub fn entities(&mut self, panel: usize) -> Result<Vec<String>> {
        let source_name = self.panel(panel)?.source.clone();
        let source = self
            .config
            .source(&source_name)
            .ok_or_else(|| Error::Config(format!("unknown source '{}'", source_name)))?;
        if source.kind == SourceKind::Remote {
            return Ok(source.symbols.clone());
        }
        let key = self.ensure_loaded((source_name, None))?;
        Ok(self.datasets.get(&key).map(distinct_entities).unwrap_or_default())
    }

    /// Recompute every branch, the comparison and the notification
    pub fn refresh(&mut self) -> Recomputed {
        let loaded: Vec<Option<BranchOutcome>> =
            (0..self.request.panels.len()).map(|i| self.prepare(i)).collect();

        let this = &*self;
        let run = |i: usize, failure: Option<BranchOutcome>| {
            failure.unwrap_or_else(|| this.run_panel(i))
        };
        let branches = if loaded.len() == 2 {
            let mut loaded = loaded.into_iter();
            let (first, second) = (loaded.next().flatten(), loaded.next().flatten());
            let (a, b) = rayon::join(|| run(0, first), || run(1, second));
            vec![a, b]
        } else {
            loaded
                .into_iter()
                .enumerate()
                .map(|(i, failure)| run(i, failure))
                .collect()
        };

        self.branches = branches;
        self.recompare();
        self.renotify();
        Recomputed {
            branches: (0..self.branches.len()).collect(),
            comparison: true,
            notification: true,
        }
    }

    /// Apply one event
    ///
    /// Invalid events (unknown panel, years out of range) are rejected
    /// without changing the session.
    pub fn apply(&mut self, event: Event) -> Result<Recomputed> {
        log::debug!("applying {:?}", event);
        match event {
            Event::SelectEntity { panel, entity } => {
                if self.panel(panel)?.entity == entity {
                    return Ok(Recomputed::default());
                }
                self.request.panels[panel].entity = entity;
                Ok(self.recompute_branch(panel))
            }
            Event::SetYears { panel, years } => {
                horizon_days(years)?;
                if self.panel(panel)?.years == years {
                    return Ok(Recomputed::default());
                }
                self.request.panels[panel].years = years;
                Ok(self.recompute_branch(panel))
            }
            Event::SetRecipient(recipient) => {
                let recipient = recipient
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty());
                if recipient == self.request.recipient {
                    return Ok(Recomputed::default());
                }
                self.request.recipient = recipient;
                self.renotify();
                Ok(Recomputed {
                    notification: true,
                    ..Recomputed::default()
                })
            }
        }
    }

    /// Current state for a presenter
    pub fn report(&self) -> DashboardReport<'_> {
        DashboardReport {
            title: &self.config.title,
            label_kind: &self.config.comparison.label_kind,
            branches: &self.branches,
            comparison: self.comparison.as_ref(),
            notification: self.notification.as_ref(),
        }
    }

    fn panel(&self, index: usize) -> Result<&PanelRequest> {
        self.request.panels.get(index).ok_or_else(|| {
            Error::InvalidInput(format!(
                "panel {} does not exist ({} panels)",
                index,
                self.request.panels.len()
            ))
        })
    }

    fn recompute_branch(&mut self, index: usize) -> Recomputed {
        if self.branches.len() != self.request.panels.len() {
            return self.refresh();
        }
        let outcome = self
            .prepare(index)
            .unwrap_or_else(|| self.run_panel(index));
        self.branches[index] = outcome;
        self.recompare();
        self.renotify();
        Recomputed {
            branches: vec![index],
            comparison: true,
            notification: true,
        }
    }

    fn dataset_key(&self, panel: &PanelRequest) -> DatasetKey {
        let remote = self
            .config
            .source(&panel.source)
            .map_or(false, |s| s.kind == SourceKind::Remote);
        let symbol = if remote { Some(panel.entity.clone()) } else { None };
        (panel.source.clone(), symbol)
    }

    fn ensure_loaded(&mut self, key: DatasetKey) -> Result<DatasetKey> {
        if self.datasets.contains_key(&key) {
            return Ok(key);
        }
        let config = self
            .config
            .source(&key.0)
            .ok_or_else(|| Error::data_load(key.0.as_str(), "source is not configured"))?;
        let dataset = self.source.load(config, key.1.as_deref())?;
        self.datasets.insert(key.clone(), dataset);
        Ok(key)
    }

    /// Load the panel's dataset; a failure becomes the branch outcome
    fn prepare(&mut self, index: usize) -> Option<BranchOutcome> {
        let panel = self.request.panels.get(index)?;
        let key = self.dataset_key(panel);
        match self.ensure_loaded(key) {
            Ok(_) => None,
            Err(e) => Some(BranchOutcome::failed(&self.request.panels[index], e)),
        }
    }

    fn run_panel(&self, index: usize) -> BranchOutcome {
        let panel = &self.request.panels[index];
        let key = self.dataset_key(panel);
        match (self.config.source(&panel.source), self.datasets.get(&key)) {
            (Some(source), Some(dataset)) => run_branch(source, dataset, panel, &self.runner),
            _ => BranchOutcome::failed(
                panel,
                Error::data_load(panel.source.as_str(), "dataset is not loaded"),
            ),
        }
    }

    fn recompare(&mut self) {
        self.comparison = compare_branches(&self.engine, &self.branches);
        match &self.comparison {
            Some(Ok(verdict)) => log::info!(
                "winner {} with {:.2}%",
                verdict.winner,
                verdict.winner_change
            ),
            Some(Err(e)) => log::warn!("comparison failed: {}", e),
            None => log::debug!("comparison skipped"),
        }
    }

    fn renotify(&mut self) {
        let verdict = match &self.comparison {
            Some(Ok(verdict)) => Some(verdict),
            _ => None,
        };
        self.notification = notify_verdict(
            self.notifier.as_deref(),
            self.request.recipient.as_deref(),
            verdict,
            &self.config.comparison.label_kind,
        );
    }
}
