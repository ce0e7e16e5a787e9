//! Dashboard configuration
//!
//! Loaded from TOML. SMTP credentials never appear in the file: they are read
//! from the environment when the notifier is built.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::compare::TieBreak;
use crate::error::{Error, Result};
use crate::forecast::AdditiveParams;
use crate::temporal::{parse_config_date, DateBounds, Frequency};

/// Environment variable holding the config file path for the binary
pub const CONFIG_PATH_ENV: &str = "FORECAST_DASH_CONFIG";
/// Config file used when [`CONFIG_PATH_ENV`] is unset
pub const DEFAULT_CONFIG_PATH: &str = "dashboard.toml";
/// Environment override for the notification recipient
pub const RECIPIENT_ENV: &str = "FORECAST_DASH_RECIPIENT";
pub const SMTP_USERNAME_ENV: &str = "FORECAST_DASH_SMTP_USERNAME";
pub const SMTP_PASSWORD_ENV: &str = "FORECAST_DASH_SMTP_PASSWORD";

/// Smallest and largest selectable prediction horizon, in years
pub const MIN_YEARS: u32 = 1;
pub const MAX_YEARS: u32 = 4;
/// Days per year of prediction
pub const DAYS_PER_YEAR: usize = 365;

const DEFAULT_SYMBOLS: [&str; 4] = ["GOOG", "AAPL", "MSFT", "GME"];
const DEFAULT_MARKET_START: &str = "2015-01-01";
const DEFAULT_ANCHOR: &str = "2017-09-01";
const MARKET_FIELDS: [&str; 6] = ["open", "high", "low", "close", "adj_close", "volume"];

/// How a source is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Dated CSV with entity, timestamp and value columns
    Csv,
    /// Undated CSV with entity and unit-count columns
    UnitSales,
    /// Daily market history fetched per symbol
    Remote,
}

/// One data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub name: String,
    pub kind: SourceKind,
    /// CSV file, for `csv` and `unit_sales`
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub entity_column: Option<String>,
    #[serde(default)]
    pub timestamp_column: Option<String>,
    #[serde(default)]
    pub value_column: Option<String>,
    /// Explicit timestamp format; auto-detected when absent
    #[serde(default)]
    pub date_format: Option<String>,
    /// Inclusive lower bound (`YYYY-MM-DD`); the fetch start for `remote`
    #[serde(default)]
    pub start: Option<String>,
    /// Inclusive upper bound (`YYYY-MM-DD`)
    #[serde(default)]
    pub end: Option<String>,
    /// First synthesized date for `unit_sales`
    #[serde(default)]
    pub anchor: Option<String>,
    /// Step between synthesized dates for `unit_sales`
    #[serde(default)]
    pub frequency: Option<String>,
    /// Allowed symbols for `remote`
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Market field forecast for `remote`
    #[serde(default = "default_value_field")]
    pub value_field: String,
}

fn default_symbols() -> Vec<String> {
    DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
}

fn default_value_field() -> String {
    "close".to_string()
}

impl SourceConfig {
    /// Minimal config of the given kind
    pub fn new(name: impl Into<String>, kind: SourceKind) -> Self {
        SourceConfig {
            name: name.into(),
            kind,
            path: None,
            entity_column: None,
            timestamp_column: None,
            value_column: None,
            date_format: None,
            start: None,
            end: None,
            anchor: None,
            frequency: None,
            symbols: default_symbols(),
            value_field: default_value_field(),
        }
    }

    /// Configured date bounds
    pub fn bounds(&self) -> Result<DateBounds> {
        Ok(DateBounds {
            start: self.start.as_deref().map(parse_config_date).transpose()?,
            end: self.end.as_deref().map(parse_config_date).transpose()?,
        })
    }

    /// Fetch start for remote sources
    pub fn market_start(&self) -> Result<NaiveDate> {
        parse_config_date(self.start.as_deref().unwrap_or(DEFAULT_MARKET_START))
    }

    /// First synthesized date for unit-sales sources
    pub fn anchor(&self) -> Result<NaiveDate> {
        parse_config_date(self.anchor.as_deref().unwrap_or(DEFAULT_ANCHOR))
    }

    /// Synthesized date step for unit-sales sources
    pub fn frequency(&self) -> Result<Frequency> {
        match self.frequency.as_deref() {
            None => Ok(Frequency::Daily),
            Some(s) => Frequency::from_str(s)
                .ok_or_else(|| Error::Config(format!("source {}: unknown frequency '{}'", self.name, s))),
        }
    }

    /// Whether `symbol` may be fetched from this source
    pub fn allows_symbol(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    pub fn validate(&self) -> Result<()> {
        let missing = |field: &str| {
            Error::Config(format!(
                "source {} ({:?}) requires '{}'",
                self.name, self.kind, field
            ))
        };

        if self.name.trim().is_empty() {
            return Err(Error::Config("source name must not be empty".into()));
        }
        match self.kind {
            SourceKind::Csv => {
                if self.path.is_none() {
                    return Err(missing("path"));
                }
                if self.entity_column.is_none() {
                    return Err(missing("entity_column"));
                }
                if self.timestamp_column.is_none() {
                    return Err(missing("timestamp_column"));
                }
                if self.value_column.is_none() {
                    return Err(missing("value_column"));
                }
            }
            SourceKind::UnitSales => {
                if self.path.is_none() {
                    return Err(missing("path"));
                }
                if self.entity_column.is_none() {
                    return Err(missing("entity_column"));
                }
                if self.value_column.is_none() {
                    return Err(missing("value_column"));
                }
                self.anchor()?;
                self.frequency()?;
            }
            SourceKind::Remote => {
                if self.symbols.is_empty() {
                    return Err(missing("symbols"));
                }
                if !MARKET_FIELDS.contains(&self.value_field.as_str()) {
                    return Err(Error::Config(format!(
                        "source {}: value_field must be one of {:?}, got '{}'",
                        self.name, MARKET_FIELDS, self.value_field
                    )));
                }
                self.market_start()?;
            }
        }

        let bounds = self.bounds()?;
        if let (Some(start), Some(end)) = (bounds.start, bounds.end) {
            if start > end {
                return Err(Error::Config(format!(
                    "source {}: start {} is after end {}",
                    self.name, start, end
                )));
            }
        }
        Ok(())
    }
}

/// One forecast panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PanelConfig {
    /// Name of the source the panel draws from
    pub source: String,
    /// Selected entity (symbol for remote sources); first distinct when absent
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default = "default_years")]
    pub years: u32,
    /// Shown next to the entity in headings, e.g. "first dataset (Adidas)"
    #[serde(default)]
    pub caption: Option<String>,
}

fn default_years() -> u32 {
    MIN_YEARS
}

/// Horizon in days for a number of prediction years
pub fn horizon_days(years: u32) -> Result<usize> {
    if !(MIN_YEARS..=MAX_YEARS).contains(&years) {
        return Err(Error::Config(format!(
            "years of prediction must be between {} and {}, got {}",
            MIN_YEARS, MAX_YEARS, years
        )));
    }
    Ok(years as usize * DAYS_PER_YEAR)
}

/// Comparison settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComparisonConfig {
    pub tie_break: TieBreak,
    /// Noun used in the verdict message ("stock", "shoe", ...)
    pub label_kind: String,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        ComparisonConfig {
            tie_break: TieBreak::default(),
            label_kind: "stock".to_string(),
        }
    }
}

/// Email notification settings; credentials come from the environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationConfig {
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub from_address: String,
    /// Log the message instead of sending it
    #[serde(default)]
    pub dry_run: bool,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

/// SMTP login read from the environment
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl SmtpCredentials {
    /// Read credentials from [`SMTP_USERNAME_ENV`] and [`SMTP_PASSWORD_ENV`]
    pub fn from_env() -> Result<Self> {
        let read = |key: &str| {
            env::var(key)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Config(format!("environment variable {} is not set", key)))
        };
        Ok(SmtpCredentials {
            username: read(SMTP_USERNAME_ENV)?,
            password: read(SMTP_PASSWORD_ENV)?,
        })
    }
}

/// Whole dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    #[serde(default = "default_title")]
    pub title: String,
    pub sources: Vec<SourceConfig>,
    pub panels: Vec<PanelConfig>,
    #[serde(default)]
    pub forecast: AdditiveParams,
    #[serde(default)]
    pub comparison: ComparisonConfig,
    #[serde(default)]
    pub notification: Option<NotificationConfig>,
    #[serde(default = "default_timeout")]
    pub network_timeout_secs: u64,
}

fn default_title() -> String {
    "Forecast Comparison".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl DashboardConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: DashboardConfig = toml::from_str(text)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&text)?;
        log::info!(
            "loaded configuration from {}: {} sources, {} panels",
            path.display(),
            config.sources.len(),
            config.panels.len()
        );
        Ok(config)
    }

    /// Load from [`CONFIG_PATH_ENV`], falling back to [`DEFAULT_CONFIG_PATH`]
    pub fn load_default() -> Result<Self> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_file(path)
    }

    /// Apply environment overrides for non-secret fields
    pub fn apply_env_overrides(&mut self) {
        if let Ok(recipient) = env::var(RECIPIENT_ENV) {
            if let Some(notification) = self.notification.as_mut() {
                if !recipient.is_empty() {
                    notification.recipient = Some(recipient);
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(Error::Config("at least one source is required".into()));
        }
        for (i, source) in self.sources.iter().enumerate() {
            source.validate()?;
            if self.sources[..i].iter().any(|s| s.name == source.name) {
                return Err(Error::Config(format!("duplicate source name '{}'", source.name)));
            }
        }

        if self.panels.is_empty() || self.panels.len() > 2 {
            return Err(Error::Config(format!(
                "one or two panels are required, got {}",
                self.panels.len()
            )));
        }
        for panel in &self.panels {
            if self.source(&panel.source).is_none() {
                return Err(Error::Config(format!(
                    "panel refers to unknown source '{}'",
                    panel.source
                )));
            }
            horizon_days(panel.years)?;
        }

        self.forecast.validate()?;
        if self.network_timeout_secs == 0 {
            return Err(Error::Config("network_timeout_secs must be positive".into()));
        }
        if let Some(notification) = &self.notification {
            if !notification.from_address.contains('@') {
                return Err(Error::Config(format!(
                    "invalid from_address '{}'",
                    notification.from_address
                )));
            }
        }
        Ok(())
    }

    /// Source by name
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Timeout shared by market requests and SMTP sessions
    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(self.network_timeout_secs)
    }
}
