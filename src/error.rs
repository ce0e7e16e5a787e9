use thiserror::Error;

/// Error type for the forecast dashboard
///
/// The first group of variants is the branch-level taxonomy: each of them is
/// caught at the branch boundary and shown inline, never aborting the session.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to load data from {source_name}: {reason}")]
    DataLoad { source_name: String, reason: String },

    #[error("not enough data for {entity} to create a forecast: {valid_rows} valid rows, need at least {required}")]
    InsufficientData {
        entity: String,
        valid_rows: usize,
        required: usize,
    },

    #[error("forecast failed for {entity}: {reason}")]
    Forecast { entity: String, reason: String },

    #[error("cannot compare forecasts: {0}")]
    InvalidComparison(String),

    #[error("failed to send notification: {0}")]
    Notification(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("row count mismatch: expected {expected}, found {found}")]
    InconsistentRowCount { expected: usize, found: usize },

    #[error("model error: {0}")]
    Model(String),

    #[error("computation error: {0}")]
    ComputationError(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error")]
    Io(#[source] std::io::Error),

    #[error("CSV error")]
    Csv(#[source] csv::Error),

    #[error("JSON error")]
    Json(#[source] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a `DataLoad` error for the named source
    pub fn data_load(source_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::DataLoad {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Short category label used in inline messages
    pub fn kind(&self) -> &'static str {
        match self {
            Error::DataLoad { .. } => "DataLoadError",
            Error::InsufficientData { .. } => "InsufficientDataError",
            Error::Forecast { .. } | Error::Model(_) | Error::ComputationError(_) => {
                "ForecastError"
            }
            Error::InvalidComparison(_) => "InvalidComparisonError",
            Error::Notification(_) => "NotificationError",
            Error::Config(_) => "ConfigError",
            _ => "Error",
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
