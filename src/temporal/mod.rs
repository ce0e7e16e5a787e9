//! Date parsing, inclusive date bounds and fixed-frequency date ranges

mod frequency;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use self::frequency::Frequency;

/// Formats tried, in order, when no explicit date format is configured
///
/// `%y` must precede `%Y`: chrono accepts a two-digit year under `%Y`.
const AUTO_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y%m%d",
];

const AUTO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a date cell
///
/// With an explicit `format`, only that format is tried (as a date, then as a
/// date-time). Without one, a fixed list of common layouts is tried. Returns
/// `None` for anything unparseable; callers turn that into a missing cell.
pub fn parse_date(s: &str, format: Option<&str>) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(fmt) = format {
        return NaiveDate::parse_from_str(s, fmt)
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(s, fmt).ok().map(|dt| dt.date()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in AUTO_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    AUTO_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parse a configuration date, which must be `YYYY-MM-DD`
pub fn parse_config_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| Error::Config(format!("invalid date '{}': {}", s, e)))
}

/// Inclusive date range; either end may be open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateBounds {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateBounds {
    /// Bounds closed on both ends
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateBounds {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Whether no bound is set
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether `date` lies inside the inclusive range
    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.start.map_or(true, |s| *date >= s) && self.end.map_or(true, |e| *date <= e)
    }
}

/// `periods` dates starting at `start`, `freq` apart
pub fn date_range(start: NaiveDate, periods: usize, freq: Frequency) -> Result<Vec<NaiveDate>> {
    (0..periods)
        .map(|i| {
            freq.advance(start, i as i64).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "date range from {} overflows after {} steps of {}",
                    start, i, freq
                ))
            })
        })
        .collect()
}
