//! Projection of a filtered subset into the canonical training series

use chrono::NaiveDate;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::na::NA;

/// Minimum number of valid points needed to attempt a fit
pub const MIN_TRAINING_POINTS: usize = 2;

/// One training observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Timestamp (`ds`)
    pub ds: NaiveDate,
    /// Target value (`y`)
    pub y: f64,
}

/// Validated (timestamp, value) series handed to the forecaster
///
/// Points keep their input order and duplicate timestamps are allowed. The
/// constructor guarantees at least [`MIN_TRAINING_POINTS`] finite points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSeries {
    name: String,
    points: Vec<SeriesPoint>,
}

impl TrainingSeries {
    /// Build a validated series
    pub fn new(name: impl Into<String>, points: Vec<SeriesPoint>) -> Result<Self> {
        let name = name.into();
        if points.len() < MIN_TRAINING_POINTS {
            return Err(Error::InsufficientData {
                entity: name,
                valid_rows: points.len(),
                required: MIN_TRAINING_POINTS,
            });
        }
        if let Some(p) = points.iter().find(|p| !p.y.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "non-finite value {} at {} in series {}",
                p.y, p.ds, name
            )));
        }
        Ok(TrainingSeries { name, points })
    }

    /// Series label (the entity it was built for)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed series
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points in input order
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// Timestamps in input order
    pub fn timestamps(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.ds).collect()
    }

    /// Values in input order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    /// Value of the final row; the "last known actual" used for comparison
    pub fn last_value(&self) -> f64 {
        self.points.last().map(|p| p.y).unwrap_or(f64::NAN)
    }
}

/// Outcome of reshaping a subset
#[derive(Debug, Clone, PartialEq)]
pub enum Reshaped {
    /// Enough valid points to fit
    Ready(TrainingSeries),
    /// Fewer than [`MIN_TRAINING_POINTS`] valid points; do not fit
    Insufficient { valid_rows: usize },
}

impl Reshaped {
    /// Convert into a series, turning the insufficient sentinel into an error
    pub fn into_series(self, entity: &str) -> Result<TrainingSeries> {
        match self {
            Reshaped::Ready(series) => Ok(series),
            Reshaped::Insufficient { valid_rows } => Err(Error::InsufficientData {
                entity: entity.to_string(),
                valid_rows,
                required: MIN_TRAINING_POINTS,
            }),
        }
    }
}

/// Project `timestamp_column` and `value_column` of `subset` into a training
/// series named `name`
///
/// Rows missing either cell are dropped before the sufficiency check. A subset
/// lacking either column has no valid rows.
pub fn reshape(
    subset: &Dataset,
    timestamp_column: &str,
    value_column: &str,
    name: &str,
) -> Reshaped {
    let (dates, values) = match (subset.dates(timestamp_column), subset.numbers(value_column)) {
        (Ok(d), Ok(v)) => (d, v),
        (d, v) => {
            log::debug!(
                "cannot reshape {}: timestamp column ok={}, value column ok={}",
                name,
                d.is_ok(),
                v.is_ok()
            );
            return Reshaped::Insufficient { valid_rows: 0 };
        }
    };

    let points: Vec<SeriesPoint> = dates
        .iter()
        .zip(values.iter())
        .filter_map(|pair| match pair {
            (NA::Value(ds), NA::Value(y)) if y.is_finite() => Some(SeriesPoint { ds: *ds, y: *y }),
            _ => None,
        })
        .collect();

    if points.len() < MIN_TRAINING_POINTS {
        return Reshaped::Insufficient {
            valid_rows: points.len(),
        };
    }

    match TrainingSeries::new(name, points) {
        Ok(series) => Reshaped::Ready(series),
        Err(_) => Reshaped::Insufficient { valid_rows: 0 },
    }
}
