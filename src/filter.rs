//! Entity selection and date synthesis

use chrono::NaiveDate;

use crate::dataset::{names, ColumnData, Dataset};
use crate::error::Result;
use crate::na::NA;
use crate::temporal::{date_range, DateBounds, Frequency};

/// Which rows of a dataset belong to one selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriterion {
    /// Exact, case-sensitive entity value
    pub entity: String,
    pub bounds: DateBounds,
}

impl FilterCriterion {
    /// Criterion without date bounds
    pub fn entity(entity: impl Into<String>) -> Self {
        FilterCriterion {
            entity: entity.into(),
            bounds: DateBounds::default(),
        }
    }

    /// Add inclusive date bounds
    pub fn with_bounds(mut self, bounds: DateBounds) -> Self {
        self.bounds = bounds;
        self
    }
}

/// Rows whose entity equals `criterion.entity`, re-indexed from 0
///
/// Never fails: no match, or a dataset without an entity column, gives an
/// empty subset. Bounds only apply when a timestamp column exists; rows with
/// a missing timestamp are dropped when any bound is set.
pub fn filter(dataset: &Dataset, criterion: &FilterCriterion) -> Dataset {
    let entities = match dataset.text(names::ENTITY) {
        Ok(entities) => entities,
        Err(_) => return dataset.take_rows(&[]),
    };
    let timestamps = if criterion.bounds.is_unbounded() {
        None
    } else {
        dataset.dates(names::TIMESTAMP).ok()
    };

    let subset = dataset.filter_rows(|row| {
        let matches = matches!(&entities[row], NA::Value(e) if *e == criterion.entity);
        matches
            && timestamps.map_or(true, |ts| match &ts[row] {
                NA::Value(d) => criterion.bounds.contains(d),
                NA::NA => false,
            })
    });

    log::debug!(
        "filter '{}': {} of {} rows",
        criterion.entity,
        subset.row_count(),
        dataset.row_count()
    );
    subset
}

/// Distinct entity values in first-appearance order
pub fn distinct_entities(dataset: &Dataset) -> Vec<String> {
    dataset.unique_text(names::ENTITY).unwrap_or_default()
}

/// Add a timestamp column of `subset.row_count()` dates starting at `anchor`,
/// `frequency` apart
///
/// Any existing timestamp column is replaced.
pub fn synthesize_timestamps(
    subset: &Dataset,
    anchor: NaiveDate,
    frequency: Frequency,
) -> Result<Dataset> {
    let dates = date_range(anchor, subset.row_count(), frequency)?;
    let mut out = subset.clone();
    out.add_column(
        names::TIMESTAMP,
        ColumnData::Date(dates.into_iter().map(NA::Value).collect()),
    )?;
    Ok(out)
}
