//! Column-oriented in-memory dataset
//!
//! A `Dataset` is an ordered set of equally long typed columns. Datasets are
//! built once by the loaders in [`crate::source`] and are read-only afterwards:
//! every row selection returns a new dataset.

mod column;

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::na::NA;

pub use self::column::{parse_number, Column, ColumnData, ColumnType};

/// Canonical column names shared by every loader
pub mod names {
    pub const ENTITY: &str = "entity";
    pub const TIMESTAMP: &str = "timestamp";
    pub const VALUE: &str = "value";
    pub const OPEN: &str = "open";
    pub const HIGH: &str = "high";
    pub const LOW: &str = "low";
    pub const CLOSE: &str = "close";
    pub const ADJ_CLOSE: &str = "adj_close";
    pub const VOLUME: &str = "volume";
}

/// Ordered collection of named, typed columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Create an empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Whether the dataset has no rows
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    /// Whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Column by name
    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.data)
    }

    /// Add a column, replacing any column of the same name
    pub fn add_column(&mut self, name: impl Into<String>, data: ColumnData) -> Result<()> {
        let name = name.into();
        if !self.columns.is_empty() && data.len() != self.row_count {
            return Err(Error::InconsistentRowCount {
                expected: self.row_count,
                found: data.len(),
            });
        }

        self.row_count = data.len();
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.data = data,
            None => self.columns.push(Column::new(name, data)),
        }
        Ok(())
    }

    /// Rename columns; pairs whose source column is absent are ignored
    ///
    /// An existing column already carrying a target name is dropped so the
    /// result never holds two columns with the same name.
    pub fn rename_columns(&mut self, renames: &[(&str, &str)]) {
        for &(from, to) in renames {
            if from == to || !self.has_column(from) {
                continue;
            }
            self.columns.retain(|c| c.name != to);
            if let Some(col) = self.columns.iter_mut().find(|c| c.name == from) {
                col.name = to.to_string();
            }
        }
    }

    /// Replace a column with a transformed copy of itself
    pub fn convert_column<F>(&mut self, name: &str, f: F) -> Result<()>
    where
        F: FnOnce(&ColumnData) -> ColumnData,
    {
        let col = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
        let converted = f(&col.data);
        if converted.len() != self.row_count {
            return Err(Error::InconsistentRowCount {
                expected: self.row_count,
                found: converted.len(),
            });
        }
        col.data = converted;
        Ok(())
    }

    /// Text cells of a column
    pub fn text(&self, name: &str) -> Result<&[NA<String>]> {
        match self.column(name) {
            Some(ColumnData::Text(v)) => Ok(v),
            Some(other) => Err(Error::InvalidInput(format!(
                "column '{}' is {:?}, not text",
                name,
                other.column_type()
            ))),
            None => Err(Error::ColumnNotFound(name.to_string())),
        }
    }

    /// Numeric cells of a column
    pub fn numbers(&self, name: &str) -> Result<&[NA<f64>]> {
        match self.column(name) {
            Some(ColumnData::Number(v)) => Ok(v),
            Some(other) => Err(Error::InvalidInput(format!(
                "column '{}' is {:?}, not numeric",
                name,
                other.column_type()
            ))),
            None => Err(Error::ColumnNotFound(name.to_string())),
        }
    }

    /// Date cells of a column
    pub fn dates(&self, name: &str) -> Result<&[NA<NaiveDate>]> {
        match self.column(name) {
            Some(ColumnData::Date(v)) => Ok(v),
            Some(other) => Err(Error::InvalidInput(format!(
                "column '{}' is {:?}, not a date column",
                name,
                other.column_type()
            ))),
            None => Err(Error::ColumnNotFound(name.to_string())),
        }
    }

    /// New dataset holding the given rows, re-indexed from 0
    pub fn take_rows(&self, rows: &[usize]) -> Dataset {
        Dataset {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.data.take(rows)))
                .collect(),
            row_count: rows.len(),
        }
    }

    /// New dataset holding the rows for which `keep(row)` is true
    pub fn filter_rows<F>(&self, keep: F) -> Dataset
    where
        F: Fn(usize) -> bool,
    {
        let rows: Vec<usize> = (0..self.row_count).filter(|&i| keep(i)).collect();
        self.take_rows(&rows)
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Dataset {
        let rows: Vec<usize> = (0..n.min(self.row_count)).collect();
        self.take_rows(&rows)
    }

    /// Distinct present values of a text column, in first-appearance order
    pub fn unique_text(&self, name: &str) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for value in self.text(name)?.iter().filter_map(|cell| cell.value()) {
            if seen.insert(value.as_str()) {
                unique.push(value.clone());
            }
        }
        Ok(unique)
    }

    /// Rows rendered as display strings, one `Vec` per row
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        (0..self.row_count)
            .map(|row| self.columns.iter().map(|c| c.data.display(row)).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let mut ds = Dataset::new();
        ds.add_column(
            "Sneaker Name",
            ColumnData::Text(
                ["A", "B", "A"]
                    .iter()
                    .map(|s| NA::Value(s.to_string()))
                    .collect(),
            ),
        )
        .unwrap();
        ds.add_column(
            "Sale Price",
            ColumnData::Number(vec![NA::Value(1.0), NA::NA, NA::Value(3.0)]),
        )
        .unwrap();
        ds
    }

    #[test]
    fn test_add_column_checks_length() {
        let mut ds = sample();
        let err = ds
            .add_column("bad", ColumnData::Number(vec![NA::Value(1.0)]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InconsistentRowCount {
                expected: 3,
                found: 1
            }
        ));
    }

    #[test]
    fn test_rename_and_lookup() {
        let mut ds = sample();
        ds.rename_columns(&[("Sneaker Name", "entity"), ("Missing", "value")]);
        assert_eq!(ds.column_names(), vec!["entity", "Sale Price"]);
        assert!(ds.text("entity").is_ok());
        assert!(matches!(ds.numbers("value"), Err(Error::ColumnNotFound(_))));
        assert!(matches!(ds.numbers("entity"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_rename_drops_clashing_column() {
        let mut ds = sample();
        ds.add_column(
            "value",
            ColumnData::Number(vec![NA::NA, NA::NA, NA::NA]),
        )
        .unwrap();
        ds.rename_columns(&[("Sale Price", "value")]);
        assert_eq!(ds.column_names(), vec!["Sneaker Name", "value"]);
        assert_eq!(ds.numbers("value").unwrap()[0], NA::Value(1.0));
    }

    #[test]
    fn test_filter_rows_reindexes() {
        let ds = sample();
        let subset = ds.filter_rows(|i| i != 1);
        assert_eq!(subset.row_count(), 2);
        assert_eq!(
            subset.numbers("Sale Price").unwrap(),
            &[NA::Value(1.0), NA::Value(3.0)]
        );
    }

    #[test]
    fn test_unique_text_preserves_order() {
        let ds = sample();
        assert_eq!(ds.unique_text("Sneaker Name").unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn test_head_and_display() {
        let ds = sample();
        let rows = ds.head(2).display_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["B".to_string(), "NA".to_string()]);
    }
}
