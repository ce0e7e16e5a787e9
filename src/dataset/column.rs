use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::na::NA;
use crate::temporal::parse_date;

lazy_static! {
    // Currency symbols, thousands separators and stray whitespace
    static ref NUMERIC_NOISE: Regex = Regex::new(r"[\s,\$£€¥]").unwrap();
}

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Number,
    Date,
}

/// Typed column storage
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<NA<String>>),
    Number(Vec<NA<f64>>),
    Date(Vec<NA<NaiveDate>>),
}

impl ColumnData {
    /// Number of cells
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(v) => v.len(),
            ColumnData::Number(v) => v.len(),
            ColumnData::Date(v) => v.len(),
        }
    }

    /// Whether the column has no cells
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column type
    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Text(_) => ColumnType::Text,
            ColumnData::Number(_) => ColumnType::Number,
            ColumnData::Date(_) => ColumnType::Date,
        }
    }

    /// Whether the cell at `row` is missing
    pub fn is_na(&self, row: usize) -> bool {
        match self {
            ColumnData::Text(v) => v.get(row).map_or(true, NA::is_na),
            ColumnData::Number(v) => v.get(row).map_or(true, NA::is_na),
            ColumnData::Date(v) => v.get(row).map_or(true, NA::is_na),
        }
    }

    /// Copy of the cells at the given positions, in that order
    pub fn take(&self, rows: &[usize]) -> ColumnData {
        fn pick<T: Clone>(values: &[NA<T>], rows: &[usize]) -> Vec<NA<T>> {
            rows.iter()
                .map(|&i| values.get(i).cloned().unwrap_or(NA::NA))
                .collect()
        }

        match self {
            ColumnData::Text(v) => ColumnData::Text(pick(v, rows)),
            ColumnData::Number(v) => ColumnData::Number(pick(v, rows)),
            ColumnData::Date(v) => ColumnData::Date(pick(v, rows)),
        }
    }

    /// Cell rendered for display
    pub fn display(&self, row: usize) -> String {
        match self {
            ColumnData::Text(v) => v.get(row).map(|c| c.to_string()),
            ColumnData::Number(v) => v.get(row).map(|c| match c {
                NA::Value(x) => format!("{}", x),
                NA::NA => "NA".to_string(),
            }),
            ColumnData::Date(v) => v.get(row).map(|c| match c {
                NA::Value(d) => d.format("%Y-%m-%d").to_string(),
                NA::NA => "NA".to_string(),
            }),
        }
        .unwrap_or_default()
    }

    /// Convert to a date column
    ///
    /// Text cells that do not parse become NA; an existing date column is
    /// returned unchanged.
    pub fn to_dates(&self, format: Option<&str>) -> ColumnData {
        match self {
            ColumnData::Text(v) => ColumnData::Date(
                v.iter()
                    .map(|cell| match cell {
                        NA::Value(s) => parse_date(s, format).into(),
                        NA::NA => NA::NA,
                    })
                    .collect(),
            ),
            ColumnData::Date(_) => self.clone(),
            ColumnData::Number(v) => ColumnData::Date(vec![NA::NA; v.len()]),
        }
    }

    /// Convert to a numeric column
    ///
    /// `$1,097.50` parses as 1097.5; anything else unparseable becomes NA.
    pub fn to_numbers(&self) -> ColumnData {
        match self {
            ColumnData::Text(v) => ColumnData::Number(
                v.iter()
                    .map(|cell| match cell {
                        NA::Value(s) => parse_number(s),
                        NA::NA => NA::NA,
                    })
                    .collect(),
            ),
            ColumnData::Number(_) => self.clone(),
            ColumnData::Date(v) => ColumnData::Number(vec![NA::NA; v.len()]),
        }
    }
}

/// Parse a numeric cell, tolerating currency formatting
pub fn parse_number(s: &str) -> NA<f64> {
    let cleaned = NUMERIC_NOISE.replace_all(s, "");
    if cleaned.is_empty() {
        return NA::NA;
    }
    match cleaned.parse::<f64>() {
        Ok(v) => NA::finite(v),
        Err(_) => NA::NA,
    }
}

/// Named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub(crate) name: String,
    pub(crate) data: ColumnData,
}

impl Column {
    /// Create a column
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Column {
            name: name.into(),
            data,
        }
    }

    /// Column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column data
    pub fn data(&self) -> &ColumnData {
        &self.data
    }
}
