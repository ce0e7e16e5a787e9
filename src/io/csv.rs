use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::dataset::{ColumnData, Dataset};
use crate::error::{Error, Result};
use crate::na::NA;

/// Read a CSV file into a dataset of text columns
///
/// The first row must be a header. Short rows are padded with missing cells
/// and empty cells are missing; typing happens later in the loader.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let file = File::open(path.as_ref()).map_err(Error::Io)?;
    read_csv_from_reader(file)
}

/// Read CSV text from any reader
pub fn read_csv_from_reader<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(Error::Csv)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut columns: Vec<Vec<NA<String>>> = vec![Vec::new(); headers.len()];

    for result in rdr.records() {
        let record = result.map_err(Error::Csv)?;
        for (i, column) in columns.iter_mut().enumerate() {
            match record.get(i) {
                Some(cell) if !cell.is_empty() => column.push(NA::Value(cell.to_string())),
                _ => column.push(NA::NA),
            }
        }
    }

    let mut ds = Dataset::new();
    for (header, values) in headers.into_iter().zip(columns) {
        ds.add_column(header, ColumnData::Text(values))?;
    }

    Ok(ds)
}
