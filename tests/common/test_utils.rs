//! Temporary files backed by `tempfile`, removed on drop

use std::io::Write;

use tempfile::{Builder, NamedTempFile, TempDir};

/// Empty named file for one test
pub fn temp_file(test_name: &str, extension: &str) -> NamedTempFile {
    Builder::new()
        .prefix(&format!("forecast_dash_{}_", test_name))
        .suffix(&format!(".{}", extension))
        .tempfile()
        .expect("Failed to create temp file")
}

/// Scratch directory for paths that must not exist yet
pub fn temp_dir() -> TempDir {
    Builder::new()
        .prefix("forecast_dash_")
        .tempdir()
        .expect("Failed to create temp dir")
}

/// Write a CSV with a header row
pub fn create_test_csv(test_name: &str, headers: &[&str], rows: &[Vec<String>]) -> NamedTempFile {
    let mut file = temp_file(test_name, "csv");
    writeln!(file, "{}", headers.join(",")).expect("Failed to write headers");
    for row in rows {
        writeln!(file, "{}", row.join(",")).expect("Failed to write row");
    }
    file.flush().expect("Failed to flush test CSV");
    file
}
