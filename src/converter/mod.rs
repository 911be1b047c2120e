//! Tabular file codecs used by the batch path.

pub mod csv_table;
pub mod xlsx_table;

use std::path::Path;

use crate::error::TableError;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Xlsx,
}

impl TableFormat {
    /// Resolve the format from a file name's extension, case-insensitively.
    pub fn from_file_name(file_name: &str) -> Result<Self, TableError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "xlsx" => Ok(TableFormat::Xlsx),
            _ => Err(TableError::UnsupportedFileFormat(file_name.to_string())),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            TableFormat::Csv => "text/csv; charset=utf-8",
            TableFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

pub fn read_table(bytes: &[u8], format: TableFormat) -> Result<Table, TableError> {
    match format {
        TableFormat::Csv => csv_table::read(bytes, None),
        TableFormat::Xlsx => xlsx_table::read(bytes),
    }
}

pub fn write_table(table: &Table, format: TableFormat) -> Result<Vec<u8>, TableError> {
    match format {
        TableFormat::Csv => csv_table::write(table, None),
        TableFormat::Xlsx => xlsx_table::write(table),
    }
}

/// `emails.csv` -> `emails_processed.csv`. Directories sent by some browsers
/// are dropped.
pub fn processed_file_name(file_name: &str) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match path.extension() {
        Some(ext) => format!("{}_processed.{}", stem, ext.to_string_lossy()),
        None => format!("{}_processed", stem),
    }
}
