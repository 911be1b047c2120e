pub mod batch;
pub mod config;
pub mod converter;
pub mod error;
pub mod generator;
pub mod logging;
pub mod normalizer;
pub mod server;
pub mod table;

pub use batch::{BatchSummary, derived_column_name, transform};
pub use error::{BatchError, FileError, TableError};
pub use normalizer::{ConversionResult, normalize, normalize_str};
pub use table::{CellValue, Table};
