use thiserror::Error;

/// Raised inside the normalizer when the converter cannot handle a document.
/// Never leaves [`crate::normalizer`]; it is logged and replaced by the
/// degraded output.
#[derive(Debug, Error)]
pub enum NormalizationFailure {
    #[error("html converter panicked: {0}")]
    ConverterPanicked(String),
    #[error("html nests deeper than {0} elements")]
    TooDeep(usize),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("Column '{0}' not found in file")]
    ColumnNotFound(String),
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Unsupported file format '{0}'. Please upload a CSV (.csv) or Excel (.xlsx) file")]
    UnsupportedFileFormat(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel error: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File is not a valid Excel workbook")]
    NotAWorkbook,

    #[error("No sheets found in Excel file")]
    EmptyWorkbook,

    #[error("File has no header row")]
    MissingHeader,
}

/// Anything that can go wrong turning an uploaded file into a processed one.
#[derive(Debug, Error)]
pub enum FileError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Batch(#[from] BatchError),
}
