//! Column-wise normalization over a decoded table.

use crate::converter::{self, TableFormat};
use crate::error::{BatchError, FileError};
use crate::normalizer::{self, Outcome};
use crate::table::{CellValue, Table};

pub const DERIVED_COLUMN_PREFIX: &str = "Human Readable ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub rows: usize,
    pub converted: usize,
    pub not_text: usize,
    pub degraded: usize,
}

pub fn derived_column_name(source_column: &str) -> String {
    format!("{}{}", DERIVED_COLUMN_PREFIX, source_column)
}

/// Returns a copy of `table` with the cleaned text of `source_column` in the
/// derived column. Only the cleaned text is kept per row.
pub fn transform(table: &Table, source_column: &str) -> Result<Table, BatchError> {
    transform_with_summary(table, source_column).map(|(table, _)| table)
}

pub fn transform_with_summary(
    table: &Table,
    source_column: &str,
) -> Result<(Table, BatchSummary), BatchError> {
    let cells = table
        .column(source_column)
        .ok_or_else(|| BatchError::ColumnNotFound(source_column.to_string()))?;

    let mut summary = BatchSummary {
        rows: table.len(),
        ..Default::default()
    };

    let derived: Vec<CellValue> = cells
        .map(|cell| {
            let cleaned = normalizer::clean(cell);
            match cleaned.outcome {
                Outcome::Converted => summary.converted += 1,
                Outcome::NotText => summary.not_text += 1,
                Outcome::Degraded => summary.degraded += 1,
            }
            CellValue::Text(cleaned.text)
        })
        .collect();

    let mut output = table.clone();
    output.set_column(&derived_column_name(source_column), derived);

    tracing::info!(
        column = %source_column,
        rows = summary.rows,
        converted = summary.converted,
        not_text = summary.not_text,
        degraded = summary.degraded,
        "Batch transform finished"
    );

    Ok((output, summary))
}

/// Decode `bytes`, transform `source_column` and encode the result in the
/// same format.
pub fn process_file(
    bytes: &[u8],
    format: TableFormat,
    source_column: &str,
) -> Result<(Vec<u8>, BatchSummary), FileError> {
    let table = converter::read_table(bytes, format)?;
    let (output, summary) = transform_with_summary(&table, source_column)?;
    let encoded = converter::write_table(&output, format)?;
    Ok((encoded, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emails() -> Table {
        let mut table = Table::new(vec!["id".into(), "raw_html".into()]);
        table.push_row(vec![CellValue::Int(1), "<p>Hello <b>World</b></p>".into()]);
        table.push_row(vec![CellValue::Int(2), CellValue::Empty]);
        table.push_row(vec![CellValue::Int(3), CellValue::Float(4.5)]);
        table.push_row(vec![
            CellValue::Int(4),
            r#"<a href="https://example.com">click</a>"#.into(),
        ]);
        table
    }

    #[test]
    fn test_missing_column_fails_and_leaves_table_alone() {
        let table = emails();
        let before = table.clone();
        let err = transform(&table, "missing_col").unwrap_err();
        assert_eq!(err, BatchError::ColumnNotFound("missing_col".to_string()));
        assert_eq!(err.to_string(), "Column 'missing_col' not found in file");
        assert_eq!(table, before);
    }

    #[test]
    fn test_derived_column_appended_per_row() {
        let out = transform(&emails(), "raw_html").unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(
            out.columns(),
            &["id", "raw_html", "Human Readable raw_html"]
        );
        let derived: Vec<String> = out
            .column("Human Readable raw_html")
            .unwrap()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(derived, vec!["Hello **World**", "", "", "click"]);
    }

    #[test]
    fn test_row_order_preserved() {
        let out = transform(&emails(), "raw_html").unwrap();
        let ids: Vec<&CellValue> = out.column("id").unwrap().collect();
        assert_eq!(
            ids,
            vec![
                &CellValue::Int(1),
                &CellValue::Int(2),
                &CellValue::Int(3),
                &CellValue::Int(4)
            ]
        );
    }

    #[test]
    fn test_summary_counts_outcomes() {
        let (_, summary) = transform_with_summary(&emails(), "raw_html").unwrap();
        assert_eq!(
            summary,
            BatchSummary {
                rows: 4,
                converted: 2,
                not_text: 2,
                degraded: 0,
            }
        );
    }

    #[test]
    fn test_degraded_row_keeps_raw_input() {
        let deep = format!("{}x{}", "<b>".repeat(3000), "</b>".repeat(3000));
        let mut table = emails();
        table.push_row(vec![CellValue::Int(5), deep.clone().into()]);

        let (out, summary) = transform_with_summary(&table, "raw_html").unwrap();
        assert_eq!(
            summary,
            BatchSummary {
                rows: 5,
                converted: 2,
                not_text: 2,
                degraded: 1,
            }
        );
        assert_eq!(out.len(), 5);
        assert_eq!(out.cell(4, "id"), Some(&CellValue::Int(5)));
        assert_eq!(
            out.cell(4, "Human Readable raw_html"),
            Some(&CellValue::Text(deep))
        );
    }

    #[test]
    fn test_rerun_overwrites_derived_column() {
        let once = transform(&emails(), "raw_html").unwrap();
        let twice = transform(&once, "raw_html").unwrap();
        assert_eq!(twice.columns().len(), 3);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let table = Table::new(vec!["raw_html".into()]);
        let out = transform(&table, "raw_html").unwrap();
        assert!(out.is_empty());
        assert_eq!(out.columns(), &["raw_html", "Human Readable raw_html"]);
    }

    #[test]
    fn test_process_file_missing_column() {
        let err = process_file(b"id,body\n1,x\n", TableFormat::Csv, "raw_html").unwrap_err();
        assert!(matches!(
            err,
            FileError::Batch(BatchError::ColumnNotFound(ref c)) if c == "raw_html"
        ));
        assert_eq!(err.to_string(), "Column 'raw_html' not found in file");
    }

    #[test]
    fn test_process_file_xlsx() {
        let mut table = Table::new(vec!["raw_html".into()]);
        table.push_row(vec!["<p><i>hi</i> there</p>".into()]);
        let bytes = converter::write_table(&table, TableFormat::Xlsx).unwrap();

        let (out, summary) = process_file(&bytes, TableFormat::Xlsx, "raw_html").unwrap();
        assert_eq!(summary.rows, 1);
        let decoded = converter::read_table(&out, TableFormat::Xlsx).unwrap();
        assert_eq!(
            decoded.cell(0, "Human Readable raw_html"),
            Some(&CellValue::Text("*hi* there".into()))
        );
    }
}
