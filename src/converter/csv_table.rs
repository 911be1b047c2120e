use csv::{ReaderBuilder, WriterBuilder};
use std::io::Cursor;

use crate::error::TableError;
use crate::table::{CellValue, Table};

/// Configuration for csv decoding and encoding
pub struct CsvConfig {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Whether columns of numbers are decoded as numbers instead of text
    pub infer_numbers: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            infer_numbers: true,
        }
    }
}

/// Decode csv bytes into a table; the first record is the header.
pub fn read(bytes: &[u8], config: Option<CsvConfig>) -> Result<Table, TableError> {
    let config = config.unwrap_or_default();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(config.delimiter)
        .from_reader(Cursor::new(bytes));

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() {
        return Err(TableError::MissingHeader);
    }

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        raw_rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|idx| {
            if config.infer_numbers {
                infer_column(raw_rows.iter().filter_map(|row| row.get(idx)))
            } else {
                ColumnKind::Text
            }
        })
        .collect();

    let mut table = Table::new(headers);
    for row in raw_rows {
        let cells = row
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| {
                let kind = kinds.get(idx).copied().unwrap_or(ColumnKind::Text);
                decode_cell(raw, kind)
            })
            .collect();
        table.push_row(cells);
    }

    Ok(table)
}

/// Encode a table as csv bytes, header first.
pub fn write(table: &Table, config: Option<CsvConfig>) -> Result<Vec<u8>, TableError> {
    let config = config.unwrap_or_default();

    let mut output = Vec::new();
    {
        let mut writer = WriterBuilder::new()
            .delimiter(config.delimiter)
            .from_writer(&mut output);

        writer.write_record(table.columns())?;
        for row in table.rows() {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }

        writer.flush()?;
    } // writer is dropped here, releasing the borrow on output

    Ok(output)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Text,
}

// A column is numeric only when every non-empty cell parses; mixed columns
// stay text so html cells are never reinterpreted.
fn infer_column<'a>(cells: impl Iterator<Item = &'a String>) -> ColumnKind {
    let mut kind = ColumnKind::Int;
    let mut seen = false;

    for cell in cells.map(|c| c.trim()).filter(|c| !c.is_empty()) {
        seen = true;
        if kind == ColumnKind::Int && cell.parse::<i64>().is_err() {
            kind = ColumnKind::Float;
        }
        if kind == ColumnKind::Float && parse_float(cell).is_none() {
            return ColumnKind::Text;
        }
    }

    if seen { kind } else { ColumnKind::Text }
}

fn parse_float(cell: &str) -> Option<f64> {
    // rejects "inf", "nan" and friends
    if !cell.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    cell.parse::<f64>().ok().filter(|x| x.is_finite())
}

fn decode_cell(raw: String, kind: ColumnKind) -> CellValue {
    if raw.is_empty() {
        return CellValue::Empty;
    }
    let trimmed = raw.trim();
    match kind {
        ColumnKind::Int => trimmed
            .parse()
            .map(CellValue::Int)
            .unwrap_or(CellValue::Text(raw)),
        ColumnKind::Float => parse_float(trimmed)
            .map(CellValue::Float)
            .unwrap_or(CellValue::Text(raw)),
        ColumnKind::Text => CellValue::Text(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CsvConfig::default();
        assert_eq!(config.delimiter, b',');
        assert!(config.infer_numbers);
    }

    #[test]
    fn test_read_types_columns() {
        let csv = "id,score,raw_html\n1,2.5,<p>a</p>\n2,,\"<b>x</b>, y\"\n";
        let table = read(csv.as_bytes(), None).unwrap();

        assert_eq!(table.columns(), &["id", "score", "raw_html"]);
        assert_eq!(table.cell(0, "id"), Some(&CellValue::Int(1)));
        assert_eq!(table.cell(0, "score"), Some(&CellValue::Float(2.5)));
        assert_eq!(table.cell(1, "score"), Some(&CellValue::Empty));
        assert_eq!(
            table.cell(1, "raw_html"),
            Some(&CellValue::Text("<b>x</b>, y".into()))
        );
    }

    #[test]
    fn test_mixed_column_stays_text() {
        let csv = "raw_html\n42\n<p>hi</p>\n";
        let table = read(csv.as_bytes(), None).unwrap();
        assert_eq!(table.cell(0, "raw_html"), Some(&CellValue::Text("42".into())));
    }

    #[test]
    fn test_numeric_column_is_not_text() {
        let csv = "raw_html\n42\n7\n";
        let table = read(csv.as_bytes(), None).unwrap();
        assert_eq!(table.cell(0, "raw_html"), Some(&CellValue::Int(42)));
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let csv = "a,b,c\n1\n";
        let table = read(csv.as_bytes(), None).unwrap();
        assert_eq!(table.rows()[0].len(), 3);
        assert_eq!(table.cell(0, "c"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_write_quotes_and_blanks() {
        let mut table = Table::new(vec!["id".into(), "text".into()]);
        table.push_row(vec![CellValue::Int(1), "a, \"b\"".into()]);
        table.push_row(vec![CellValue::Float(3.0), CellValue::Empty]);

        let bytes = write(&table, None).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "id,text\n1,\"a, \"\"b\"\"\"\n3.0,\n"
        );
    }

    #[test]
    fn test_read_write_keeps_multiline_html() {
        let csv = "raw_html\n\"<p>line one</p>\n<p>line two</p>\"\n";
        let table = read(csv.as_bytes(), None).unwrap();
        let bytes = write(&table, None).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), csv);
    }
}
