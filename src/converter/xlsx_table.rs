use calamine::{Data, Reader, Xlsx};
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::TableError;
use crate::table::{CellValue, Table};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Sheet name used when writing a workbook
pub const SHEET_NAME: &str = "Sheet1";

/// Decode the first worksheet of an xlsx workbook; its first row is the header.
pub fn read(data: &[u8]) -> Result<Table, TableError> {
    // xlsx is a zip container; anything else is rejected before parsing
    let kind = infer::get(data);
    match kind.as_ref().map(|k| k.mime_type()) {
        Some(XLSX_MIME) | Some("application/zip") => {}
        _ => return Err(TableError::NotAWorkbook),
    }

    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(data))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(TableError::EmptyWorkbook)?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or(TableError::MissingHeader)?;
    let headers: Vec<String> = header_row.iter().map(|cell| cell.to_string()).collect();

    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(row.iter().map(decode_cell).collect());
    }

    tracing::debug!(sheet = %sheet_name, rows = table.len(), "Decoded worksheet");
    Ok(table)
}

fn decode_cell(cell: &Data) -> CellValue {
    match cell {
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        // xlsx stores every number as a float
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => CellValue::Int(*f as i64),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Empty => CellValue::Empty,
        other => CellValue::Other(other.to_string()),
    }
}

/// Encode a table as a single-sheet xlsx workbook.
pub fn write(table: &Table) -> Result<Vec<u8>, TableError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, String); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", workbook_xml()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/worksheets/sheet1.xml", sheet_xml(table)),
    ];

    for (name, content) in parts {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        SHEET_NAME
    )
}

fn sheet_xml(table: &Table) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    let header = table.columns().iter().map(|c| CellValue::Text(c.clone()));
    push_row(&mut xml, 1, header);
    for (idx, row) in table.rows().iter().enumerate() {
        push_row(&mut xml, idx + 2, row.iter().cloned());
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_row(xml: &mut String, row_number: usize, cells: impl Iterator<Item = CellValue>) {
    xml.push_str(&format!(r#"<row r="{}">"#, row_number));
    for (col, cell) in cells.enumerate() {
        let reference = format!("{}{}", column_letters(col), row_number);
        match cell {
            CellValue::Empty => {}
            CellValue::Int(i) => xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, i)),
            CellValue::Float(f) => {
                xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, f))
            }
            CellValue::Bool(b) => xml.push_str(&format!(
                r#"<c r="{}" t="b"><v>{}</v></c>"#,
                reference,
                u8::from(b)
            )),
            CellValue::Text(s) | CellValue::Other(s) => xml.push_str(&format!(
                r#"<c r="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                reference,
                escape(xml_safe(&s).as_str())
            )),
        }
    }
    xml.push_str("</row>");
}

// XML 1.0 forbids most control characters even when escaped
fn xml_safe(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

/// Zero-based column index to spreadsheet letters: 0 -> A, 26 -> AA.
fn column_letters(mut col: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn test_xml_safe_strips_control_chars() {
        assert_eq!(xml_safe("a\u{0b}b\tc\n"), "ab\tc\n");
    }

    #[test]
    fn test_sheet_xml_escapes_html() {
        let mut table = Table::new(vec!["raw_html".into()]);
        table.push_row(vec!["<p>a & b</p>".into()]);
        let xml = sheet_xml(&table);
        assert!(xml.contains("&lt;p&gt;a &amp; b&lt;/p&gt;"));
        assert!(xml.contains(r#"<c r="A2" t="inlineStr">"#));
    }

    #[test]
    fn test_rejects_non_zip_bytes() {
        let err = read(b"id,raw_html\n1,<p>x</p>\n").unwrap_err();
        assert!(matches!(err, TableError::NotAWorkbook));
    }

    #[test]
    fn test_written_workbook_reads_back() {
        let mut table = Table::new(vec!["id".into(), "raw_html".into(), "flag".into()]);
        table.push_row(vec![
            CellValue::Int(1),
            "<p>Hello <b>World</b></p>".into(),
            CellValue::Bool(true),
        ]);
        table.push_row(vec![CellValue::Int(2), CellValue::Empty, CellValue::Bool(false)]);
        table.push_row(vec![CellValue::Int(3), "plain".into(), CellValue::Empty]);

        let bytes = write(&table).unwrap();
        let decoded = read(&bytes).unwrap();

        assert_eq!(decoded.columns(), table.columns());
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded.cell(0, "id"), Some(&CellValue::Int(1)));
        assert_eq!(
            decoded.cell(0, "raw_html"),
            Some(&CellValue::Text("<p>Hello <b>World</b></p>".into()))
        );
        assert_eq!(decoded.cell(1, "raw_html"), Some(&CellValue::Empty));
        assert_eq!(decoded.cell(1, "flag"), Some(&CellValue::Bool(false)));
        assert_eq!(decoded.cell(2, "raw_html"), Some(&CellValue::Text("plain".into())));
    }
}
