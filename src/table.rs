use std::fmt;

use serde_json::Value;

/// One cell of a decoded table, or the `html` field of an API request.
///
/// Only `Text` is treated as an HTML document; every other variant is a
/// non-string value the normalizer turns into empty output.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Empty,
    Other(String),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) | CellValue::Other(s) => f.write_str(s),
            CellValue::Int(i) => write!(f, "{}", i),
            // whole floats keep their decimal point, as spreadsheets export them
            CellValue::Float(x) if x.fract() == 0.0 && x.abs() < 1e15 => write!(f, "{:.1}", x),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => CellValue::Text(s),
            Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Int(i),
                None => n
                    .as_f64()
                    .map(CellValue::Float)
                    .unwrap_or_else(|| CellValue::Other(n.to_string())),
            },
            Value::Bool(b) => CellValue::Bool(b),
            Value::Null => CellValue::Empty,
            other => CellValue::Other(other.to_string()),
        }
    }
}

/// An ordered set of rows over named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding short rows with `Empty` and dropping cells past
    /// the last column.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &CellValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    pub fn cell(&self, row: usize, name: &str) -> Option<&CellValue> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Sets `name` to `values`, one per row. An existing column of that name is
    /// overwritten in place; otherwise the column is appended.
    pub fn set_column(&mut self, name: &str, values: Vec<CellValue>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Table {
        let mut table = Table::new(vec!["id".into(), "raw_html".into()]);
        table.push_row(vec![CellValue::Int(1), "<p>a</p>".into()]);
        table.push_row(vec![CellValue::Int(2)]);
        table
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = sample();
        assert_eq!(table.cell(1, "raw_html"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_set_column_appends_new_column() {
        let mut table = sample();
        table.set_column("out", vec!["x".into(), "y".into()]);
        assert_eq!(table.columns(), &["id", "raw_html", "out"]);
        assert_eq!(table.cell(1, "out"), Some(&CellValue::from("y")));
    }

    #[test]
    fn test_set_column_overwrites_existing_column() {
        let mut table = sample();
        table.set_column("id", vec![CellValue::Int(7), CellValue::Int(8)]);
        assert_eq!(table.columns().len(), 2);
        assert_eq!(table.cell(0, "id"), Some(&CellValue::Int(7)));
    }

    #[test]
    fn test_json_values_map_to_cells() {
        assert_eq!(CellValue::from(json!("x")), CellValue::Text("x".into()));
        assert_eq!(CellValue::from(json!(42)), CellValue::Int(42));
        assert_eq!(CellValue::from(json!(1.5)), CellValue::Float(1.5));
        assert_eq!(CellValue::from(json!(null)), CellValue::Empty);
        assert_eq!(
            CellValue::from(json!(["a"])),
            CellValue::Other("[\"a\"]".into())
        );
    }

    #[test]
    fn test_display_of_empty_is_blank() {
        assert_eq!(CellValue::Empty.to_string(), "");
        assert_eq!(CellValue::Int(3).to_string(), "3");
        assert_eq!(CellValue::Float(2.0).to_string(), "2.0");
        assert_eq!(CellValue::Float(2.25).to_string(), "2.25");
    }
}
