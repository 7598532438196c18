use crate::domain::model::Record;
use crate::utils::error::{IngestError, Result};
use std::borrow::Cow;
use std::collections::HashSet;

/// 欄位名稱正規化：去除空白並轉小寫
pub fn normalize_column(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderSource {
    /// The first row of the input named the columns.
    #[default]
    Declared,
    /// Columns were named from the positional layout for the input width.
    Positional,
}

/// Parsed tabular input: ordered rows, every row as wide as `columns`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RectangularGrid {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    header: HeaderSource,
}

impl RectangularGrid {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>, header: HeaderSource) -> Result<Self> {
        let width = columns.len();
        if let Some(pos) = rows.iter().position(|row| row.len() != width) {
            return Err(IngestError::FormatError {
                message: format!(
                    "row {} has {} fields, expected {}",
                    pos + 1,
                    rows[pos].len(),
                    width
                ),
            });
        }

        Ok(Self {
            columns: columns.iter().map(|c| normalize_column(c)).collect(),
            rows,
            header,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn header_source(&self) -> HeaderSource {
        self.header
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        let column = normalize_column(column);
        self.columns.iter().position(|c| *c == column)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| r[index].as_str())
    }

    /// 以 (欄位, 值) 的順序走訪一列
    pub fn row(&self, row: usize) -> Option<impl Iterator<Item = (&str, &str)>> {
        let cells = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .map(String::as_str)
                .zip(cells.iter().map(String::as_str)),
        )
    }
}

/// A single raw cell as seen by the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue<'a> {
    Blank,
    Text(Cow<'a, str>),
    /// A JSON value that has no tabular meaning (bool, array, object).
    Unsupported(&'static str),
}

/// Row-oriented access shared by CSV grids and JSON record batches.
pub trait TabularSource {
    /// Normalized column names, in first-seen order.
    fn column_names(&self) -> Vec<String>;

    fn row_count(&self) -> usize;

    /// `column` must already be normalized.
    fn cell(&self, row: usize, column: &str) -> CellValue<'_>;
}

impl TabularSource for RectangularGrid {
    fn column_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn cell(&self, row: usize, column: &str) -> CellValue<'_> {
        match self.get(row, column) {
            Some(value) if !value.trim().is_empty() => CellValue::Text(Cow::Borrowed(value)),
            _ => CellValue::Blank,
        }
    }
}

impl TabularSource for [Record] {
    fn column_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for record in self {
            // HashMap 沒有順序，排序後才能得到穩定的欄位清單
            let mut keys: Vec<String> = record.data.keys().map(|k| normalize_column(k)).collect();
            keys.sort();
            for key in keys {
                if seen.insert(key.clone()) {
                    names.push(key);
                }
            }
        }
        names
    }

    fn row_count(&self) -> usize {
        self.len()
    }

    fn cell(&self, row: usize, column: &str) -> CellValue<'_> {
        let Some(record) = self.get(row) else {
            return CellValue::Blank;
        };
        let value = record
            .data
            .iter()
            .find(|(key, _)| normalize_column(key) == column)
            .map(|(_, value)| value);

        match value {
            None | Some(serde_json::Value::Null) => CellValue::Blank,
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => CellValue::Blank,
            Some(serde_json::Value::String(s)) => CellValue::Text(Cow::Borrowed(s)),
            Some(serde_json::Value::Number(n)) => CellValue::Text(Cow::Owned(n.to_string())),
            Some(serde_json::Value::Bool(_)) => CellValue::Unsupported("boolean"),
            Some(serde_json::Value::Array(_)) => CellValue::Unsupported("array"),
            Some(serde_json::Value::Object(_)) => CellValue::Unsupported("object"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        Record::from_json(value).unwrap()
    }

    #[test]
    fn test_grid_rejects_ragged_rows() {
        let result = RectangularGrid::new(
            vec!["id".to_string(), "name".to_string()],
            vec![vec!["1".to_string()]],
            HeaderSource::Positional,
        );
        assert!(matches!(result, Err(IngestError::FormatError { .. })));
    }

    #[test]
    fn test_grid_cell_lookup_is_case_insensitive() {
        let grid = RectangularGrid::new(
            vec![" Name ".to_string()],
            vec![vec!["Sales".to_string()], vec!["   ".to_string()]],
            HeaderSource::Declared,
        )
        .unwrap();

        assert_eq!(grid.columns(), &["name".to_string()]);
        assert_eq!(grid.get(0, "NAME"), Some("Sales"));
        assert_eq!(grid.cell(0, "name"), CellValue::Text(Cow::Borrowed("Sales")));
        assert_eq!(grid.cell(1, "name"), CellValue::Blank);
        assert_eq!(grid.cell(0, "missing"), CellValue::Blank);

        let pairs: Vec<_> = grid.row(0).unwrap().collect();
        assert_eq!(pairs, vec![("name", "Sales")]);
    }

    #[test]
    fn test_records_union_columns() {
        let records = vec![
            record(json!({"name": "Engineer"})),
            record(json!({"Department_ID": 2, "name": "Manager"})),
        ];
        let columns = records.as_slice().column_names();
        assert_eq!(columns, vec!["name".to_string(), "department_id".to_string()]);

        assert_eq!(records.as_slice().cell(0, "department_id"), CellValue::Blank);
        assert_eq!(
            records.as_slice().cell(1, "department_id"),
            CellValue::Text(Cow::Owned("2".to_string()))
        );
    }

    #[test]
    fn test_records_non_scalar_cells() {
        let records = vec![record(json!({"name": ["a"], "flag": true, "empty": null}))];
        assert_eq!(records.as_slice().cell(0, "name"), CellValue::Unsupported("array"));
        assert_eq!(records.as_slice().cell(0, "flag"), CellValue::Unsupported("boolean"));
        assert_eq!(records.as_slice().cell(0, "empty"), CellValue::Blank);
    }
}
