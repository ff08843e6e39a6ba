//! Domain models for the cleansheet pipeline.
//!
//! - [`Table`] - Header + positional rows, shared by parser, transform and export
//! - [`Cell`] - A single value, `None` when the source cell was blank
//! - [`FileKind`] - Upload type, decided from the file name only
//! - [`CleanWarning`] - Non-fatal findings reported next to a cleaned table

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ReadError;

// =============================================================================
// Output schema
// =============================================================================

/// Column holding the URL on input, and the bare domain on output.
pub const CONTENT_URL: &str = "Content URL";
/// Intermediate column derived from [`CONTENT_URL`].
pub const DOMAIN: &str = "Domain";
pub const DOMAIN_RATING: &str = "Domain Rating";
pub const WEBSITE_TRAFFIC: &str = "Website Traffic";
pub const EMAIL: &str = "Email";
pub const WHATSAPP: &str = "WhatsApp";

/// Final column order of every cleaned table.
pub const OUTPUT_COLUMNS: [&str; 5] = [CONTENT_URL, DOMAIN_RATING, WEBSITE_TRAFFIC, EMAIL, WHATSAPP];

// =============================================================================
// Table
// =============================================================================

/// A cell value. `None` is an absent/blank cell.
pub type Cell = Option<String>;

/// In-memory table: ordered, unique column names and rows aligned to them.
///
/// Every row is exactly as wide as the header; the only ways in are
/// [`Table::push_row`] and [`Table::set_column`], which both keep that.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Empty table with the given header.
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate one column top to bottom.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Cell> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Cell at (row, column name).
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Set a column from a vector of values, replacing it if the name exists.
    ///
    /// `values` is padded with absent cells, or truncated, to the row count.
    pub fn set_column(&mut self, name: &str, mut values: Vec<Cell>) {
        values.resize(self.rows.len(), None);
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

    /// Rename a column in place. Returns false when `from` does not exist.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(idx) => {
                self.columns[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// New table with the named columns, in the given order.
    /// Names that do not exist are skipped.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Table {
        let picked: Vec<(usize, &str)> = names
            .iter()
            .filter_map(|n| self.column_index(n.as_ref()).map(|i| (i, n.as_ref())))
            .collect();

        Table {
            columns: picked.iter().map(|(_, n)| n.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| picked.iter().map(|(i, _)| row[*i].clone()).collect())
                .collect(),
        }
    }

    /// Rows as JSON objects keyed by column name (absent cells become `null`).
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let obj: Map<String, Value> = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(c, v)| (c.clone(), v.clone().map_or(Value::Null, Value::String)))
                    .collect();
                Value::Object(obj)
            })
            .collect()
    }
}

// =============================================================================
// File kind
// =============================================================================

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Csv,
    Xlsx,
}

impl FileKind {
    /// Decide the kind from the file name suffix. Anything other than
    /// `.csv` or `.xlsx` is rejected.
    pub fn from_file_name(name: &str) -> Result<Self, ReadError> {
        if name.ends_with(".csv") {
            Ok(Self::Csv)
        } else if name.ends_with(".xlsx") {
            Ok(Self::Xlsx)
        } else {
            Err(ReadError::UnsupportedFileType(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Warnings
// =============================================================================

/// Non-fatal findings. Processing continues after any of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CleanWarning {
    /// Some key columns were missing; the output holds whatever subset exists.
    PartialColumns { missing: Vec<String> },
}

impl std::fmt::Display for CleanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PartialColumns { missing } => {
                write!(f, "Missing key columns: {}. Continuing with the columns available.", missing.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new(vec!["a".into(), "b".into()]);
        t.push_row(vec![Some("1".into()), Some("2".into())]);
        t.push_row(vec![Some("3".into())]);
        t
    }

    #[test]
    fn test_push_row_pads_short_rows() {
        let t = sample();
        assert_eq!(t.rows()[1], vec![Some("3".to_string()), None]);
        assert_eq!(t.get(1, "b"), None);
    }

    #[test]
    fn test_select_orders_and_skips_missing() {
        let t = sample().select(&["b", "zzz", "a"]);
        assert_eq!(t.columns(), vec!["b", "a"]);
        assert_eq!(t.rows()[0], vec![Some("2".to_string()), Some("1".to_string())]);
    }

    #[test]
    fn test_set_column_adds_and_replaces() {
        let mut t = sample();
        t.set_column("c", vec![Some("x".into()), None]);
        assert_eq!(t.columns(), vec!["a", "b", "c"]);
        t.set_column("a", vec![None, Some("y".into())]);
        assert_eq!(t.get(0, "a"), None);
        assert_eq!(t.get(1, "a"), Some("y"));
    }

    #[test]
    fn test_set_column_with_wrong_length_stays_aligned() {
        let mut t = sample();
        t.set_column("c", vec![Some("x".into())]);
        t.set_column("a", vec![Some("p".into()), Some("q".into()), Some("r".into())]);

        assert!(t.rows().iter().all(|row| row.len() == t.columns().len()));
        assert_eq!(t.get(1, "c"), None);
        assert_eq!(t.get(1, "a"), Some("q"));
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.column("c").unwrap().count(), 2);
    }

    #[test]
    fn test_rename_column() {
        let mut t = sample();
        assert!(t.rename_column("a", "z"));
        assert!(!t.rename_column("a", "q"));
        assert_eq!(t.columns(), vec!["z", "b"]);
    }

    #[test]
    fn test_to_records_nulls() {
        let records = sample().to_records();
        assert_eq!(records[0]["a"], "1");
        assert!(records[1]["b"].is_null());
    }

    #[test]
    fn test_file_kind_from_name() {
        assert_eq!(FileKind::from_file_name("links.csv").unwrap(), FileKind::Csv);
        assert_eq!(FileKind::from_file_name("links.xlsx").unwrap(), FileKind::Xlsx);
        assert!(matches!(
            FileKind::from_file_name("links.xls"),
            Err(ReadError::UnsupportedFileType(_))
        ));
        assert!(FileKind::from_file_name("links.csv.txt").is_err());
    }

    #[test]
    fn test_partial_columns_warning_message() {
        let w = CleanWarning::PartialColumns { missing: vec![WEBSITE_TRAFFIC.into()] };
        assert!(w.to_string().contains("Website Traffic"));
    }
}
