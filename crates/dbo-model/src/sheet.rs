//! In-memory tabular sheet types.
//!
//! A dataset `Sheet` has one header row of ordered named columns; cells are
//! plain strings and an empty or whitespace-only cell is a missing value.
//! A `RawSheet` is an unshaped grid used for rule-source extraction, where
//! the header convention belongs to the extractor rather than the loader.

use serde::{Deserialize, Serialize};

/// True when a cell holds no usable value.
pub fn is_missing(value: &str) -> bool {
    value.trim().is_empty()
}

/// One dataset sheet: ordered named columns and rows of scalar values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sheet {
    /// Human-readable sheet name (normalized display form).
    pub display_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(display_name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            display_name: display_name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Exact-name column lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col == name)
    }

    /// Cell value at (row, column index); `None` when missing or out of range.
    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        let cell = self.rows.get(row)?.get(col)?;
        if is_missing(cell) { None } else { Some(cell.as_str()) }
    }

    /// Raw cell content including empty strings, for reporting actual values.
    pub fn raw_value(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

/// An unshaped grid of cells, as read from one rule-source sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
    /// Row count the source claims to contain (header rows excluded).
    /// Spreadsheet metadata can overstate the actual data rows, so this is
    /// kept separate from the scanned row count.
    pub reported_rows: usize,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        let reported_rows = rows.len().saturating_sub(2);
        Self {
            name: name.into(),
            rows,
            reported_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cells_are_none() {
        let mut sheet = Sheet::new("Roster", vec!["id".to_string(), "name".to_string()]);
        sheet.rows.push(vec!["E001".to_string(), "   ".to_string()]);
        assert_eq!(sheet.value(0, 0), Some("E001"));
        assert_eq!(sheet.value(0, 1), None);
        assert_eq!(sheet.raw_value(0, 1), Some("   "));
        assert_eq!(sheet.value(1, 0), None);
    }

    #[test]
    fn raw_sheet_reports_rows_minus_headers() {
        let raw = RawSheet::new("rules", vec![vec![String::new()]; 6]);
        assert_eq!(raw.reported_rows, 4);
    }
}
