use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use tracing::debug;

use dbo_match::normalize_name;
use dbo_model::{RawSheet, Sheet};

use crate::error::{IngestError, Result};

fn normalize_cell(raw: &str) -> String {
    raw.trim_matches('\u{feff}').to_string()
}

fn normalize_header(raw: &str) -> String {
    normalize_name(raw.trim_matches('\u{feff}'))
}

fn sheet_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Sheet".to_string())
}

fn read_grid(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        rows.push(record.iter().map(normalize_cell).collect());
    }
    Ok(rows)
}

/// Read one rule-source sheet as an unshaped grid.
///
/// Blank rows are preserved; the extractor's blank-run detection depends on
/// seeing them.
pub fn read_raw_sheet(path: &Path) -> Result<RawSheet> {
    let rows = read_grid(path)?;
    let name = sheet_name_from_path(path);
    debug!(sheet = %name, rows = rows.len(), "read raw sheet");
    Ok(RawSheet::new(name, rows))
}

/// Read one dataset sheet: first row is the header, fully-blank rows are
/// dropped, and every data row is sized to the header width.
pub fn read_data_sheet(path: &Path) -> Result<Sheet> {
    let grid = read_grid(path)?;
    let mut iter = grid.into_iter();
    let header = iter
        .next()
        .ok_or_else(|| IngestError::MissingHeader(path.to_path_buf()))?;
    let columns: Vec<String> = header.iter().map(|cell| normalize_header(cell)).collect();
    let mut sheet = Sheet::new(normalize_name(&sheet_name_from_path(path)), columns);
    for record in iter {
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let mut row = Vec::with_capacity(sheet.columns.len());
        for idx in 0..sheet.columns.len() {
            row.push(record.get(idx).cloned().unwrap_or_default());
        }
        sheet.rows.push(row);
    }
    debug!(sheet = %sheet.display_name, rows = sheet.height(), "read data sheet");
    Ok(sheet)
}

fn csv_paths(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let entries = std::fs::read_dir(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    paths.sort();
    if paths.is_empty() {
        return Err(IngestError::EmptyWorkbook(path.to_path_buf()));
    }
    Ok(paths)
}

/// Load a rule-source workbook: a CSV file or a directory of CSV sheets.
pub fn load_raw_workbook(path: &Path) -> Result<Vec<RawSheet>> {
    csv_paths(path)?.iter().map(|p| read_raw_sheet(p)).collect()
}

/// Load a dataset workbook: a CSV file or a directory of CSV sheets.
pub fn load_dataset(path: &Path) -> Result<Vec<Sheet>> {
    csv_paths(path)?.iter().map(|p| read_data_sheet(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).expect("create csv");
        file.write_all(content.as_bytes()).expect("write csv");
        path
    }

    #[test]
    fn data_sheet_takes_header_and_pads_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_csv(
            dir.path(),
            "Roster 2024.csv",
            "employee id,hire date,salary\nE001,20200101,50000\nE002,20210315\n",
        );
        let sheet = read_data_sheet(&path).expect("read sheet");
        assert_eq!(sheet.display_name, "Roster 2024");
        assert_eq!(sheet.columns, vec!["employee id", "hire date", "salary"]);
        assert_eq!(sheet.height(), 2);
        assert_eq!(sheet.value(1, 2), None);
    }

    #[test]
    fn raw_sheet_preserves_blank_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_csv(dir.path(), "rules.csv", "a,b\n,\nc,d\n");
        let raw = read_raw_sheet(&path).expect("read raw");
        assert_eq!(raw.rows.len(), 3);
        assert!(raw.rows[1].iter().all(String::is_empty));
    }

    #[test]
    fn workbook_directory_loads_sheets_in_name_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_csv(dir.path(), "b.csv", "x\n1\n");
        write_csv(dir.path(), "a.csv", "y\n2\n");
        let sheets = load_dataset(dir.path()).expect("load dataset");
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].display_name, "a");
        assert_eq!(sheets[1].display_name, "b");
    }

    #[test]
    fn empty_directory_is_a_structural_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            load_dataset(dir.path()),
            Err(IngestError::EmptyWorkbook(_))
        ));
    }
}
