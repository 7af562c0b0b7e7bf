//! Ingestion of tabular content from CSV files.
//!
//! A "workbook" here is a directory of CSV files, one per sheet, with the
//! file stem as the sheet display name; a single CSV file is a one-sheet
//! workbook. Dataset sheets carry one header row of column names; rule-source
//! sheets are loaded as raw grids because their header convention belongs to
//! the rule extractor.

mod csv_sheet;
mod error;

pub use csv_sheet::{load_dataset, load_raw_workbook, read_data_sheet, read_raw_sheet};
pub use error::{IngestError, Result};
