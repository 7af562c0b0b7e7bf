//! Deterministic execution of interpreted rules against dataset sheets.
//!
//! The engine applies each rule descriptor to the sheet it targets and emits
//! findings with spreadsheet-style row numbers. Everything here is pure with
//! respect to its inputs except summary timestamps; the same sheets and
//! descriptors always produce the same findings in the same order.

pub mod aggregate;
pub mod dates;
pub mod engine;
pub mod runner;

pub use aggregate::group_findings;
pub use dates::matches_date_format;
pub use engine::{Engine, SheetRun};
pub use runner::{MatchReport, SheetReport, ValidationStatus, WorkbookReport, validate_workbook};
