//! Validation findings, grouped findings, and summary statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One detected rule violation at a specific row/column.
///
/// Row numbers match the source spreadsheet (1-based, header row included).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Display name of the sheet the finding belongs to; stamped by the
    /// workbook runner, absent for single-sheet validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    pub row: usize,
    pub column: String,
    pub rule_id: String,
    pub message: String,
    pub actual_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Original natural-language rule text, for audit.
    pub source_rule: String,
}

/// Findings collapsed by (sheet, column, rule_id, message).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingGroup {
    pub sheet: String,
    pub column: String,
    pub rule_id: String,
    pub message: String,
    /// Affected row numbers, sorted ascending.
    pub affected_rows: Vec<usize>,
    pub count: usize,
    /// Up to 3 deduplicated sample values in first-seen order.
    pub sample_values: Vec<Option<String>>,
    pub expected: Option<String>,
    pub source_rule: String,
}

/// Per-run validation statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub error_rows: usize,
    pub total_errors: usize,
    pub rules_applied: usize,
    pub timestamp: DateTime<Utc>,
}
