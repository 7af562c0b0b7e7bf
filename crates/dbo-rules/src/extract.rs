//! Rule text extraction from a rule-source workbook.
//!
//! The rule source follows a two-header-row, seven-column convention:
//! index, sheet name, column letter, field name, rule text, condition, note.
//! A previously exported file additionally carries interpretation columns;
//! those are located by header name and re-attached as prefilled
//! interpretations so the rules need not be interpreted again.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use dbo_match::{canonical_name, normalize_name};
use dbo_model::{Params, PrefilledInterpretation, RawRuleRecord, RawSheet, RuleType};

use crate::error::ExtractError;
use crate::split::SplitPolicy;

/// A run of this many fully-blank rows ends a sheet scan. Defends against
/// spreadsheet metadata that overstates the real row count.
const BLANK_ROW_RUN_LIMIT: usize = 5;

/// Sheets whose canonical name matches one of these hold file metadata, not
/// rules.
const METADATA_SHEET_NAMES: &[&str] = &["fileinfo", "metadata"];

/// Markers in the first header row that identify a re-uploaded export.
const REUPLOAD_MARKERS: &[&str] = &["AI Rule ID", "AI Rule Type", "AI Parameters (JSON)"];

/// Condition-cell markers that take a row out of scope.
const NOT_APPLICABLE_MARKERS: &[&str] = &["n/a", "not applicable"];

/// Everything extraction learned from one rule source.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<RawRuleRecord>,
    /// Raw rule rows per field name (before composite splitting).
    pub field_rule_counts: BTreeMap<String, usize>,
    /// Non-blank rows actually scanned.
    pub total_raw_rows: usize,
    /// Row count the source claims to contain; can overstate reality.
    pub reported_rows: usize,
}

#[derive(Debug)]
struct ColumnLayout {
    sheet: usize,
    column: usize,
    field: usize,
    rule: usize,
    condition: usize,
    note: usize,
    ai_rule_type: Option<usize>,
    ai_parameters: Option<usize>,
    ai_rule_id: Option<usize>,
    ai_summary: Option<usize>,
    ai_error: Option<usize>,
    is_reupload: bool,
}

impl ColumnLayout {
    fn standard() -> Self {
        Self {
            sheet: 1,
            column: 2,
            field: 3,
            rule: 4,
            condition: 5,
            note: 6,
            ai_rule_type: None,
            ai_parameters: None,
            ai_rule_id: None,
            ai_summary: None,
            ai_error: None,
            is_reupload: false,
        }
    }

    /// Detect the layout from the first header row. A re-uploaded export is
    /// recognized by its interpretation columns, and its columns are located
    /// by name because the exporter may have reordered them.
    fn detect(header: &[String]) -> Self {
        let names: BTreeMap<String, usize> = header
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.trim().is_empty())
            .map(|(idx, cell)| (normalize_name(cell), idx))
            .collect();

        let is_reupload = REUPLOAD_MARKERS
            .iter()
            .any(|marker| names.contains_key(*marker));
        if !is_reupload {
            return Self::standard();
        }

        let default = Self::standard();
        Self {
            sheet: names.get("Sheet").copied().unwrap_or(default.sheet),
            column: names.get("Column").copied().unwrap_or(default.column),
            field: names.get("Field").copied().unwrap_or(default.field),
            rule: names.get("Rule").copied().unwrap_or(default.rule),
            condition: names.get("Condition").copied().unwrap_or(default.condition),
            note: names.get("Note").copied().unwrap_or(default.note),
            ai_rule_type: names.get("AI Rule Type").copied(),
            ai_parameters: names.get("AI Parameters (JSON)").copied(),
            ai_rule_id: names.get("AI Rule ID").copied(),
            ai_summary: names.get("AI Summary").copied(),
            ai_error: names.get("AI Error Message").copied(),
            is_reupload: true,
        }
    }
}

fn is_metadata_sheet(name: &str) -> bool {
    if name.starts_with('_') {
        return true;
    }
    let canonical = canonical_name(name).to_lowercase();
    METADATA_SHEET_NAMES.iter().any(|meta| canonical == *meta)
}

fn is_not_applicable(condition: &str) -> bool {
    let lower = condition.to_lowercase();
    NOT_APPLICABLE_MARKERS.iter().any(|m| lower.contains(m))
}

fn cell<'a>(row: &'a [String], idx: usize) -> &'a str {
    row.get(idx).map(|s| s.trim()).unwrap_or("")
}

fn parse_prefilled(row: &[String], layout: &ColumnLayout, sheet: &str, row_idx: usize) -> Option<PrefilledInterpretation> {
    let rule_type_cell = layout.ai_rule_type.map(|idx| cell(row, idx)).unwrap_or("");
    let rule_id_cell = layout.ai_rule_id.map(|idx| cell(row, idx)).unwrap_or("");
    if rule_type_cell.is_empty() || rule_id_cell.is_empty() {
        return None;
    }
    let rule_type: RuleType = match rule_type_cell.parse() {
        Ok(rule_type) => rule_type,
        Err(error) => {
            warn!(sheet, row = row_idx, %error, "dropping prefilled interpretation");
            return None;
        }
    };
    let parameters = layout
        .ai_parameters
        .map(|idx| cell(row, idx))
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| match serde_json::from_str::<Params>(raw) {
            Ok(params) => Some(params),
            Err(error) => {
                warn!(sheet, row = row_idx, %error, "ignoring malformed prefilled parameters");
                None
            }
        })
        .unwrap_or_default();
    let summary = layout
        .ai_summary
        .map(|idx| cell(row, idx))
        .filter(|s| !s.is_empty())
        .map(String::from);
    let error_message = layout
        .ai_error
        .map(|idx| cell(row, idx))
        .filter(|s| !s.is_empty())
        .map(String::from);
    Some(PrefilledInterpretation {
        rule_id: rule_id_cell.to_string(),
        rule_type,
        parameters,
        summary,
        error_message,
    })
}

/// Extract raw rule records from a rule-source workbook.
pub fn extract_rules(sheets: &[RawSheet], policy: &SplitPolicy) -> Result<Extraction, ExtractError> {
    let mut extraction = Extraction::default();
    let mut rule_sheets = 0usize;

    for sheet in sheets {
        if is_metadata_sheet(&sheet.name) {
            debug!(sheet = %sheet.name, "skipping metadata sheet");
            continue;
        }
        rule_sheets += 1;
        extraction.reported_rows += sheet.reported_rows;

        let layout = sheet
            .rows
            .first()
            .map(|header| ColumnLayout::detect(header))
            .unwrap_or_else(ColumnLayout::standard);
        if layout.is_reupload {
            info!(sheet = %sheet.name, "detected re-uploaded rule export; reading columns by name");
        }

        scan_sheet(sheet, &layout, policy, &mut extraction);
    }

    if rule_sheets == 0 {
        return Err(ExtractError::NoRuleSheets);
    }

    info!(
        records = extraction.records.len(),
        raw_rows = extraction.total_raw_rows,
        reported_rows = extraction.reported_rows,
        "extracted rule records"
    );
    Ok(extraction)
}

fn scan_sheet(
    sheet: &RawSheet,
    layout: &ColumnLayout,
    policy: &SplitPolicy,
    extraction: &mut Extraction,
) {
    let mut consecutive_blank = 0usize;
    // Forward-fill for the sheet-name column: blank cells inherit the
    // nearest value above, emulating merged cells.
    let mut last_sheet_ref: Option<String> = None;

    // Data rows begin after the two header rows.
    for (offset, row) in sheet.rows.iter().skip(2).enumerate() {
        let row_idx = offset + 3; // 1-based spreadsheet row number

        if row.iter().all(|value| value.trim().is_empty()) {
            consecutive_blank += 1;
            if consecutive_blank >= BLANK_ROW_RUN_LIMIT {
                debug!(sheet = %sheet.name, row = row_idx, "blank run ends sheet scan");
                break;
            }
            continue;
        }
        consecutive_blank = 0;
        extraction.total_raw_rows += 1;

        let sheet_cell = cell(row, layout.sheet);
        if !sheet_cell.is_empty() {
            last_sheet_ref = Some(sheet_cell.to_string());
        }
        let sheet_ref = last_sheet_ref.clone().unwrap_or_else(|| sheet.name.clone());

        let condition = cell(row, layout.condition).to_string();
        if is_not_applicable(&condition) {
            continue;
        }

        let field_cell = cell(row, layout.field);
        let field_name = if field_cell.is_empty() {
            "(unnamed field)".to_string()
        } else {
            field_cell.to_string()
        };
        let column_ref = cell(row, layout.column).to_string();
        let note = cell(row, layout.note).to_string();

        let rule_cell = cell(row, layout.rule);
        let rule_text = if !rule_cell.is_empty() {
            rule_cell.to_string()
        } else if !condition.is_empty() {
            format!("Condition: {condition}")
        } else {
            format!("Default check ({field_name})")
        };

        *extraction.field_rule_counts.entry(field_name.clone()).or_default() += 1;

        let prefilled = if layout.is_reupload {
            parse_prefilled(row, layout, &sheet.name, row_idx)
        } else {
            None
        };

        let display_sheet = normalize_name(&sheet_ref);
        let canonical_sheet = canonical_name(&sheet_ref);

        let make_record = |row_ref: String, rule_text: String| RawRuleRecord {
            sheet_ref: sheet_ref.clone(),
            canonical_sheet: canonical_sheet.clone(),
            display_sheet: display_sheet.clone(),
            row_ref,
            column_ref: column_ref.clone(),
            field_name: field_name.clone(),
            rule_text,
            condition: condition.clone(),
            note: note.clone(),
            prefilled: prefilled.clone(),
        };

        if policy.should_split(&rule_text) {
            for (sub_idx, clause) in policy.split(&rule_text).into_iter().enumerate() {
                extraction
                    .records
                    .push(make_record(format!("{row_idx}.{}", sub_idx + 1), clause));
            }
        } else {
            extraction.records.push(make_record(row_idx.to_string(), rule_text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    fn headers() -> Vec<Vec<String>> {
        vec![
            row(&["No", "Sheet", "Column", "Field", "Rule", "Condition", "Note"]),
            row(&["", "", "", "", "", "", ""]),
        ]
    }

    fn rule_sheet(mut data: Vec<Vec<String>>) -> RawSheet {
        let mut rows = headers();
        rows.append(&mut data);
        RawSheet::new("rules", rows)
    }

    #[test]
    fn forward_fills_sheet_column() {
        let sheet = rule_sheet(vec![
            row(&["1", "Roster 2024", "B", "employee id", "blank, duplicate not allowed", "", ""]),
            row(&["2", "", "C", "hire date", "YYYYMMDD", "", ""]),
        ]);
        let extraction = extract_rules(&[sheet], &SplitPolicy::default()).expect("extract");
        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.records[1].display_sheet, "Roster 2024");
        assert_eq!(extraction.records[1].canonical_sheet, "Roster2024");
    }

    #[test]
    fn splits_composite_rules_with_sub_row_refs() {
        let sheet = rule_sheet(vec![row(&[
            "1",
            "Roster",
            "D",
            "base date",
            "YYYYMMDD, start_date<=hire_date",
            "",
            "",
        ])]);
        let extraction = extract_rules(&[sheet], &SplitPolicy::default()).expect("extract");
        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.records[0].row_ref, "3.1");
        assert_eq!(extraction.records[0].rule_text, "YYYYMMDD");
        assert_eq!(extraction.records[1].row_ref, "3.2");
        assert_eq!(extraction.records[1].rule_text, "start_date<=hire_date");
    }

    #[test]
    fn drops_not_applicable_rows_but_counts_them() {
        let sheet = rule_sheet(vec![
            row(&["1", "Roster", "B", "employee id", "blank", "N/A", ""]),
            row(&["2", "", "C", "hire date", "YYYYMMDD", "ok", ""]),
        ]);
        let extraction = extract_rules(&[sheet], &SplitPolicy::default()).expect("extract");
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.total_raw_rows, 2);
    }

    #[test]
    fn blank_run_terminates_sheet_scan() {
        let mut data = vec![row(&["1", "Roster", "B", "employee id", "blank", "", ""])];
        for _ in 0..5 {
            data.push(row(&["", "", "", "", "", "", ""]));
        }
        data.push(row(&["9", "Roster", "C", "ghost", "required", "", ""]));
        let extraction =
            extract_rules(&[rule_sheet(data)], &SplitPolicy::default()).expect("extract");
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.total_raw_rows, 1);
    }

    #[test]
    fn metadata_sheets_are_skipped_and_all_metadata_is_an_error() {
        let meta = RawSheet::new("File Info", headers());
        let underscore = RawSheet::new("_internal", headers());
        assert!(matches!(
            extract_rules(&[meta.clone(), underscore], &SplitPolicy::default()),
            Err(ExtractError::NoRuleSheets)
        ));
        let sheet = rule_sheet(vec![row(&["1", "Roster", "B", "id", "required text", "", ""])]);
        let extraction = extract_rules(&[meta, sheet], &SplitPolicy::default()).expect("extract");
        assert_eq!(extraction.records.len(), 1);
    }

    #[test]
    fn reupload_header_attaches_prefilled_interpretation() {
        let mut rows = vec![
            row(&[
                "No", "Sheet", "Column", "Field", "Rule", "Condition", "Note",
                "AI Rule ID", "AI Rule Type", "AI Parameters (JSON)", "AI Summary",
            ]),
            row(&["", "", "", "", "", "", "", "", "", "", ""]),
        ];
        rows.push(row(&[
            "1",
            "Roster",
            "C",
            "hire date",
            "YYYYMMDD",
            "",
            "",
            "RULE_007",
            "format",
            r#"{"format":"YYYYMMDD","regex":"^[0-9]{8}$"}"#,
            "date format check",
        ]));
        let sheet = RawSheet::new("rules", rows);
        let extraction = extract_rules(&[sheet], &SplitPolicy::default()).expect("extract");
        let prefilled = extraction.records[0].prefilled.as_ref().expect("prefilled");
        assert_eq!(prefilled.rule_id, "RULE_007");
        assert_eq!(prefilled.rule_type, RuleType::Format);
        assert_eq!(
            prefilled.parameters.get("format").and_then(|v| v.as_str()),
            Some("YYYYMMDD")
        );
    }

    #[test]
    fn unknown_prefilled_rule_type_is_dropped() {
        let rows = vec![
            row(&["No", "Sheet", "Column", "Field", "Rule", "Condition", "Note", "AI Rule ID", "AI Rule Type"]),
            row(&[]),
            row(&["1", "Roster", "C", "hire date", "YYYYMMDD", "", "", "RULE_001", "uniqueness"]),
        ];
        let sheet = RawSheet::new("rules", rows);
        let extraction = extract_rules(&[sheet], &SplitPolicy::default()).expect("extract");
        assert!(extraction.records[0].prefilled.is_none());
    }
}
