//! Workbook-level orchestration.
//!
//! Rules carry the name of the sheet they were written against; datasets
//! carry the names their sheets actually have. Pairing goes through the
//! whitespace-insensitive canonical form, so "전체  명부" and "전체 명부"
//! validate the same sheet. Rule batches whose sheet has no dataset
//! counterpart are reported, never silently dropped.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use dbo_match::canonical_name;
use dbo_model::{Finding, FindingGroup, RuleDescriptor, Sheet, ValidationSummary};

use crate::aggregate::group_findings;
use crate::engine::Engine;

/// Overall verdict for one validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Pass,
    Fail,
}

/// Per-sheet statistics.
#[derive(Debug, Clone, Serialize)]
pub struct SheetReport {
    pub display_name: String,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub error_rows: usize,
    pub total_errors: usize,
    pub rules_applied: usize,
}

/// How rule batches paired with dataset sheets, for diagnostics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchReport {
    /// Sheet names the rules referenced, in first-seen order.
    pub rule_sheets: Vec<String>,
    /// Sheet names present in the dataset.
    pub data_sheets: Vec<String>,
    /// Rule sheet names that paired with a dataset sheet.
    pub matched_sheets: Vec<String>,
    /// Rule sheet names with no dataset counterpart.
    pub unmatched_rule_sheets: Vec<String>,
    /// Rule fields that resolved to no column, deduplicated, in rule order.
    pub unmatched_fields: Vec<String>,
}

/// Full outcome of validating a dataset against an interpreted rule set.
#[derive(Debug, Clone, Serialize)]
pub struct WorkbookReport {
    pub status: ValidationStatus,
    pub summary: ValidationSummary,
    pub sheets: Vec<SheetReport>,
    pub findings: Vec<Finding>,
    pub groups: Vec<FindingGroup>,
    pub matching: MatchReport,
}

fn sheet_key(name: &str) -> String {
    canonical_name(name).to_lowercase()
}

/// Validate every dataset sheet against the rule batch written for it.
pub fn validate_workbook(
    engine: &Engine,
    sheets: &[Sheet],
    descriptors: &[RuleDescriptor],
) -> WorkbookReport {
    // Batch descriptors by target sheet, preserving first-seen order.
    let mut batch_order: Vec<String> = Vec::new();
    let mut batches: std::collections::HashMap<String, Vec<&RuleDescriptor>> =
        std::collections::HashMap::new();
    for descriptor in descriptors {
        let key = sheet_key(&descriptor.provenance.sheet_name);
        if !batches.contains_key(&key) {
            batch_order.push(key.clone());
        }
        batches.entry(key).or_default().push(descriptor);
    }

    let mut matching = MatchReport {
        data_sheets: sheets.iter().map(|s| s.display_name.clone()).collect(),
        ..MatchReport::default()
    };

    let mut findings: Vec<Finding> = Vec::new();
    let mut reports: Vec<SheetReport> = Vec::new();
    let mut error_rows = 0;
    let mut total_rows = 0;
    let mut valid_rows = 0;
    let mut rules_applied = 0;

    for key in &batch_order {
        let batch = &batches[key];
        let rule_sheet = batch[0].provenance.sheet_name.clone();
        matching.rule_sheets.push(rule_sheet.clone());

        let Some(sheet) = sheets.iter().find(|s| sheet_key(&s.display_name) == *key) else {
            warn!(sheet = %rule_sheet, rules = batch.len(), "no dataset sheet for rule batch");
            matching.unmatched_rule_sheets.push(rule_sheet);
            continue;
        };
        matching.matched_sheets.push(rule_sheet);

        let rules: Vec<RuleDescriptor> = batch.iter().map(|d| (*d).clone()).collect();
        let run = engine.run(sheet, &rules);
        let summary = run.summary(sheet.height());

        for field in run.unmatched_fields {
            if !matching.unmatched_fields.contains(&field) {
                matching.unmatched_fields.push(field);
            }
        }
        reports.push(SheetReport {
            display_name: sheet.display_name.clone(),
            total_rows: summary.total_rows,
            valid_rows: summary.valid_rows,
            error_rows: summary.error_rows,
            total_errors: summary.total_errors,
            rules_applied: summary.rules_applied,
        });
        total_rows += summary.total_rows;
        valid_rows += summary.valid_rows;
        error_rows += summary.error_rows;
        rules_applied += summary.rules_applied;

        // Stamp findings with the dataset's display name for reporting.
        findings.extend(run.findings.into_iter().map(|mut finding| {
            finding.sheet = Some(sheet.display_name.clone());
            finding
        }));
    }

    let groups = group_findings(&findings);
    let status = if findings.is_empty() {
        ValidationStatus::Pass
    } else {
        ValidationStatus::Fail
    };
    info!(
        sheets = reports.len(),
        findings = findings.len(),
        groups = groups.len(),
        ?status,
        "workbook validated"
    );

    WorkbookReport {
        status,
        summary: ValidationSummary {
            total_rows,
            valid_rows,
            error_rows,
            total_errors: findings.len(),
            rules_applied,
            timestamp: Utc::now(),
        },
        sheets: reports,
        findings,
        groups,
        matching,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbo_model::{Params, Provenance, RuleType};

    fn descriptor(rule_id: &str, sheet_name: &str, field: &str) -> RuleDescriptor {
        RuleDescriptor {
            rule_id: rule_id.to_string(),
            field_name: field.to_string(),
            rule_type: RuleType::Required,
            parameters: Params::new(),
            error_message_template: format!("{field} is blank"),
            provenance: Provenance {
                original_text: "blank not allowed".to_string(),
                sheet_name: sheet_name.to_string(),
                row_ref: "3".to_string(),
                reference_standard: None,
            },
            interpretation_summary: String::new(),
            confidence_score: 0.99,
        }
    }

    fn sheet(name: &str, column: &str, values: &[&str]) -> Sheet {
        let mut sheet = Sheet::new(name, vec![column.to_string()]);
        for value in values {
            sheet.rows.push(vec![(*value).to_string()]);
        }
        sheet
    }

    #[test]
    fn sheets_pair_on_canonical_names() {
        let engine = Engine::new();
        let sheets = vec![sheet("Employee  Roster", "employee id", &["", "E001"])];
        let rules = vec![descriptor("RULE_001", "Employee Roster", "employee id")];
        let report = validate_workbook(&engine, &sheets, &rules);
        assert_eq!(report.status, ValidationStatus::Fail);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(
            report.findings[0].sheet.as_deref(),
            Some("Employee  Roster")
        );
        assert_eq!(report.matching.matched_sheets, vec!["Employee Roster"]);
    }

    #[test]
    fn unmatched_rule_sheets_are_reported_not_dropped() {
        let engine = Engine::new();
        let sheets = vec![sheet("Roster", "employee id", &["E001"])];
        let rules = vec![
            descriptor("RULE_001", "Roster", "employee id"),
            descriptor("RULE_002", "Payroll", "salary"),
        ];
        let report = validate_workbook(&engine, &sheets, &rules);
        assert_eq!(report.status, ValidationStatus::Pass);
        assert_eq!(report.matching.unmatched_rule_sheets, vec!["Payroll"]);
        assert_eq!(report.summary.rules_applied, 1);
    }

    #[test]
    fn summary_totals_span_sheets() {
        let engine = Engine::new();
        let sheets = vec![
            sheet("Roster", "employee id", &["", "E001"]),
            sheet("Payroll", "employee id", &["", ""]),
        ];
        let rules = vec![
            descriptor("RULE_001", "Roster", "employee id"),
            descriptor("RULE_002", "Payroll", "employee id"),
        ];
        let report = validate_workbook(&engine, &sheets, &rules);
        assert_eq!(report.summary.total_rows, 4);
        assert_eq!(report.summary.total_errors, 3);
        assert_eq!(report.summary.error_rows, 3);
        assert_eq!(report.summary.valid_rows, 1);
        assert_eq!(report.sheets.len(), 2);
        assert_eq!(report.groups.len(), 2);
    }

    #[test]
    fn clean_dataset_passes() {
        let engine = Engine::new();
        let sheets = vec![sheet("Roster", "employee id", &["E001", "E002"])];
        let rules = vec![descriptor("RULE_001", "Roster", "employee id")];
        let report = validate_workbook(&engine, &sheets, &rules);
        assert_eq!(report.status, ValidationStatus::Pass);
        assert!(report.findings.is_empty());
        assert!(report.groups.is_empty());
        assert_eq!(report.summary.valid_rows, 2);
    }
}
