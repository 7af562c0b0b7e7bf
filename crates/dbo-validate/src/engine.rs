//! Deterministic rule engine for a single sheet.
//!
//! Rules are applied in descriptor order; within a rule, rows are scanned
//! top to bottom, so the finding order is fully determined by the inputs.
//! Finding row numbers are spreadsheet rows: data index + 2 (one header row,
//! 1-based numbering).

use std::collections::BTreeSet;

use chrono::Utc;
use regex::Regex;
use tracing::{debug, warn};

use dbo_match::FieldMatcher;
use dbo_model::{
    Finding, RuleDescriptor, RuleType, Sheet, ValidationSummary, param_f64, param_str,
    param_str_list,
};

use crate::dates::{date_key, matches_date_format};

/// Spreadsheet row number for a 0-based data row index.
fn sheet_row(idx: usize) -> usize {
    idx + 2
}

/// Outcome of running one rule batch against one sheet.
#[derive(Debug, Clone, Default)]
pub struct SheetRun {
    pub findings: Vec<Finding>,
    /// Spreadsheet rows with at least one finding.
    pub error_rows: BTreeSet<usize>,
    /// Rule fields that resolved to no dataset column, in rule order.
    pub unmatched_fields: Vec<String>,
    pub rules_applied: usize,
}

impl SheetRun {
    pub fn summary(&self, total_rows: usize) -> ValidationSummary {
        let error_rows = self.error_rows.len();
        ValidationSummary {
            total_rows,
            valid_rows: total_rows.saturating_sub(error_rows),
            error_rows,
            total_errors: self.findings.len(),
            rules_applied: self.rules_applied,
            timestamp: Utc::now(),
        }
    }
}

/// Rule executor with a pluggable field resolver.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    matcher: FieldMatcher,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matcher(matcher: FieldMatcher) -> Self {
        Self { matcher }
    }

    /// Apply every descriptor to the sheet and collect findings.
    pub fn run(&self, sheet: &Sheet, rules: &[RuleDescriptor]) -> SheetRun {
        let mut run = SheetRun {
            rules_applied: rules.len(),
            ..SheetRun::default()
        };
        for rule in rules {
            self.apply(sheet, rule, &mut run);
        }
        debug!(
            sheet = %sheet.display_name,
            rules = rules.len(),
            findings = run.findings.len(),
            "rule batch applied"
        );
        run
    }

    fn resolve_column(&self, sheet: &Sheet, field: &str) -> Option<usize> {
        if let Some(idx) = sheet.column_index(field) {
            return Some(idx);
        }
        let found = self.matcher.resolve(field, &sheet.columns)?;
        sheet.column_index(&found.column)
    }

    fn apply(&self, sheet: &Sheet, rule: &RuleDescriptor, run: &mut SheetRun) {
        let col = self.resolve_column(sheet, &rule.field_name);
        if col.is_none() {
            run.unmatched_fields.push(rule.field_name.clone());
        }
        match rule.rule_type {
            RuleType::Required => apply_required(sheet, rule, col, run),
            RuleType::NoDuplicates => {
                if let Some(col) = col {
                    apply_no_duplicates(sheet, rule, col, run);
                }
            }
            RuleType::Format => {
                if let Some(col) = col {
                    apply_format(sheet, rule, col, run);
                }
            }
            RuleType::Range => {
                if let Some(col) = col {
                    apply_range(sheet, rule, col, run);
                }
            }
            RuleType::DateLogic => {
                if let Some(col) = col {
                    self.apply_date_logic(sheet, rule, col, run);
                }
            }
            RuleType::CrossField => {
                if let Some(col) = col {
                    self.apply_cross_field(sheet, rule, col, run);
                }
            }
            // Custom rules are carried for audit but never executed.
            RuleType::Custom => debug!(rule_id = %rule.rule_id, "skipping custom rule"),
        }
    }

    fn apply_date_logic(&self, sheet: &Sheet, rule: &RuleDescriptor, col: usize, run: &mut SheetRun) {
        let compare_col = param_str(&rule.parameters, "compare_field")
            .and_then(|field| self.resolve_column(sheet, &field));
        let operator = param_str(&rule.parameters, "operator");
        let min_age = param_f64(&rule.parameters, "min_age_at_hire");

        for idx in 0..sheet.height() {
            let Some(value) = sheet.value(idx, col) else {
                continue;
            };
            let Some(compare_col) = compare_col else {
                continue;
            };
            let Some(other) = sheet.value(idx, compare_col) else {
                continue;
            };

            if let (Some(key), Some(other_key)) = (date_key(value), date_key(other)) {
                let violated = match operator.as_deref() {
                    Some("greater_than") => key <= other_key,
                    Some("less_than") => key >= other_key,
                    _ => false,
                };
                if violated {
                    let direction = if operator.as_deref() == Some("greater_than") {
                        "later than"
                    } else {
                        "earlier than"
                    };
                    push(
                        run,
                        rule,
                        sheet_row(idx),
                        Some(value),
                        Some(format!("{direction} {other}")),
                    );
                }

                if let Some(min_age) = min_age {
                    if let (Ok(year), Ok(other_year)) =
                        (key[..4].parse::<i64>(), other_key[..4].parse::<i64>())
                    {
                        let age = year - other_year;
                        if (age as f64) < min_age {
                            push(
                                run,
                                rule,
                                sheet_row(idx),
                                Some(&format!("age {age}")),
                                Some(format!("at least {min_age} years")),
                            );
                        }
                    }
                }
            }
        }
    }

    fn apply_cross_field(&self, sheet: &Sheet, rule: &RuleDescriptor, col: usize, run: &mut SheetRun) {
        let Some(reference_col) = param_str(&rule.parameters, "reference_field")
            .and_then(|field| self.resolve_column(sheet, &field))
        else {
            return;
        };
        let condition = param_str(&rule.parameters, "condition");
        if condition.as_deref() != Some("required_if_not_null") {
            return;
        }
        for idx in 0..sheet.height() {
            if sheet.value(idx, reference_col).is_some() && sheet.value(idx, col).is_none() {
                push(run, rule, sheet_row(idx), sheet.raw_value(idx, col), None);
            }
        }
    }
}

fn apply_required(sheet: &Sheet, rule: &RuleDescriptor, col: Option<usize>, run: &mut SheetRun) {
    let Some(col) = col else {
        // A required column that does not exist fails every data row.
        for idx in 0..sheet.height() {
            let message = format!("required column '{}' is missing", rule.field_name);
            let row = sheet_row(idx);
            run.error_rows.insert(row);
            run.findings.push(Finding {
                sheet: None,
                row,
                column: rule.field_name.clone(),
                rule_id: rule.rule_id.clone(),
                message,
                actual_value: None,
                expected: Some("column present".to_string()),
                source_rule: rule.provenance.original_text.clone(),
            });
        }
        return;
    };
    for idx in 0..sheet.height() {
        if sheet.value(idx, col).is_none() {
            push(run, rule, sheet_row(idx), sheet.raw_value(idx, col), None);
        }
    }
}

fn apply_no_duplicates(sheet: &Sheet, rule: &RuleDescriptor, col: usize, run: &mut SheetRun) {
    let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for idx in 0..sheet.height() {
        if let Some(value) = sheet.value(idx, col) {
            *counts.entry(value).or_insert(0) += 1;
        }
    }
    // Every occurrence of a repeated value is flagged, not just the later ones.
    for idx in 0..sheet.height() {
        if let Some(value) = sheet.value(idx, col) {
            if counts[value] > 1 {
                push(
                    run,
                    rule,
                    sheet_row(idx),
                    Some(value),
                    Some("unique value".to_string()),
                );
            }
        }
    }
}

fn apply_format(sheet: &Sheet, rule: &RuleDescriptor, col: usize, run: &mut SheetRun) {
    if let Some(allowed) = param_str_list(&rule.parameters, "allowed_values") {
        for idx in 0..sheet.height() {
            if let Some(value) = sheet.value(idx, col) {
                if !allowed.iter().any(|a| a == value.trim()) {
                    push(
                        run,
                        rule,
                        sheet_row(idx),
                        Some(value),
                        Some(format!("one of [{}]", allowed.join(", "))),
                    );
                }
            }
        }
        return;
    }

    if let Some(pattern) = param_str(&rule.parameters, "regex") {
        let anchored = format!(r"\A(?:{pattern})\z");
        let regex = match Regex::new(&anchored) {
            Ok(regex) => regex,
            Err(error) => {
                warn!(rule_id = %rule.rule_id, %pattern, %error, "invalid regex, rule skipped");
                return;
            }
        };
        let format_token = param_str(&rule.parameters, "format");
        for idx in 0..sheet.height() {
            if let Some(value) = sheet.value(idx, col) {
                let shape_ok = regex.is_match(value.trim());
                let calendar_ok = format_token
                    .as_deref()
                    .is_none_or(|token| matches_date_format(value, token));
                if !shape_ok || !calendar_ok {
                    push(
                        run,
                        rule,
                        sheet_row(idx),
                        Some(value),
                        format_token.clone().or_else(|| Some(pattern.clone())),
                    );
                }
            }
        }
        return;
    }

    if let Some(token) = param_str(&rule.parameters, "format") {
        for idx in 0..sheet.height() {
            if let Some(value) = sheet.value(idx, col) {
                if !matches_date_format(value, &token) {
                    push(run, rule, sheet_row(idx), Some(value), Some(token.clone()));
                }
            }
        }
    }
}

fn apply_range(sheet: &Sheet, rule: &RuleDescriptor, col: usize, run: &mut SheetRun) {
    let min_date = param_str(&rule.parameters, "min_date");
    let max_date = param_str(&rule.parameters, "max_date");
    if min_date.is_some() || max_date.is_some() {
        apply_date_range(sheet, rule, col, min_date, max_date, run);
        return;
    }

    let min = param_f64(&rule.parameters, "min_value");
    let max = param_f64(&rule.parameters, "max_value");
    if min.is_none() && max.is_none() {
        return;
    }
    let expected = match (min, max) {
        (Some(min), Some(max)) => format!("between {min} and {max}"),
        (Some(min), None) => format!("at least {min}"),
        (None, Some(max)) => format!("at most {max}"),
        (None, None) => unreachable!(),
    };
    for idx in 0..sheet.height() {
        let Some(value) = sheet.value(idx, col) else {
            continue;
        };
        let Ok(number) = value.trim().replace(',', "").parse::<f64>() else {
            push(
                run,
                rule,
                sheet_row(idx),
                Some(value),
                Some("a numeric value".to_string()),
            );
            continue;
        };
        if min.is_some_and(|min| number < min) || max.is_some_and(|max| number > max) {
            push(run, rule, sheet_row(idx), Some(value), Some(expected.clone()));
        }
    }
}

fn apply_date_range(
    sheet: &Sheet,
    rule: &RuleDescriptor,
    col: usize,
    min_date: Option<String>,
    max_date: Option<String>,
    run: &mut SheetRun,
) {
    let expected = match (min_date.as_deref(), max_date.as_deref()) {
        (Some(min), Some(max)) => format!("between {min} and {max}"),
        (Some(min), None) => format!("on or after {min}"),
        (None, Some(max)) => format!("on or before {max}"),
        (None, None) => unreachable!(),
    };
    for idx in 0..sheet.height() {
        let Some(value) = sheet.value(idx, col) else {
            continue;
        };
        // Zero-padded YYYYMMDD keys compare correctly as strings.
        let Some(key) = date_key(value) else {
            push(
                run,
                rule,
                sheet_row(idx),
                Some(value),
                Some("a YYYYMMDD date".to_string()),
            );
            continue;
        };
        if min_date.as_deref().is_some_and(|min| key < min)
            || max_date.as_deref().is_some_and(|max| key > max)
        {
            push(run, rule, sheet_row(idx), Some(value), Some(expected.clone()));
        }
    }
}

fn push(
    run: &mut SheetRun,
    rule: &RuleDescriptor,
    row: usize,
    actual: Option<&str>,
    expected: Option<String>,
) {
    run.error_rows.insert(row);
    run.findings.push(Finding {
        sheet: None,
        row,
        column: rule.field_name.clone(),
        rule_id: rule.rule_id.clone(),
        message: rule.error_message_template.clone(),
        actual_value: actual.map(str::to_string),
        expected,
        source_rule: rule.provenance.original_text.clone(),
    });
}
