//! Deterministic rule interpretation.
//!
//! Interpretation is a pure function of (rule text, field name): identical
//! input always yields identical descriptors, evaluated by first-match
//! priority over a fixed set of heuristic buckets. Records carrying a
//! prefilled interpretation are taken verbatim unless re-interpretation is
//! forced.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use regex::Regex;
use serde_json::{Value, json};
use tracing::info;

use dbo_model::{
    Conflict, Params, Provenance, RawRuleRecord, RuleDescriptor, RuleType, reference_for_field,
};

use crate::conflict::detect_conflicts;

/// Result of one interpretation pass.
#[derive(Debug, Clone)]
pub struct InterpretationOutcome {
    pub descriptors: Vec<RuleDescriptor>,
    pub conflicts: Vec<Conflict>,
    pub summary: String,
    pub elapsed: Duration,
}

/// The reference interpreter: heuristic buckets, no external calls.
#[derive(Debug, Clone, Default)]
pub struct HeuristicInterpreter {
    force_reinterpret: bool,
}

const HIGH_CONFIDENCE: f64 = 0.99;
const DEFAULT_CONFIDENCE: f64 = 0.95;

fn numeric_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\s*,\s*\d+").expect("numeric list regex"))
}

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("digits regex"))
}

impl HeuristicInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore prefilled interpretations and run the heuristics for every
    /// record.
    #[must_use]
    pub fn force_reinterpret(mut self, force: bool) -> Self {
        self.force_reinterpret = force;
        self
    }

    /// Interpret a batch of raw rule records into typed descriptors plus an
    /// informational conflict report.
    pub fn interpret(&self, records: &[RawRuleRecord]) -> InterpretationOutcome {
        let start = Instant::now();
        let mut descriptors = Vec::new();
        let mut counter = 1usize;

        for record in records {
            if record.field_name.is_empty() || record.rule_text.is_empty() {
                continue;
            }
            if !self.force_reinterpret {
                if let Some(prefilled) = &record.prefilled {
                    descriptors.push(descriptor_from_prefilled(record, prefilled));
                    continue;
                }
            }
            interpret_record(record, &mut counter, &mut descriptors);
        }

        let conflicts = detect_conflicts(&descriptors);
        let summary = summarize(&descriptors, &conflicts);
        let elapsed = start.elapsed();
        info!(
            rules = descriptors.len(),
            conflicts = conflicts.len(),
            ?elapsed,
            "interpreted rule batch"
        );
        InterpretationOutcome {
            descriptors,
            conflicts,
            summary,
            elapsed,
        }
    }
}

fn provenance_for(record: &RawRuleRecord) -> Provenance {
    Provenance {
        original_text: record.rule_text.clone(),
        sheet_name: record.canonical_sheet.clone(),
        row_ref: record.row_ref.clone(),
        reference_standard: reference_for_field(&record.field_name).map(|c| c.clause.to_string()),
    }
}

fn descriptor_from_prefilled(
    record: &RawRuleRecord,
    prefilled: &dbo_model::PrefilledInterpretation,
) -> RuleDescriptor {
    let field = &record.field_name;
    RuleDescriptor {
        rule_id: prefilled.rule_id.clone(),
        field_name: field.clone(),
        rule_type: prefilled.rule_type,
        parameters: prefilled.parameters.clone(),
        error_message_template: prefilled
            .error_message
            .clone()
            .unwrap_or_else(|| format!("{field} failed {} validation.", prefilled.rule_type)),
        provenance: provenance_for(record),
        interpretation_summary: prefilled
            .summary
            .clone()
            .unwrap_or_else(|| format!("cached {} interpretation for {field}", prefilled.rule_type)),
        // Cached interpretations were materialized by an earlier pass and
        // exported for review.
        confidence_score: 1.0,
    }
}

fn next_rule_id(counter: &mut usize) -> String {
    let id = format!("RULE_{counter:03}");
    *counter += 1;
    id
}

fn interpret_record(record: &RawRuleRecord, counter: &mut usize, out: &mut Vec<RuleDescriptor>) {
    let field = &record.field_name;
    let text = record.rule_text.trim();
    let lower = text.to_lowercase();

    let make = |rule_id: String,
                rule_type: RuleType,
                parameters: Params,
                message: String,
                summary: String,
                confidence: f64| RuleDescriptor {
        rule_id,
        field_name: field.clone(),
        rule_type,
        parameters,
        error_message_template: message,
        provenance: provenance_for(record),
        interpretation_summary: summary,
        confidence_score: confidence,
    };

    // 1. "blank" together with "duplicate" carries two independent rules.
    if lower.contains("blank") && lower.contains("duplicate") {
        out.push(make(
            next_rule_id(counter),
            RuleType::Required,
            Params::new(),
            format!("{field} is blank."),
            format!("{field} is required"),
            HIGH_CONFIDENCE,
        ));
        out.push(make(
            next_rule_id(counter),
            RuleType::NoDuplicates,
            Params::new(),
            format!("{field} is duplicated."),
            format!("{field} must be unique"),
            HIGH_CONFIDENCE,
        ));
        return;
    }

    // 2. 8-digit calendar-date marker.
    if lower.contains("yyyymmdd") {
        let mut params = Params::new();
        params.insert("format".to_string(), json!("YYYYMMDD"));
        params.insert("regex".to_string(), json!("^[0-9]{8}$"));
        out.push(make(
            next_rule_id(counter),
            RuleType::Format,
            params,
            format!("{field} has an invalid format; expected an 8-digit YYYYMMDD date."),
            format!("date format check for {field}"),
            DEFAULT_CONFIDENCE,
        ));
        return;
    }

    // 3. Comma-separated numeric literal list.
    if numeric_list_re().is_match(text) {
        let values: Vec<Value> = digits_re()
            .find_iter(text)
            .map(|m| json!(m.as_str()))
            .collect();
        let joined = values
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let mut params = Params::new();
        params.insert("allowed_values".to_string(), Value::Array(values));
        out.push(make(
            next_rule_id(counter),
            RuleType::Format,
            params,
            format!("{field} must be one of: {joined}."),
            format!("allowed values for {field}"),
            DEFAULT_CONFIDENCE,
        ));
        return;
    }

    // 4. A ">" comparison between two operands.
    if let Some((lhs, rhs)) = text.split_once('>') {
        let (lhs, rhs) = (lhs.trim(), rhs.trim());
        if !lhs.is_empty() && !rhs.is_empty() && !rhs.starts_with('=') {
            let mut params = Params::new();
            params.insert("compare_field".to_string(), json!(rhs));
            params.insert("operator".to_string(), json!("greater_than"));
            out.push(make(
                next_rule_id(counter),
                RuleType::DateLogic,
                params,
                format!("{lhs} must be later than {rhs}."),
                format!("{lhs} compared against {rhs}"),
                DEFAULT_CONFIDENCE,
            ));
            return;
        }
    }

    // 5. A "<" comparison paired with a literal zero.
    if text.contains('<') && text.contains('0') {
        let mut params = Params::new();
        params.insert("min_value".to_string(), json!(0));
        out.push(make(
            next_rule_id(counter),
            RuleType::Range,
            params,
            format!("{field} must be at least 0."),
            format!("non-negative bound for {field}"),
            DEFAULT_CONFIDENCE,
        ));
        return;
    }

    // 6. Fallback: keep the text for review; the engine treats custom rules
    // as a no-op.
    let mut params = Params::new();
    params.insert("expression".to_string(), json!(text));
    out.push(make(
        next_rule_id(counter),
        RuleType::Custom,
        params,
        format!("{field} failed validation: {text}"),
        format!("unrecognized rule kept verbatim for {field}"),
        DEFAULT_CONFIDENCE,
    ));
}

fn summarize(descriptors: &[RuleDescriptor], conflicts: &[Conflict]) -> String {
    let high = descriptors
        .iter()
        .filter(|d| d.confidence_score >= 0.95)
        .count();
    let medium = descriptors
        .iter()
        .filter(|d| (0.80..0.95).contains(&d.confidence_score))
        .count();
    let low = descriptors.len() - high - medium;
    let mut summary = format!(
        "Interpreted {} rules: {high} high confidence (>=0.95), {medium} medium (0.80-0.95), {low} low (<0.80); {} conflicts detected.",
        descriptors.len(),
        conflicts.len(),
    );
    if low > 0 {
        summary.push_str(" Low-confidence rules need review.");
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbo_model::param_str;

    fn record(field: &str, text: &str) -> RawRuleRecord {
        RawRuleRecord {
            sheet_ref: "Roster".to_string(),
            canonical_sheet: "Roster".to_string(),
            display_sheet: "Roster".to_string(),
            row_ref: "3".to_string(),
            column_ref: "B".to_string(),
            field_name: field.to_string(),
            rule_text: text.to_string(),
            condition: String::new(),
            note: String::new(),
            prefilled: None,
        }
    }

    #[test]
    fn blank_and_duplicate_yield_two_descriptors() {
        let outcome =
            HeuristicInterpreter::new().interpret(&[record("employee id", "blank, duplicate")]);
        assert_eq!(outcome.descriptors.len(), 2);
        assert_eq!(outcome.descriptors[0].rule_type, RuleType::Required);
        assert_eq!(outcome.descriptors[1].rule_type, RuleType::NoDuplicates);
        assert_eq!(outcome.descriptors[0].confidence_score, 0.99);
        assert_eq!(outcome.descriptors[0].rule_id, "RULE_001");
        assert_eq!(outcome.descriptors[1].rule_id, "RULE_002");
    }

    #[test]
    fn yyyymmdd_marker_yields_format_descriptor() {
        let outcome = HeuristicInterpreter::new()
            .interpret(&[record("hire date", "8-digit YYYYMMDD date")]);
        let descriptor = &outcome.descriptors[0];
        assert_eq!(descriptor.rule_type, RuleType::Format);
        assert_eq!(param_str(&descriptor.parameters, "regex").as_deref(), Some("^[0-9]{8}$"));
        assert_eq!(descriptor.confidence_score, 0.95);
        // Date fields are annotated with the reference clause they fall under.
        assert_eq!(
            descriptor.provenance.reference_standard.as_deref(),
            Some("K-IFRS 1019.70")
        );
    }

    #[test]
    fn numeric_list_yields_allowed_values() {
        let outcome = HeuristicInterpreter::new().interpret(&[record("employee type", "1, 3, 4")]);
        let descriptor = &outcome.descriptors[0];
        assert_eq!(descriptor.rule_type, RuleType::Format);
        let values = dbo_model::param_str_list(&descriptor.parameters, "allowed_values")
            .expect("allowed values");
        assert_eq!(values, vec!["1", "3", "4"]);
    }

    #[test]
    fn greater_than_comparison_yields_date_logic() {
        let outcome =
            HeuristicInterpreter::new().interpret(&[record("hire date", "hire date > birth date")]);
        let descriptor = &outcome.descriptors[0];
        assert_eq!(descriptor.rule_type, RuleType::DateLogic);
        assert_eq!(
            param_str(&descriptor.parameters, "compare_field").as_deref(),
            Some("birth date")
        );
        assert_eq!(
            param_str(&descriptor.parameters, "operator").as_deref(),
            Some("greater_than")
        );
    }

    #[test]
    fn less_than_zero_yields_range() {
        let outcome =
            HeuristicInterpreter::new().interpret(&[record("salary", "no value < 0 allowed")]);
        let descriptor = &outcome.descriptors[0];
        assert_eq!(descriptor.rule_type, RuleType::Range);
        assert_eq!(dbo_model::param_f64(&descriptor.parameters, "min_value"), Some(0.0));
    }

    #[test]
    fn fallback_is_custom_with_expression() {
        let outcome = HeuristicInterpreter::new()
            .interpret(&[record("note", "must match the signed agreement")]);
        let descriptor = &outcome.descriptors[0];
        assert_eq!(descriptor.rule_type, RuleType::Custom);
        assert_eq!(
            param_str(&descriptor.parameters, "expression").as_deref(),
            Some("must match the signed agreement")
        );
    }

    #[test]
    fn interpretation_is_deterministic() {
        let records = vec![
            record("employee id", "blank, duplicate"),
            record("hire date", "YYYYMMDD"),
            record("salary", "< 0 not allowed"),
        ];
        let interpreter = HeuristicInterpreter::new();
        let first = interpreter.interpret(&records);
        let second = interpreter.interpret(&records);
        assert_eq!(first.descriptors, second.descriptors);
        assert_eq!(first.conflicts, second.conflicts);
    }

    #[test]
    fn prefilled_interpretation_bypasses_heuristics_unless_forced() {
        let mut rec = record("hire date", "YYYYMMDD");
        rec.prefilled = Some(dbo_model::PrefilledInterpretation {
            rule_id: "RULE_042".to_string(),
            rule_type: RuleType::Required,
            parameters: Params::new(),
            summary: Some("cached".to_string()),
            error_message: None,
        });

        let cached = HeuristicInterpreter::new().interpret(std::slice::from_ref(&rec));
        assert_eq!(cached.descriptors[0].rule_id, "RULE_042");
        assert_eq!(cached.descriptors[0].rule_type, RuleType::Required);
        assert_eq!(cached.descriptors[0].confidence_score, 1.0);

        let forced = HeuristicInterpreter::new()
            .force_reinterpret(true)
            .interpret(&[rec]);
        assert_eq!(forced.descriptors[0].rule_type, RuleType::Format);
    }
}
