//! Deterministic conflict detection over interpreted descriptors.
//!
//! Compares sibling descriptors on the same (sheet, field) for direct
//! contradictions, checks format rules against the static domain reference
//! table, and flags low-confidence interpretations. Conflicts are
//! informational and never block execution.

use std::collections::BTreeMap;

use dbo_model::{
    Conflict, ConflictSeverity, ConflictType, RuleDescriptor, RuleType, param_f64, param_str,
    param_str_list, reference_for_field,
};

const AMBIGUITY_THRESHOLD: f64 = 0.8;

/// Run the conflict pass over one batch of descriptors.
pub fn detect_conflicts(descriptors: &[RuleDescriptor]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    // Group siblings by (sheet, field), preserving first-seen order.
    let mut order: Vec<(String, String)> = Vec::new();
    let mut groups: BTreeMap<(String, String), Vec<&RuleDescriptor>> = BTreeMap::new();
    for descriptor in descriptors {
        let key = (
            descriptor.provenance.sheet_name.clone(),
            descriptor.field_name.to_lowercase(),
        );
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(descriptor);
    }

    for key in &order {
        let siblings = &groups[key];
        check_format_contradictions(siblings, &mut conflicts);
        check_range_contradictions(siblings, &mut conflicts);
    }

    for descriptor in descriptors {
        check_reference(descriptor, &mut conflicts);
    }

    for descriptor in descriptors {
        if descriptor.confidence_score < AMBIGUITY_THRESHOLD {
            conflicts.push(Conflict {
                rule_id: descriptor.rule_id.clone(),
                conflict_type: ConflictType::AmbiguousInterpretation,
                description: format!(
                    "interpretation confidence {:.2} for '{}' is below {AMBIGUITY_THRESHOLD}",
                    descriptor.confidence_score, descriptor.field_name
                ),
                reference: None,
                affected_rules: Vec::new(),
                recommendation: "review the rule text and confirm or correct the interpretation"
                    .to_string(),
                severity: ConflictSeverity::Low,
            });
        }
    }

    conflicts
}

fn check_format_contradictions(siblings: &[&RuleDescriptor], conflicts: &mut Vec<Conflict>) {
    let formats: Vec<&&RuleDescriptor> = siblings
        .iter()
        .filter(|d| d.rule_type == RuleType::Format)
        .collect();
    for (idx, a) in formats.iter().enumerate() {
        for b in formats.iter().skip(idx + 1) {
            if let (Some(fa), Some(fb)) = (
                param_str(&a.parameters, "format"),
                param_str(&b.parameters, "format"),
            ) {
                if fa != fb {
                    conflicts.push(contradiction(
                        a,
                        b,
                        format!(
                            "'{}' is required to be both {fa} and {fb}",
                            a.field_name
                        ),
                    ));
                    continue;
                }
            }
            if let (Some(va), Some(vb)) = (
                param_str_list(&a.parameters, "allowed_values"),
                param_str_list(&b.parameters, "allowed_values"),
            ) {
                if !va.iter().any(|v| vb.contains(v)) {
                    conflicts.push(contradiction(
                        a,
                        b,
                        format!(
                            "allowed value sets for '{}' share no common value",
                            a.field_name
                        ),
                    ));
                }
            }
        }
    }
}

fn check_range_contradictions(siblings: &[&RuleDescriptor], conflicts: &mut Vec<Conflict>) {
    let ranges: Vec<&&RuleDescriptor> = siblings
        .iter()
        .filter(|d| d.rule_type == RuleType::Range)
        .collect();
    if ranges.len() < 2 {
        return;
    }
    let min = ranges
        .iter()
        .filter_map(|d| param_f64(&d.parameters, "min_value"))
        .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |a| a.max(v))));
    let max = ranges
        .iter()
        .filter_map(|d| param_f64(&d.parameters, "max_value"))
        .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |a| a.min(v))));
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            let first = ranges[0];
            conflicts.push(Conflict {
                rule_id: first.rule_id.clone(),
                conflict_type: ConflictType::RuleContradiction,
                description: format!(
                    "combined range for '{}' is empty: min {min} exceeds max {max}",
                    first.field_name
                ),
                reference: None,
                affected_rules: ranges.iter().skip(1).map(|d| d.rule_id.clone()).collect(),
                recommendation: "reconcile the overlapping range rules into one bound".to_string(),
                severity: ConflictSeverity::High,
            });
        }
    }
}

fn check_reference(descriptor: &RuleDescriptor, conflicts: &mut Vec<Conflict>) {
    if descriptor.rule_type != RuleType::Format {
        return;
    }
    let Some(format) = param_str(&descriptor.parameters, "format") else {
        return;
    };
    let Some(clause) = reference_for_field(&descriptor.field_name) else {
        return;
    };
    let Some(expected) = clause.expected_format else {
        return;
    };
    if format != expected {
        conflicts.push(Conflict {
            rule_id: descriptor.rule_id.clone(),
            conflict_type: ConflictType::ReferenceMismatch,
            description: format!(
                "'{}' declares format {format} but {} expects {expected} ({})",
                descriptor.field_name, clause.clause, clause.guidance
            ),
            reference: Some(clause.clause.to_string()),
            affected_rules: Vec::new(),
            recommendation: format!("align the rule with {expected} or document the deviation"),
            severity: ConflictSeverity::Medium,
        });
    }
}

fn contradiction(a: &RuleDescriptor, b: &RuleDescriptor, description: String) -> Conflict {
    Conflict {
        rule_id: a.rule_id.clone(),
        conflict_type: ConflictType::RuleContradiction,
        description,
        reference: None,
        affected_rules: vec![b.rule_id.clone()],
        recommendation: "keep one of the contradicting rules and retire the other".to_string(),
        severity: ConflictSeverity::High,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbo_model::{Params, Provenance};
    use serde_json::json;

    fn descriptor(
        rule_id: &str,
        field: &str,
        rule_type: RuleType,
        params: &[(&str, serde_json::Value)],
        confidence: f64,
    ) -> RuleDescriptor {
        let mut parameters = Params::new();
        for (key, value) in params {
            parameters.insert((*key).to_string(), value.clone());
        }
        RuleDescriptor {
            rule_id: rule_id.to_string(),
            field_name: field.to_string(),
            rule_type,
            parameters,
            error_message_template: String::new(),
            provenance: Provenance {
                original_text: String::new(),
                sheet_name: "Roster".to_string(),
                row_ref: "3".to_string(),
                reference_standard: None,
            },
            interpretation_summary: String::new(),
            confidence_score: confidence,
        }
    }

    #[test]
    fn contradicting_format_tokens_are_flagged() {
        let a = descriptor("RULE_001", "note", RuleType::Format, &[("format", json!("YYYYMMDD"))], 0.95);
        let b = descriptor("RULE_002", "note", RuleType::Format, &[("format", json!("YYYYMM"))], 0.95);
        let conflicts = detect_conflicts(&[a, b]);
        assert!(conflicts.iter().any(|c| {
            c.conflict_type == ConflictType::RuleContradiction
                && c.severity == ConflictSeverity::High
                && c.affected_rules == vec!["RULE_002".to_string()]
        }));
    }

    #[test]
    fn disjoint_allowed_values_are_flagged() {
        let a = descriptor(
            "RULE_001",
            "gender",
            RuleType::Format,
            &[("allowed_values", json!(["M", "F"]))],
            0.95,
        );
        let b = descriptor(
            "RULE_002",
            "gender",
            RuleType::Format,
            &[("allowed_values", json!(["1", "2"]))],
            0.95,
        );
        let conflicts = detect_conflicts(&[a, b]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::RuleContradiction);
    }

    #[test]
    fn empty_combined_range_is_flagged() {
        let a = descriptor("RULE_001", "age", RuleType::Range, &[("min_value", json!(100))], 0.95);
        let b = descriptor("RULE_002", "age", RuleType::Range, &[("max_value", json!(50))], 0.95);
        let conflicts = detect_conflicts(&[a, b]);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].description.contains("empty"));
    }

    #[test]
    fn format_disagreeing_with_reference_table_is_flagged() {
        let a = descriptor(
            "RULE_001",
            "hire date",
            RuleType::Format,
            &[("format", json!("YYYYMM"))],
            0.95,
        );
        let conflicts = detect_conflicts(&[a]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::ReferenceMismatch);
        assert_eq!(conflicts[0].reference.as_deref(), Some("K-IFRS 1019.70"));
    }

    #[test]
    fn low_confidence_is_ambiguous() {
        let a = descriptor("RULE_001", "note", RuleType::Custom, &[], 0.5);
        let conflicts = detect_conflicts(&[a]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::AmbiguousInterpretation);
        assert_eq!(conflicts[0].severity, ConflictSeverity::Low);
    }

    #[test]
    fn clean_rules_produce_no_conflicts() {
        let a = descriptor("RULE_001", "employee id", RuleType::Required, &[], 0.99);
        let b = descriptor(
            "RULE_002",
            "hire date",
            RuleType::Format,
            &[("format", json!("YYYYMMDD"))],
            0.95,
        );
        assert!(detect_conflicts(&[a, b]).is_empty());
    }
}
