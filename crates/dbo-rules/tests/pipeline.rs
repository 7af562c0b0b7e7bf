//! End-to-end extraction and interpretation over a realistic rule workbook.

use dbo_model::{RawSheet, RuleType, param_str, param_str_list};
use dbo_rules::{HeuristicInterpreter, SplitPolicy, extract_rules};

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| (*c).to_string()).collect()
}

/// A rule sheet shaped like the ones actuarial teams actually author:
/// merged sheet-name cells, composite rules, a not-applicable row, and a
/// free-text rule nothing recognizes.
fn authored_rules() -> RawSheet {
    RawSheet::new(
        "validation rules",
        vec![
            row(&["No", "Sheet", "Column", "Field", "Rule", "Condition", "Note"]),
            row(&["", "", "", "", "", "", ""]),
            row(&["1", "Employee Roster", "B", "employee id", "blank, duplicate not allowed", "", ""]),
            row(&["2", "", "C", "birth date", "YYYYMMDD", "", ""]),
            row(&["3", "", "D", "hire date", "YYYYMMDD, hire date>birth date", "", ""]),
            row(&["4", "", "E", "gender", "1, 2", "", ""]),
            row(&["5", "", "F", "salary", "salary<0 not allowed", "", ""]),
            row(&["6", "", "G", "note", "see actuarial memo", "N/A", ""]),
            row(&["7", "", "H", "remark", "free-form commentary field", "", ""]),
        ],
    )
}

#[test]
fn workbook_interprets_into_typed_descriptors() {
    let extraction = extract_rules(&[authored_rules()], &SplitPolicy::default()).expect("extract");
    let outcome = HeuristicInterpreter::new().interpret(&extraction.records);
    let types: Vec<RuleType> = outcome.descriptors.iter().map(|d| d.rule_type).collect();
    assert_eq!(
        types,
        vec![
            RuleType::Required,
            RuleType::NoDuplicates,
            RuleType::Format,
            RuleType::Format,
            RuleType::DateLogic,
            RuleType::Format,
            RuleType::Range,
            RuleType::Custom,
        ]
    );

    // Rule ids are assigned sequentially across the whole batch.
    let ids: Vec<&str> = outcome
        .descriptors
        .iter()
        .map(|d| d.rule_id.as_str())
        .collect();
    assert_eq!(
        ids,
        vec![
            "RULE_001", "RULE_002", "RULE_003", "RULE_004", "RULE_005", "RULE_006", "RULE_007",
            "RULE_008"
        ]
    );

    // Every descriptor targets the forward-filled sheet.
    assert!(
        outcome
            .descriptors
            .iter()
            .all(|d| d.provenance.sheet_name == "EmployeeRoster")
    );

    // The composite hire-date rule split into format and comparison halves.
    let date_logic = &outcome.descriptors[4];
    assert_eq!(date_logic.field_name, "hire date");
    assert_eq!(
        param_str(&date_logic.parameters, "compare_field").as_deref(),
        Some("birth date")
    );
    assert_eq!(date_logic.provenance.row_ref, "5.2");

    // The code list survived as allowed values, not as split fragments.
    let gender = &outcome.descriptors[5];
    assert_eq!(
        param_str_list(&gender.parameters, "allowed_values"),
        Some(vec!["1".to_string(), "2".to_string()])
    );
}

#[test]
fn interpretation_is_reproducible() {
    let extraction = extract_rules(&[authored_rules()], &SplitPolicy::default()).expect("extract");
    let first = HeuristicInterpreter::new().interpret(&extraction.records);
    let second = HeuristicInterpreter::new().interpret(&extraction.records);
    assert_eq!(first.descriptors, second.descriptors);
    assert_eq!(first.conflicts.len(), second.conflicts.len());
}

#[test]
fn date_fields_carry_reference_clauses() {
    let extraction = extract_rules(&[authored_rules()], &SplitPolicy::default()).expect("extract");
    let outcome = HeuristicInterpreter::new().interpret(&extraction.records);
    let birth = outcome
        .descriptors
        .iter()
        .find(|d| d.field_name == "birth date")
        .expect("birth date descriptor");
    assert_eq!(
        birth.provenance.reference_standard.as_deref(),
        Some("K-IFRS 1019.70")
    );
}
