//! Finding aggregation for human-sized reports.
//!
//! Thousands of row-level findings usually reduce to a handful of distinct
//! problems. Groups keep first-seen order as a tiebreak, so aggregation is
//! as deterministic as the findings themselves.

use std::collections::HashMap;

use dbo_model::{Finding, FindingGroup};

const MAX_SAMPLE_VALUES: usize = 3;

/// Collapse findings by (sheet, column, rule, message).
///
/// Groups are ordered by descending count, ties broken by first appearance.
pub fn group_findings(findings: &[Finding]) -> Vec<FindingGroup> {
    let mut index: HashMap<(String, String, String, String), usize> = HashMap::new();
    let mut groups: Vec<FindingGroup> = Vec::new();

    for finding in findings {
        let key = (
            finding.sheet.clone().unwrap_or_default(),
            finding.column.clone(),
            finding.rule_id.clone(),
            finding.message.clone(),
        );
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(FindingGroup {
                sheet: key.0,
                column: key.1,
                rule_id: key.2,
                message: key.3,
                affected_rows: Vec::new(),
                count: 0,
                sample_values: Vec::new(),
                expected: finding.expected.clone(),
                source_rule: finding.source_rule.clone(),
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.affected_rows.push(finding.row);
        if group.sample_values.len() < MAX_SAMPLE_VALUES
            && !group.sample_values.contains(&finding.actual_value)
        {
            group.sample_values.push(finding.actual_value.clone());
        }
    }

    for group in &mut groups {
        group.affected_rows.sort_unstable();
        group.count = group.affected_rows.len();
    }
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(row: usize, column: &str, rule_id: &str, message: &str, actual: &str) -> Finding {
        Finding {
            sheet: Some("Roster".to_string()),
            row,
            column: column.to_string(),
            rule_id: rule_id.to_string(),
            message: message.to_string(),
            actual_value: (!actual.is_empty()).then(|| actual.to_string()),
            expected: None,
            source_rule: "source text".to_string(),
        }
    }

    #[test]
    fn same_problem_collapses_to_one_group() {
        let findings: Vec<Finding> = (0..5)
            .map(|i| finding(i + 2, "employee id", "RULE_001", "blank", ""))
            .collect();
        let groups = group_findings(&findings);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 5);
        assert_eq!(groups[0].affected_rows, vec![2, 3, 4, 5, 6]);
        assert_eq!(groups[0].sample_values, vec![None]);
    }

    #[test]
    fn samples_are_deduplicated_and_capped() {
        let findings = vec![
            finding(2, "gender", "RULE_002", "bad code", "3"),
            finding(3, "gender", "RULE_002", "bad code", "3"),
            finding(4, "gender", "RULE_002", "bad code", "4"),
            finding(5, "gender", "RULE_002", "bad code", "5"),
            finding(6, "gender", "RULE_002", "bad code", "6"),
        ];
        let groups = group_findings(&findings);
        assert_eq!(groups[0].sample_values.len(), 3);
        assert_eq!(
            groups[0].sample_values,
            vec![
                Some("3".to_string()),
                Some("4".to_string()),
                Some("5".to_string())
            ]
        );
    }

    #[test]
    fn groups_sort_by_count_with_stable_ties() {
        let mut findings = vec![finding(2, "a", "RULE_001", "first", "x")];
        findings.extend((0..3).map(|i| finding(i + 2, "b", "RULE_002", "big", "y")));
        findings.push(finding(9, "c", "RULE_003", "tied", "z"));
        let groups = group_findings(&findings);
        assert_eq!(groups[0].rule_id, "RULE_002");
        // Equal counts keep first-seen order.
        assert_eq!(groups[1].rule_id, "RULE_001");
        assert_eq!(groups[2].rule_id, "RULE_003");
    }

    #[test]
    fn distinct_messages_stay_separate() {
        let findings = vec![
            finding(2, "age", "RULE_004", "out of range", "-1"),
            finding(3, "age", "RULE_004", "not a number", "abc"),
        ];
        assert_eq!(group_findings(&findings).len(), 2);
    }
}
