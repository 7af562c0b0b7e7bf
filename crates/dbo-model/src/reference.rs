//! Static domain reference table for defined-benefit-obligation data.
//!
//! A small clause lookup distilled from IAS 19 / K-IFRS 1019 guidance on the
//! employee data that supports a DBO measurement. Consulted only for conflict
//! annotation; it never drives validation itself.

/// One reference clause with the data expectation it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceClause {
    /// Standard clause identifier (e.g. "K-IFRS 1019.70").
    pub clause: &'static str,
    /// Field-name keyword the clause speaks to, matched case-insensitively
    /// against whitespace-stripped field names.
    pub field_keyword: &'static str,
    /// Date-format token the clause expects for the field, when it fixes one.
    pub expected_format: Option<&'static str>,
    /// Short guidance note used in conflict descriptions.
    pub guidance: &'static str,
}

/// Clause table. Ordered from most to least specific keyword so the first
/// hit wins.
pub const REFERENCE_CLAUSES: &[ReferenceClause] = &[
    ReferenceClause {
        clause: "K-IFRS 1019.70",
        field_keyword: "hiredate",
        expected_format: Some("YYYYMMDD"),
        guidance: "service is attributed from the hire date; dates must be full calendar dates",
    },
    ReferenceClause {
        clause: "K-IFRS 1019.70",
        field_keyword: "birthdate",
        expected_format: Some("YYYYMMDD"),
        guidance: "demographic assumptions require full calendar birth dates",
    },
    ReferenceClause {
        clause: "K-IFRS 1019.67",
        field_keyword: "leavedate",
        expected_format: Some("YYYYMMDD"),
        guidance: "the projected unit credit method attributes benefit to full service periods",
    },
    ReferenceClause {
        clause: "K-IFRS 1019.57",
        field_keyword: "basedate",
        expected_format: Some("YYYYMMDD"),
        guidance: "the measurement date must be a single, consistent calendar date",
    },
    ReferenceClause {
        clause: "K-IFRS 1019.87",
        field_keyword: "salary",
        expected_format: None,
        guidance: "benefit measurement uses current and projected salary levels; amounts are non-negative",
    },
];

/// Look up the clause, if any, that speaks to a given field name.
pub fn reference_for_field(field_name: &str) -> Option<&'static ReferenceClause> {
    let key: String = field_name
        .split_whitespace()
        .collect::<String>()
        .replace('_', "")
        .to_lowercase();
    if key.is_empty() {
        return None;
    }
    REFERENCE_CLAUSES
        .iter()
        .find(|clause| key.contains(clause.field_keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_clause_despite_spacing_and_case() {
        let clause = reference_for_field("Hire Date").expect("hire date clause");
        assert_eq!(clause.clause, "K-IFRS 1019.70");
        assert_eq!(clause.expected_format, Some("YYYYMMDD"));
        assert!(reference_for_field("hire_date").is_some());
    }

    #[test]
    fn unknown_field_has_no_clause() {
        assert!(reference_for_field("department").is_none());
        assert!(reference_for_field("").is_none());
    }
}
