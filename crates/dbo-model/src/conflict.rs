use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Two rules on the same field contradict each other directly.
    RuleContradiction,
    /// A rule disagrees with the domain reference table.
    ReferenceMismatch,
    /// Interpretation confidence is too low to trust without review.
    AmbiguousInterpretation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
}

/// An informational conflict report attached to an interpretation pass.
///
/// Conflicts never block rule execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub rule_id: String,
    pub conflict_type: ConflictType,
    pub description: String,
    /// Related accounting-standard clause, when the conflict cites one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Other rule ids involved in the conflict.
    #[serde(default)]
    pub affected_rules: Vec<String>,
    pub recommendation: String,
    pub severity: ConflictSeverity,
}
