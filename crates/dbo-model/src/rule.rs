//! Rule records and executable rule descriptors.
//!
//! `RawRuleRecord` is the short-lived product of rule-source extraction;
//! `RuleDescriptor` is the immutable, typed form the validation engine runs.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelError;

/// The closed set of executable rule types.
///
/// Any string that does not name one of these variants is a fatal parse
/// failure at the boundary (`FromStr`/serde), never a silently degraded rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Required,
    NoDuplicates,
    Format,
    Range,
    DateLogic,
    CrossField,
    Custom,
}

impl RuleType {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleType::Required => "required",
            RuleType::NoDuplicates => "no_duplicates",
            RuleType::Format => "format",
            RuleType::Range => "range",
            RuleType::DateLogic => "date_logic",
            RuleType::CrossField => "cross_field",
            RuleType::Custom => "custom",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "required" => Ok(RuleType::Required),
            "no_duplicates" => Ok(RuleType::NoDuplicates),
            "format" => Ok(RuleType::Format),
            "range" => Ok(RuleType::Range),
            "date_logic" => Ok(RuleType::DateLogic),
            "cross_field" => Ok(RuleType::CrossField),
            "custom" => Ok(RuleType::Custom),
            other => Err(ModelError::UnknownRuleType(other.to_string())),
        }
    }
}

/// Rule parameters as an ordered key/value map.
///
/// The shape depends on the rule type (e.g. `{"format": "YYYYMMDD"}`,
/// `{"min_value": 0}`, `{"compare_field": "birth_date"}`).
pub type Params = BTreeMap<String, Value>;

/// String parameter accessor.
pub fn param_str(params: &Params, key: &str) -> Option<String> {
    params.get(key).map(|value| match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Numeric parameter accessor; accepts JSON numbers and numeric strings.
pub fn param_f64(params: &Params, key: &str) -> Option<f64> {
    match params.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// String-list parameter accessor; scalar entries are stringified.
pub fn param_str_list(params: &Params, key: &str) -> Option<Vec<String>> {
    match params.get(key)? {
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        _ => None,
    }
}

/// Where a descriptor came from, for audit trails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Original natural-language rule text.
    pub original_text: String,
    /// Canonical sheet name the rule targets.
    pub sheet_name: String,
    /// Source row reference; "N" or "N.M" for split sub-rules.
    pub row_ref: String,
    /// Related accounting-standard clause, when one applies.
    pub reference_standard: Option<String>,
}

/// A typed, executable validation rule.
///
/// Immutable once created; the engine never mutates descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDescriptor {
    pub rule_id: String,
    pub field_name: String,
    pub rule_type: RuleType,
    #[serde(default)]
    pub parameters: Params,
    pub error_message_template: String,
    pub provenance: Provenance,
    pub interpretation_summary: String,
    /// Interpretation confidence in [0, 1].
    pub confidence_score: f64,
}

/// Interpretation carried inside a re-uploaded rule source.
///
/// When present, downstream interpretation is skipped unless forced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefilledInterpretation {
    pub rule_id: String,
    pub rule_type: RuleType,
    #[serde(default)]
    pub parameters: Params,
    pub summary: Option<String>,
    pub error_message: Option<String>,
}

/// One raw rule statement as extracted from the rule source.
///
/// Created during extraction, discarded once interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRuleRecord {
    /// Sheet reference exactly as written in the source cell.
    pub sheet_ref: String,
    /// Whitespace-stripped join key derived from the display name.
    pub canonical_sheet: String,
    /// Normalized human-readable sheet name.
    pub display_sheet: String,
    /// Source row; "N" or "N.M" for split sub-rules.
    pub row_ref: String,
    /// Spreadsheet column letter (e.g. "C").
    pub column_ref: String,
    pub field_name: String,
    pub rule_text: String,
    pub condition: String,
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefilled: Option<PrefilledInterpretation>,
}
