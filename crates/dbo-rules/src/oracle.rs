//! External interpretation oracle contract.
//!
//! An external model may stand in for the heuristic interpreter, but only
//! behind the same typed contract: it receives a batch of raw rule records
//! and must answer with a `{rules, conflicts}` payload that parses into
//! descriptors exactly. A non-conforming payload is a hard failure; the
//! pipeline never degrades an unparseable answer into a guess.

use serde::Deserialize;

use dbo_model::{Conflict, RawRuleRecord, RuleDescriptor};

use crate::error::InterpretError;

/// Parsed oracle answer.
#[derive(Debug, Clone, Deserialize)]
pub struct OraclePayload {
    pub rules: Vec<RuleDescriptor>,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
}

/// Interpretation capability with the same typed contract as the heuristic
/// interpreter.
pub trait RuleOracle {
    /// Interpret a batch of raw rule records.
    ///
    /// # Errors
    ///
    /// Any transport failure or non-conforming payload is fatal.
    fn interpret_batch(&self, records: &[RawRuleRecord]) -> Result<OraclePayload, InterpretError>;
}

/// Parse a raw oracle response strictly.
pub fn parse_oracle_payload(raw: &str) -> Result<OraclePayload, InterpretError> {
    let payload: OraclePayload = serde_json::from_str(raw)?;
    for rule in &payload.rules {
        if !(0.0..=1.0).contains(&rule.confidence_score) {
            return Err(InterpretError::Contract(format!(
                "rule {} has confidence {} outside [0, 1]",
                rule.rule_id, rule.confidence_score
            )));
        }
    }
    Ok(payload)
}
