pub mod conflict;
pub mod error;
pub mod finding;
pub mod reference;
pub mod rule;
pub mod sheet;

pub use conflict::{Conflict, ConflictSeverity, ConflictType};
pub use error::{ModelError, Result};
pub use finding::{Finding, FindingGroup, ValidationSummary};
pub use reference::{ReferenceClause, reference_for_field};
pub use rule::{
    Params, PrefilledInterpretation, Provenance, RawRuleRecord, RuleDescriptor, RuleType,
    param_f64, param_str, param_str_list,
};
pub use sheet::{RawSheet, Sheet, is_missing};
