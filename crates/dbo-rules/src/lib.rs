//! Rule-source processing: extraction and interpretation.
//!
//! The extractor turns a loosely-structured rule spreadsheet into
//! [`dbo_model::RawRuleRecord`]s; the interpreter turns those into typed,
//! executable [`dbo_model::RuleDescriptor`]s. Interpretation is a pure
//! deterministic function of (rule text, field name); an external oracle may
//! substitute for the built-in heuristics, but only behind the same typed
//! contract and with its results cached for reproducibility.

pub mod cache;
pub mod conflict;
pub mod error;
pub mod extract;
pub mod interpret;
pub mod oracle;
pub mod split;

pub use cache::DescriptorCache;
pub use conflict::detect_conflicts;
pub use error::{ExtractError, InterpretError};
pub use extract::{Extraction, extract_rules};
pub use interpret::{HeuristicInterpreter, InterpretationOutcome};
pub use oracle::{OraclePayload, RuleOracle, parse_oracle_payload};
pub use split::SplitPolicy;
