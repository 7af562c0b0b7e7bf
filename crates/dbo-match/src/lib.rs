//! Sheet and field name matching.
//!
//! Rule authors rarely spell sheet or column names exactly as the dataset
//! does: merged cells introduce newlines, explanatory code suffixes get
//! appended in parentheses, and synonyms drift between files. This crate
//! provides the whitespace-insensitive canonical form used for sheet
//! equality and a tiered field resolver that falls back to fuzzy scoring.

pub mod normalize;
pub mod resolver;
mod synonyms;

pub use normalize::{canonical_name, core_name, normalize_name};
pub use resolver::{FieldMatch, FieldMatcher, MatchMethod, similarity};
pub use synonyms::DEFAULT_SYNONYMS;
