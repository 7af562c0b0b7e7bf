//! Tiered field-name resolution against a sheet's actual columns.
//!
//! Resolution order: exact match, canonical match, core match (parenthesized
//! suffixes dropped), domain synonym table, then fuzzy similarity with a
//! configurable acceptance threshold. An unresolved field is reported to the
//! caller as `None`, never as an error.

use rapidfuzz::distance::levenshtein;
use serde::{Deserialize, Serialize};

use crate::normalize::{canonical_name, core_name};
use crate::synonyms::DEFAULT_SYNONYMS;

/// How a field was resolved, for match statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Exact,
    Canonical,
    Core,
    Synonym,
    Similarity,
}

/// A resolved column with its match score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    pub column: String,
    pub score: f64,
    pub method: MatchMethod,
}

/// Similarity between two names on their canonical forms, in [0, 1].
///
/// Equal canonical forms score 1.0; substring containment short-circuits to
/// a fixed 0.9; otherwise normalized Levenshtein similarity. Case is folded
/// before scoring.
pub fn similarity(a: &str, b: &str) -> f64 {
    let ca = canonical_name(a).to_lowercase();
    let cb = canonical_name(b).to_lowercase();
    if ca.is_empty() || cb.is_empty() {
        return 0.0;
    }
    if ca == cb {
        return 1.0;
    }
    if ca.contains(&cb) || cb.contains(&ca) {
        return 0.9;
    }
    levenshtein::normalized_similarity(ca.chars(), cb.chars())
}

/// Resolver from rule-authored field names to dataset column names.
#[derive(Debug, Clone)]
pub struct FieldMatcher {
    threshold: f64,
    synonyms: Vec<(String, String)>,
}

impl Default for FieldMatcher {
    fn default() -> Self {
        Self::new(0.6)
    }
}

impl FieldMatcher {
    /// Create a matcher with the default synonym table.
    pub fn new(threshold: f64) -> Self {
        let synonyms = DEFAULT_SYNONYMS
            .iter()
            .map(|(a, b)| ((*a).to_string(), (*b).to_string()))
            .collect();
        Self { threshold, synonyms }
    }

    /// Replace the synonym table (pairs are bidirectional).
    #[must_use]
    pub fn with_synonyms(mut self, synonyms: Vec<(String, String)>) -> Self {
        self.synonyms = synonyms;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Find the dataset column a rule field refers to, if any.
    pub fn resolve(&self, field: &str, columns: &[String]) -> Option<FieldMatch> {
        if field.trim().is_empty() || columns.is_empty() {
            return None;
        }

        // 1. Exact string match.
        if let Some(column) = columns.iter().find(|col| col.as_str() == field) {
            return Some(FieldMatch {
                column: column.clone(),
                score: 1.0,
                method: MatchMethod::Exact,
            });
        }

        // 2. Canonical-form match.
        let canonical_field = canonical_name(field);
        if let Some(column) = columns
            .iter()
            .find(|col| canonical_name(col) == canonical_field)
        {
            return Some(FieldMatch {
                column: column.clone(),
                score: 0.95,
                method: MatchMethod::Canonical,
            });
        }

        // 3. Core match: both sides truncated at the first parenthesis.
        let core_field = core_name(field);
        if !core_field.is_empty() {
            if let Some(column) = columns.iter().find(|col| core_name(col) == core_field) {
                return Some(FieldMatch {
                    column: column.clone(),
                    score: 0.92,
                    method: MatchMethod::Core,
                });
            }
        }

        // 4. Bidirectional synonym table.
        if let Some(found) = self.resolve_synonym(field, columns) {
            return Some(found);
        }

        // 5. Fuzzy similarity, gated by the threshold.
        let mut best: Option<(usize, f64)> = None;
        for (idx, column) in columns.iter().enumerate() {
            let score = similarity(field, column);
            if best.is_none_or(|(_, max)| score > max) {
                best = Some((idx, score));
            }
        }
        match best {
            Some((idx, score)) if score >= self.threshold => Some(FieldMatch {
                column: columns[idx].clone(),
                score,
                method: MatchMethod::Similarity,
            }),
            _ => None,
        }
    }

    fn resolve_synonym(&self, field: &str, columns: &[String]) -> Option<FieldMatch> {
        let key = canonical_name(field).to_lowercase();
        for (a, b) in &self.synonyms {
            let target = if canonical_name(a).to_lowercase() == key {
                b
            } else if canonical_name(b).to_lowercase() == key {
                a
            } else {
                continue;
            };
            if let Some(column) = columns.iter().find(|col| col.as_str() == target) {
                return Some(FieldMatch {
                    column: column.clone(),
                    score: 0.95,
                    method: MatchMethod::Synonym,
                });
            }
            let canonical_target = canonical_name(target).to_lowercase();
            if let Some(column) = columns
                .iter()
                .find(|col| canonical_name(col).to_lowercase() == canonical_target)
            {
                return Some(FieldMatch {
                    column: column.clone(),
                    score: 0.9,
                    method: MatchMethod::Synonym,
                });
            }
        }
        None
    }
}
