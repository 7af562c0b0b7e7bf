//! Composite-rule splitting heuristics.
//!
//! Authors frequently pack several independent conditions into one cell
//! ("YYYYMMDD, start_date<=hire_date"), but a comma just as often separates
//! plain value enumerations ("1, 3, 4", "Y, N") that must stay whole. The
//! thresholds and keyword list here are product policy, not fixed law, so
//! they live in a configurable policy struct.

use regex::Regex;
use std::sync::OnceLock;

/// Tunable policy for composite-rule splitting.
#[derive(Debug, Clone)]
pub struct SplitPolicy {
    /// Tokens whose presence in one clause marks a splittable rule.
    pub keywords: Vec<String>,
    /// Comparison operators indicating a field-comparison clause. Ordered
    /// longest-first so "<=" is not mistaken for "<".
    pub comparison_operators: Vec<String>,
    /// A list of at most this many short tokens is a value enumeration.
    pub max_enum_items: usize,
    /// Maximum character length of a short enumeration token.
    pub max_enum_token_len: usize,
    /// A clause with no keyword must exceed this length to justify a split.
    pub min_clause_len: usize,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            keywords: [
                "YYYYMMDD",
                "YYYY-MM-DD",
                "YYYYMM",
                "YYYY/MM/DD",
                "blank",
                "duplicate",
                "required",
            ]
            .iter()
            .map(|kw| (*kw).to_string())
            .collect(),
            comparison_operators: ["<=", ">=", "==", "!=", "<", ">", "≤", "≥"]
                .iter()
                .map(|op| (*op).to_string())
                .collect(),
            max_enum_items: 5,
            max_enum_token_len: 3,
            min_clause_len: 3,
        }
    }
}

fn code_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\w+\s*:\s*[\w\s]+$").expect("code:label regex"))
}

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("numeric regex"))
}

impl SplitPolicy {
    fn contains_keyword(&self, clause: &str) -> bool {
        let lower = clause.to_lowercase();
        self.keywords.iter().any(|kw| lower.contains(&kw.to_lowercase()))
    }

    fn contains_comparison(&self, clause: &str) -> bool {
        self.comparison_operators.iter().any(|op| clause.contains(op.as_str()))
    }

    /// True when the text is a plain value enumeration that must not split:
    /// an all-numeric list, "code:label" pairs, or a short choice list.
    pub fn is_simple_value_list(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        let parts: Vec<&str> = text.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
        if parts.is_empty() {
            return false;
        }

        // "1: retired, 2: converted" style code lists.
        if text.contains(':') && text.contains(',') && parts.iter().all(|p| code_label_re().is_match(p))
        {
            return true;
        }

        // "1, 3, 4" style numeric lists.
        if parts.iter().all(|p| numeric_re().is_match(p)) {
            return true;
        }

        // "Y, N" style short choice lists.
        parts.len() <= self.max_enum_items
            && parts.iter().all(|p| p.chars().count() <= self.max_enum_token_len)
    }

    /// Decide whether a rule text holds several independent sub-rules.
    pub fn should_split(&self, rule_text: &str) -> bool {
        let text = rule_text.trim();
        if text.is_empty() || self.is_simple_value_list(text) || !text.contains(',') {
            return false;
        }

        let parts: Vec<&str> = text.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
        if parts.len() < 2 {
            return false;
        }

        let has_keyword = parts.iter().any(|p| self.contains_keyword(p));
        let has_comparison = parts.iter().any(|p| self.contains_comparison(p));

        if has_keyword && has_comparison {
            return true;
        }

        if has_keyword {
            let keyword_count = parts.iter().filter(|p| self.contains_keyword(p)).count();
            if parts.len() > keyword_count {
                // Only split when the keyword-free remainder is substantive.
                let substantive = parts.iter().any(|p| {
                    !self.contains_keyword(p) && p.chars().count() > self.min_clause_len
                });
                if substantive {
                    return true;
                }
            }
        }

        has_comparison
    }

    /// Split a composite rule into its clauses, preserving order.
    pub fn split(&self, rule_text: &str) -> Vec<String> {
        let text = rule_text.trim();
        let parts: Vec<String> = text
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();
        if parts.len() > 1 {
            parts
        } else {
            vec![text.to_string()]
        }
    }
}
