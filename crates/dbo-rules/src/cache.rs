//! Descriptor cache for externally sourced interpretations.
//!
//! Oracle answers are materialized here keyed by (rule source identity,
//! field name, rule-text hash) so a repeated run reproduces the same
//! descriptors without asking the oracle again.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use dbo_model::RuleDescriptor;

use crate::error::InterpretError;

fn cache_key(source_id: &str, field: &str, rule_text: &str) -> String {
    let digest = Sha256::digest(rule_text.as_bytes());
    format!("{source_id}:{field}:{}", hex::encode(digest))
}

/// Reproducibility cache for interpreted descriptors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptorCache {
    entries: BTreeMap<String, Vec<RuleDescriptor>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached descriptors for one (source, field, text) triple.
    pub fn get(&self, source_id: &str, field: &str, rule_text: &str) -> Option<&[RuleDescriptor]> {
        self.entries
            .get(&cache_key(source_id, field, rule_text))
            .map(Vec::as_slice)
    }

    pub fn insert(
        &mut self,
        source_id: &str,
        field: &str,
        rule_text: &str,
        descriptors: Vec<RuleDescriptor>,
    ) {
        self.entries
            .insert(cache_key(source_id, field, rule_text), descriptors);
    }

    /// Load a cache persisted with [`DescriptorCache::save`].
    pub fn load(path: &Path) -> Result<Self, InterpretError> {
        let raw = std::fs::read_to_string(path)?;
        let cache: Self = serde_json::from_str(&raw).map_err(InterpretError::CacheFormat)?;
        debug!(entries = cache.len(), path = %path.display(), "loaded descriptor cache");
        Ok(cache)
    }

    pub fn save(&self, path: &Path) -> Result<(), InterpretError> {
        let raw = serde_json::to_string_pretty(self).map_err(InterpretError::CacheFormat)?;
        std::fs::write(path, raw)?;
        debug!(entries = self.len(), path = %path.display(), "saved descriptor cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbo_model::{Params, Provenance, RuleType};

    fn descriptor(rule_id: &str) -> RuleDescriptor {
        RuleDescriptor {
            rule_id: rule_id.to_string(),
            field_name: "employee id".to_string(),
            rule_type: RuleType::Required,
            parameters: Params::new(),
            error_message_template: "blank".to_string(),
            provenance: Provenance {
                original_text: "blank not allowed".to_string(),
                sheet_name: "Roster".to_string(),
                row_ref: "3".to_string(),
                reference_standard: None,
            },
            interpretation_summary: String::new(),
            confidence_score: 0.99,
        }
    }

    #[test]
    fn keys_are_sensitive_to_text_and_field() {
        let mut cache = DescriptorCache::new();
        cache.insert("src-1", "employee id", "blank", vec![descriptor("RULE_001")]);
        assert!(cache.get("src-1", "employee id", "blank").is_some());
        assert!(cache.get("src-1", "employee id", "duplicate").is_none());
        assert!(cache.get("src-1", "name", "blank").is_none());
        assert!(cache.get("src-2", "employee id", "blank").is_none());
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cache.json");
        let mut cache = DescriptorCache::new();
        cache.insert("src-1", "employee id", "blank", vec![descriptor("RULE_001")]);
        cache.save(&path).expect("save cache");
        let loaded = DescriptorCache::load(&path).expect("load cache");
        assert_eq!(loaded.len(), 1);
        let cached = loaded.get("src-1", "employee id", "blank").expect("entry");
        assert_eq!(cached[0].rule_id, "RULE_001");
    }

    #[test]
    fn corrupt_cache_is_a_hard_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "not json").expect("write");
        assert!(matches!(
            DescriptorCache::load(&path),
            Err(InterpretError::CacheFormat(_))
        ));
    }
}
