//! Storage boundaries the classification pipeline reads from and writes through.
//!
//! - [`memory`] — in-process stores, shared between concurrent runs.
//! - [`file`] — a TOML rules file and a JSON disposition file.
//!
//! Rule stores return only active rules, in stored order. Disposition stores
//! must provide an insert-if-absent primitive so concurrent runs that discover
//! the same canonical name end up with exactly one pending record.

pub mod file;
pub mod memory;

use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::{DispositionRecord, ExclusionRule, MappingRule, PatternType};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("record already exists for '{0}'")]
    Duplicate(String),

    #[error("invalid {kind} rule {id}: {message}")]
    InvalidRule {
        kind: &'static str,
        id: u64,
        message: String,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Source of the ordered rule lists.
pub trait RuleStore: Send + Sync {
    /// Active exclusion and mapping rules, in stored order, read from one
    /// consistent version of the store.
    fn load_rules(&self) -> Result<(Vec<ExclusionRule>, Vec<MappingRule>), StoreError>;
}

/// Lookup and lazy creation of disposition records.
pub trait DispositionStore: Send + Sync {
    /// Existing records for any of `names`. Missing names are simply absent from the result.
    fn fetch_dispositions(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<Vec<DispositionRecord>, StoreError>;

    /// Create a pending record for `name` unless one exists, and return whichever record is stored.
    fn upsert_pending_disposition(&self, name: &str) -> Result<DispositionRecord, StoreError>;

    /// Administrative update: create or overwrite the record for its canonical name.
    /// The analysis pipeline never calls this.
    fn set_disposition(&self, record: DispositionRecord) -> Result<(), StoreError>;
}

/// Mapping rules cannot use `endswith`.
pub(crate) fn validate_mapping_rules(rules: &[MappingRule]) -> Result<(), StoreError> {
    for rule in rules {
        if rule.pattern_type == PatternType::EndsWith {
            return Err(StoreError::InvalidRule {
                kind: "mapping",
                id: rule.id,
                message: "pattern type 'endswith' is not supported for mapping rules".to_string(),
            });
        }
        if rule.canonical_name.trim().is_empty() {
            return Err(StoreError::InvalidRule {
                kind: "mapping",
                id: rule.id,
                message: "canonical name is empty".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::defaults::default_mapping_rules;

    #[test]
    fn test_endswith_mapping_rejected() {
        let mut rules = default_mapping_rules();
        rules[0].pattern_type = PatternType::EndsWith;
        let err = validate_mapping_rules(&rules).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRule { id: 1, .. }));
    }

    #[test]
    fn test_builtin_mappings_valid() {
        assert!(validate_mapping_rules(&default_mapping_rules()).is_ok());
    }
}
