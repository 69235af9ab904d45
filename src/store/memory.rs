use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, RwLock};

use crate::models::{DispositionRecord, ExclusionRule, MappingRule};
use crate::rules::defaults::{default_exclusion_rules, default_mapping_rules};

use super::{DispositionStore, RuleStore, StoreError};

/// Rule store held in memory. Both lists sit behind one lock so a load
/// always sees a single version of the rules.
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    rules: RwLock<(Vec<ExclusionRule>, Vec<MappingRule>)>,
}

impl MemoryRuleStore {
    /// Store seeded with the built-in rules.
    pub fn builtin() -> Self {
        Self {
            rules: RwLock::new((default_exclusion_rules(), default_mapping_rules())),
        }
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

impl RuleStore for MemoryRuleStore {
    fn load_rules(&self) -> Result<(Vec<ExclusionRule>, Vec<MappingRule>), StoreError> {
        let guard = self.rules.read().map_err(|_| poisoned())?;
        let (exclusions, mappings) = &*guard;
        Ok((
            exclusions.iter().filter(|r| r.active).cloned().collect(),
            mappings.iter().filter(|r| r.active).cloned().collect(),
        ))
    }
}

/// Disposition records keyed by canonical name, shared across runs.
#[derive(Debug, Default)]
pub struct MemoryDispositionStore {
    records: Mutex<HashMap<String, DispositionRecord>>,
}

impl MemoryDispositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.records.lock().map(|g| g.len()).unwrap_or(0)
    }
}

impl DispositionStore for MemoryDispositionStore {
    fn fetch_dispositions(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<Vec<DispositionRecord>, StoreError> {
        let guard = self.records.lock().map_err(|_| poisoned())?;
        Ok(names.iter().filter_map(|n| guard.get(n).cloned()).collect())
    }

    fn upsert_pending_disposition(&self, name: &str) -> Result<DispositionRecord, StoreError> {
        let mut guard = self.records.lock().map_err(|_| poisoned())?;
        let record = guard
            .entry(name.to_string())
            .or_insert_with(|| DispositionRecord::pending(name));
        Ok(record.clone())
    }

    fn set_disposition(&self, record: DispositionRecord) -> Result<(), StoreError> {
        let mut guard = self.records.lock().map_err(|_| poisoned())?;
        guard.insert(record.canonical_name.clone(), record);
        Ok(())
    }
}
