use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::models::{DispositionRecord, ExclusionRule, MappingRule};

use super::{validate_mapping_rules, DispositionStore, RuleStore, StoreError};

/// On-disk layout of a rules file.
///
/// ```toml
/// [[exclusion]]
/// pattern_type = "startswith"
/// pattern_value = "Security Update for"
/// category = "Windows Updates"
/// reason = "OS patch"
///
/// [[mapping]]
/// pattern_type = "contains"
/// original_pattern = "Zoom"
/// canonical_name = "Zoom"
/// deployment_type = "Both"
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RulesFile {
    #[serde(default)]
    pub exclusion: Vec<ExclusionRule>,
    #[serde(default)]
    pub mapping: Vec<MappingRule>,
}

impl RulesFile {
    /// Rules without an explicit id take their 1-based position in the file.
    fn assign_ids(&mut self) {
        for (i, rule) in self.exclusion.iter_mut().enumerate() {
            if rule.id == 0 {
                rule.id = i as u64 + 1;
            }
        }
        for (i, rule) in self.mapping.iter_mut().enumerate() {
            if rule.id == 0 {
                rule.id = i as u64 + 1;
            }
        }
    }
}

/// Rule store backed by a TOML file, re-read on every load.
#[derive(Debug, Clone)]
pub struct TomlRuleStore {
    path: PathBuf,
}

impl TomlRuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<RulesFile, StoreError> {
        let content = read_file(&self.path)?;
        let mut file: RulesFile = toml::from_str(&content)?;
        file.assign_ids();
        validate_mapping_rules(&file.mapping)?;
        Ok(file)
    }
}

impl RuleStore for TomlRuleStore {
    fn load_rules(&self) -> Result<(Vec<ExclusionRule>, Vec<MappingRule>), StoreError> {
        let file = self.read()?;
        Ok((
            file.exclusion.into_iter().filter(|r| r.active).collect(),
            file.mapping.into_iter().filter(|r| r.active).collect(),
        ))
    }
}

/// Disposition records kept as a JSON array on disk.
///
/// Writes go through a temp file and a rename. Pending records are created
/// by try-insert; a duplicate means another run got there first.
#[derive(Debug)]
pub struct JsonDispositionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonDispositionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<Vec<DispositionRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = read_file(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_all(&self, records: &[DispositionRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(records)?;
        std::fs::write(&tmp, body).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Insert a new record, failing with [`StoreError::Duplicate`] if the name is taken.
    pub fn insert(&self, record: DispositionRecord) -> Result<DispositionRecord, StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| lock_poisoned())?;
        let mut records = self.read_all()?;
        if records.iter().any(|r| r.canonical_name == record.canonical_name) {
            return Err(StoreError::Duplicate(record.canonical_name));
        }
        records.push(record.clone());
        self.write_all(&records)?;
        Ok(record)
    }
}

impl DispositionStore for JsonDispositionStore {
    fn fetch_dispositions(
        &self,
        names: &BTreeSet<String>,
    ) -> Result<Vec<DispositionRecord>, StoreError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| names.contains(&r.canonical_name))
            .collect())
    }

    fn upsert_pending_disposition(&self, name: &str) -> Result<DispositionRecord, StoreError> {
        match self.insert(DispositionRecord::pending(name)) {
            Ok(record) => Ok(record),
            Err(StoreError::Duplicate(_)) => {
                let names = BTreeSet::from([name.to_string()]);
                self.fetch_dispositions(&names)?
                    .into_iter()
                    .next()
                    .ok_or_else(|| StoreError::Unavailable(format!("record for '{name}' vanished")))
            }
            Err(e) => Err(e),
        }
    }

    fn set_disposition(&self, record: DispositionRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| lock_poisoned())?;
        let mut records = self.read_all()?;
        match records
            .iter_mut()
            .find(|r| r.canonical_name == record.canonical_name)
        {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.write_all(&records)
    }
}

fn read_file(path: &Path) -> Result<String, StoreError> {
    std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn lock_poisoned() -> StoreError {
    StoreError::Unavailable("disposition file lock poisoned".to_string())
}
