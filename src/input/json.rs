use std::path::Path;

use anyhow::{Context, Result};

use crate::models::InventoryEntry;

/// Reader for a JSON array of `{name, publisher, device_count}` objects.
pub struct JsonSource;

impl JsonSource {
    pub fn new() -> Self {
        Self
    }
}

impl super::EntrySource for JsonSource {
    fn read(&self, path: &Path) -> Result<Vec<InventoryEntry>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let entries: Vec<InventoryEntry> = serde_json::from_str(&content)
            .with_context(|| format!("{} is not a JSON array of inventory rows", path.display()))?;
        Ok(entries)
    }
}
