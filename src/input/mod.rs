use std::path::Path;

use anyhow::Result;

use crate::models::InventoryEntry;

pub mod csv;
pub mod json;

/// Reads already-structured inventory rows from a file.
pub trait EntrySource {
    fn read(&self, path: &Path) -> Result<Vec<InventoryEntry>>;
}
