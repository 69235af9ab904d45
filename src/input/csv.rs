use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::models::{parse_device_count, InventoryEntry};

const NAME_HEADER: &str = "name";
const PUBLISHER_HEADER: &str = "publisher";
const COUNT_HEADER: &str = "device_count";

/// Reader for CSV exports with a header row.
///
/// Columns are found by their fixed header names `name`, `publisher` and
/// `device_count`, compared case-insensitively. Only `name` is required.
pub struct CsvSource;

impl CsvSource {
    pub fn new() -> Self {
        Self
    }
}

fn find_column(headers: &csv::StringRecord, wanted: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim().eq_ignore_ascii_case(wanted))
}

impl super::EntrySource for CsvSource {
    fn read(&self, path: &Path) -> Result<Vec<InventoryEntry>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("failed to open {}", path.display()))?;

        let headers = reader.headers()?.clone();
        let Some(name_col) = find_column(&headers, NAME_HEADER) else {
            bail!("{} has no '{}' column", path.display(), NAME_HEADER);
        };
        let publisher_col = find_column(&headers, PUBLISHER_HEADER);
        let count_col = find_column(&headers, COUNT_HEADER);

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record.with_context(|| format!("malformed row in {}", path.display()))?;
            entries.push(InventoryEntry::new(
                record.get(name_col).unwrap_or_default(),
                publisher_col.and_then(|c| record.get(c)).unwrap_or_default(),
                parse_device_count(count_col.and_then(|c| record.get(c))),
            ));
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::EntrySource;

    #[test]
    fn test_read_csv_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        std::fs::write(
            &path,
            "Name,Publisher,Device_Count\nAMS360 Client Rev 9,Vertafore,4\nNotepad++,Don Ho,abc\n,Nobody,2\n",
        )
        .unwrap();

        let entries = CsvSource::new().read(&path).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], InventoryEntry::new("AMS360 Client Rev 9", "Vertafore", 4));
        assert_eq!(entries[1].device_count, 1);
        assert_eq!(entries[2].name, "");
    }

    #[test]
    fn test_missing_count_column_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        std::fs::write(&path, "name\nSlack\n").unwrap();

        let entries = CsvSource::new().read(&path).unwrap();
        assert_eq!(entries[0].device_count, 1);
        assert_eq!(entries[0].publisher, "");
    }

    #[test]
    fn test_requires_name_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        std::fs::write(&path, "title,count\nSlack,3\n").unwrap();
        assert!(CsvSource::new().read(&path).is_err());
    }

    #[test]
    fn test_header_synonyms_not_recognised() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        std::fs::write(&path, "name,vendor,devices\nSlack,Salesforce,9\n").unwrap();

        let entries = CsvSource::new().read(&path).unwrap();
        assert_eq!(entries, vec![InventoryEntry::new("Slack", "", 1)]);

        std::fs::write(&path, "software,publisher,device_count\nSlack,Salesforce,9\n").unwrap();
        assert!(CsvSource::new().read(&path).is_err());
    }
}
