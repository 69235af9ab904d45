//! Report renderers for analysis results.
//!
//! - [`terminal`] — summary box plus included/unmapped/excluded tables; respects `--verbose` / `--quiet`.
//!
//! JSON output is a straight `serde_json` dump of [`FileReport`]s.

pub mod terminal;

use std::path::PathBuf;

use serde::Serialize;

use crate::models::{Analysis, Disposition};

/// Counters derived from one analysis, computed outside the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_input: usize,
    pub total_output: usize,
    pub excluded_count: usize,
    pub unmapped_count: usize,
    pub pending_disposition_count: usize,
}

impl Summary {
    pub fn from_analysis(total_input: usize, analysis: &Analysis) -> Self {
        Self {
            total_input,
            total_output: analysis.included.len(),
            excluded_count: analysis.excluded.len(),
            unmapped_count: analysis.unmapped.len(),
            pending_disposition_count: analysis
                .included
                .iter()
                .filter(|p| p.disposition == Disposition::Pending)
                .count(),
        }
    }
}

/// Everything reported for one input file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub source: PathBuf,
    pub summary: Summary,
    pub analysis: Analysis,
}

impl FileReport {
    pub fn new(source: PathBuf, total_input: usize, analysis: Analysis) -> Self {
        Self {
            source,
            summary: Summary::from_analysis(total_input, &analysis),
            analysis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InventoryEntry;
    use crate::pipeline::analyze_with_rules;
    use crate::rules::RuleSet;
    use crate::store::memory::MemoryDispositionStore;
    use crate::store::DispositionStore;

    #[test]
    fn test_summary_counts() {
        let entries = vec![
            InventoryEntry::new("Security Update for Windows (KB5000001)", "", 1),
            InventoryEntry::new("Slack", "", 2),
            InventoryEntry::new("Slack Beta", "", 1),
            InventoryEntry::new("Zoom", "", 1),
            InventoryEntry::new("Homegrown Thing", "", 1),
            InventoryEntry::new("", "", 1),
        ];

        let mut zoom = crate::models::DispositionRecord::pending("Zoom");
        zoom.disposition = Disposition::Approved;
        let store = MemoryDispositionStore::new();
        store.set_disposition(zoom).unwrap();

        let analysis = analyze_with_rules(&entries, &RuleSet::builtin(), &store);
        let summary = Summary::from_analysis(entries.len(), &analysis);

        assert_eq!(
            summary,
            Summary {
                total_input: 6,
                total_output: 2,
                excluded_count: 1,
                unmapped_count: 1,
                pending_disposition_count: 1,
            }
        );
    }
}
