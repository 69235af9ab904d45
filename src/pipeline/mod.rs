//! The classification pipeline.
//!
//! - [`exclusion`] — drops noise entries on the first matching exclusion rule.
//! - [`mapping`] — resolves canonical names and aggregates repeated hits.
//! - [`disposition`] — joins aggregates with administrative dispositions.
//!
//! Each analysis run takes its own [`RuleSet`] snapshot and walks the input
//! once. Every entry with a non-blank name lands in exactly one of the
//! excluded, included or unmapped buckets.

pub mod disposition;
pub mod exclusion;
pub mod mapping;

use anyhow::Result;

use crate::models::{Analysis, CanonicalAggregate, ExcludedEntry, InventoryEntry, UnmappedEntry};
use crate::rules::RuleSet;
use crate::store::{DispositionStore, RuleStore};

/// Rule-driven outcome for one input, before dispositions are attached.
#[derive(Debug, Default)]
pub struct Classification {
    pub aggregates: Vec<CanonicalAggregate>,
    pub excluded: Vec<ExcludedEntry>,
    pub unmapped: Vec<UnmappedEntry>,
}

/// Run the exclusion and mapping stages over `entries`.
pub fn classify(entries: &[InventoryEntry], rules: &RuleSet) -> Classification {
    let mut excluded = Vec::new();
    let mut surviving = Vec::new();

    for entry in entries {
        let name = entry.name.trim();
        if name.is_empty() {
            tracing::debug!(publisher = %entry.publisher, "skipping entry with blank name");
            continue;
        }

        let entry = InventoryEntry::new(name, entry.publisher.trim(), entry.device_count);

        match exclusion::classify_exclusion(&entry, rules.exclusions()) {
            Some(rule) => excluded.push(ExcludedEntry {
                name: entry.name,
                reason: rule.category.clone(),
                rule_reason: rule.reason.clone(),
            }),
            None => surviving.push(entry),
        }
    }

    let aggregation = mapping::resolve_and_aggregate(surviving, rules.mappings());

    Classification {
        aggregates: aggregation.aggregates,
        excluded,
        unmapped: aggregation.unmapped,
    }
}

/// Classify `entries` against a given snapshot and attach dispositions.
pub fn analyze_with_rules(
    entries: &[InventoryEntry],
    rules: &RuleSet,
    dispositions: &dyn DispositionStore,
) -> Analysis {
    let classification = classify(entries, rules);

    tracing::info!(
        included = classification.aggregates.len(),
        excluded = classification.excluded.len(),
        unmapped = classification.unmapped.len(),
        "classification finished"
    );

    Analysis {
        included: disposition::enrich(classification.aggregates, dispositions),
        excluded: classification.excluded,
        unmapped: classification.unmapped,
    }
}

/// Full analysis run: snapshot the rules, classify, enrich.
///
/// A rule-store failure aborts the run; nothing is classified without rules.
pub fn analyze(
    entries: &[InventoryEntry],
    rules: &dyn RuleStore,
    dispositions: &dyn DispositionStore,
) -> Result<Analysis> {
    let snapshot = RuleSet::load(rules)?;
    Ok(analyze_with_rules(entries, &snapshot, dispositions))
}
