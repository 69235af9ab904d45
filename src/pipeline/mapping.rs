use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{CanonicalAggregate, InventoryEntry, MappingRule, UnmappedEntry};
use crate::rules::CompiledRule;

/// Output of the mapping stage.
#[derive(Debug, Default)]
pub struct Aggregation {
    /// Sorted by canonical name.
    pub aggregates: Vec<CanonicalAggregate>,
    /// Sorted by device count, highest first.
    pub unmapped: Vec<UnmappedEntry>,
}

/// First mapping rule, in stored order, whose pattern matches the trimmed name.
pub fn resolve_mapping<'a>(
    name: &str,
    rules: &'a [CompiledRule<MappingRule>],
) -> Option<&'a MappingRule> {
    let name = name.trim();
    rules
        .iter()
        .find(|compiled| compiled.matches(name))
        .map(|compiled| &compiled.rule)
}

/// Resolve each surviving entry to a canonical name and fold repeated hits together.
///
/// The rule that first creates an aggregate fixes its category, deployment
/// type and description; later rules resolving to the same name only add entries.
pub fn resolve_and_aggregate<I>(entries: I, rules: &[CompiledRule<MappingRule>]) -> Aggregation
where
    I: IntoIterator<Item = InventoryEntry>,
{
    let mut aggregates: Vec<CanonicalAggregate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut unmapped = Vec::new();

    for entry in entries {
        let Some(rule) = resolve_mapping(&entry.name, rules) else {
            unmapped.push(UnmappedEntry {
                name: entry.name,
                publisher: entry.publisher,
                device_count: entry.device_count,
            });
            continue;
        };

        let slot = *index.entry(rule.canonical_name.clone()).or_insert_with(|| {
            aggregates.push(CanonicalAggregate::seeded_from(rule));
            aggregates.len() - 1
        });
        aggregates[slot].push(entry);
    }

    for aggregate in &mut aggregates {
        aggregate.finish();
    }
    aggregates.sort_by(|a, b| compare_names(&a.canonical_name, &b.canonical_name));
    unmapped.sort_by(|a, b| b.device_count.cmp(&a.device_count));

    Aggregation {
        aggregates,
        unmapped,
    }
}

/// Dictionary-style ordering: case-insensitive first, exact string breaks ties.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeploymentType, PatternType};
    use crate::rules::RuleSet;

    fn rule(
        id: u64,
        pattern_type: PatternType,
        pattern: &str,
        canonical: &str,
        category: &str,
        deployment: Option<DeploymentType>,
    ) -> MappingRule {
        MappingRule {
            id,
            pattern_type,
            original_pattern: pattern.to_string(),
            canonical_name: canonical.to_string(),
            category: category.to_string(),
            deployment_type: deployment,
            description: format!("from rule {id}"),
            active: true,
        }
    }

    #[test]
    fn test_ams360_revisions_collapse() {
        let set = RuleSet::builtin();
        let out = resolve_and_aggregate(
            vec![
                InventoryEntry::new("AMS360 Client Rev 9", "Vertafore", 3),
                InventoryEntry::new("AMS360 Client Rev 10", "Vertafore", 4),
            ],
            set.mappings(),
        );
        assert_eq!(out.aggregates.len(), 1);
        let agg = &out.aggregates[0];
        assert_eq!(agg.canonical_name, "AMS360");
        assert_eq!(agg.original_count, 2);
        assert_eq!(agg.total_devices, 7);
        assert_eq!(agg.original_entries[0].name, "AMS360 Client Rev 9");
        assert!(out.unmapped.is_empty());
    }

    #[test]
    fn test_first_creating_rule_seeds_metadata() {
        let set = RuleSet::new(
            Vec::new(),
            vec![
                rule(1, PatternType::StartsWith, "Zoom Workplace", "Zoom", "Collaboration", Some(DeploymentType::Both)),
                rule(2, PatternType::Contains, "zoom", "Zoom", "Video", Some(DeploymentType::SaaS)),
            ],
        );

        let out = resolve_and_aggregate(
            vec![
                InventoryEntry::new("Zoom Outlook Plugin", "", 1),
                InventoryEntry::new("Zoom Workplace", "", 1),
            ],
            set.mappings(),
        );
        let agg = &out.aggregates[0];
        assert_eq!(agg.category, "Video");
        assert_eq!(agg.deployment_type, DeploymentType::SaaS);
        assert_eq!(agg.description, "from rule 2");
        assert_eq!(agg.original_count, 2);
    }

    #[test]
    fn test_earlier_rule_wins_between_canonical_names() {
        let reader = rule(1, PatternType::StartsWith, "Adobe Acrobat Reader", "Adobe Acrobat Reader", "PDF", None);
        let acrobat = rule(2, PatternType::StartsWith, "Adobe Acrobat", "Adobe Acrobat", "PDF", None);
        let entries = || vec![InventoryEntry::new("Adobe Acrobat Reader DC", "Adobe", 5)];

        let specific_first = RuleSet::new(Vec::new(), vec![reader.clone(), acrobat.clone()]);
        let out = resolve_and_aggregate(entries(), specific_first.mappings());
        assert_eq!(out.aggregates.len(), 1);
        assert_eq!(out.aggregates[0].canonical_name, "Adobe Acrobat Reader");

        let general_first = RuleSet::new(Vec::new(), vec![acrobat, reader]);
        let out = resolve_and_aggregate(entries(), general_first.mappings());
        assert_eq!(out.aggregates.len(), 1);
        assert_eq!(out.aggregates[0].canonical_name, "Adobe Acrobat");
        assert_eq!(
            resolve_mapping("Adobe Acrobat Reader DC", general_first.mappings()).map(|r| r.id),
            Some(2)
        );
    }

    #[test]
    fn test_seed_defaults_when_rule_blank() {
        let set = RuleSet::new(
            Vec::new(),
            vec![rule(1, PatternType::Exact, "foo", "Foo", "", None)],
        );
        let out = resolve_and_aggregate(vec![InventoryEntry::new("FOO", "", 1)], set.mappings());
        assert_eq!(out.aggregates[0].category, "Uncategorized");
        assert_eq!(out.aggregates[0].deployment_type, DeploymentType::Desktop);
    }

    #[test]
    fn test_sorting() {
        let set = RuleSet::new(
            Vec::new(),
            vec![
                rule(1, PatternType::Exact, "b", "bravo", "", None),
                rule(2, PatternType::Exact, "a", "Alpha", "", None),
                rule(3, PatternType::Exact, "c", "Charlie", "", None),
            ],
        );
        let out = resolve_and_aggregate(
            vec![
                InventoryEntry::new("c", "", 1),
                InventoryEntry::new("b", "", 1),
                InventoryEntry::new("a", "", 1),
                InventoryEntry::new("x", "", 2),
                InventoryEntry::new("y", "", 9),
                InventoryEntry::new("z", "", 2),
            ],
            set.mappings(),
        );
        let names: Vec<_> = out.aggregates.iter().map(|a| a.canonical_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "bravo", "Charlie"]);

        let unmapped: Vec<_> = out.unmapped.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(unmapped, vec!["y", "x", "z"]);
    }

    #[test]
    fn test_canonical_names_case_sensitive() {
        let set = RuleSet::new(
            Vec::new(),
            vec![
                rule(1, PatternType::Exact, "one", "Tool", "", None),
                rule(2, PatternType::Exact, "two", "TOOL", "", None),
            ],
        );
        let out = resolve_and_aggregate(
            vec![InventoryEntry::new("one", "", 1), InventoryEntry::new("two", "", 1)],
            set.mappings(),
        );
        assert_eq!(out.aggregates.len(), 2);
    }
}
