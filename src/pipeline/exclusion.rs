use crate::models::{ExclusionRule, InventoryEntry};
use crate::rules::CompiledRule;

/// First exclusion rule, in stored order, whose pattern matches the entry's trimmed name.
pub fn classify_exclusion<'a>(
    entry: &InventoryEntry,
    rules: &'a [CompiledRule<ExclusionRule>],
) -> Option<&'a ExclusionRule> {
    let name = entry.name.trim();
    rules
        .iter()
        .find(|compiled| compiled.matches(name))
        .map(|compiled| &compiled.rule)
}
