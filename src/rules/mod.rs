//! Rule sets and the pattern matcher that evaluates them.
//!
//! - [`matcher`] — case-insensitive evaluation of one pattern against one name.
//! - [`defaults`] — built-in exclusion and mapping rules used when no rules file is configured.
//!
//! A [`RuleSet`] is an immutable snapshot taken once per analysis run, so
//! administrative edits to the rule store never leak into a run in flight.

pub mod defaults;
pub mod matcher;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{ExclusionRule, MappingRule, PatternType};
use crate::store::RuleStore;
use matcher::CompiledPattern;

/// Access to the pattern half of a rule, shared by exclusion and mapping rules.
pub trait PatternRule {
    const KIND: &'static str;

    fn id(&self) -> u64;
    fn pattern(&self) -> &str;
    fn pattern_type(&self) -> PatternType;
    fn is_active(&self) -> bool;
    /// What a match produces: the exclusion category or the canonical name.
    fn outcome(&self) -> &str;
}

impl PatternRule for ExclusionRule {
    const KIND: &'static str = "exclusion";

    fn id(&self) -> u64 {
        self.id
    }
    fn pattern(&self) -> &str {
        &self.pattern_value
    }
    fn pattern_type(&self) -> PatternType {
        self.pattern_type
    }
    fn is_active(&self) -> bool {
        self.active
    }
    fn outcome(&self) -> &str {
        &self.category
    }
}

impl PatternRule for MappingRule {
    const KIND: &'static str = "mapping";

    fn id(&self) -> u64 {
        self.id
    }
    fn pattern(&self) -> &str {
        &self.original_pattern
    }
    fn pattern_type(&self) -> PatternType {
        self.pattern_type
    }
    fn is_active(&self) -> bool {
        self.active
    }
    fn outcome(&self) -> &str {
        &self.canonical_name
    }
}

/// A rule together with its compiled pattern.
#[derive(Debug, Clone)]
pub struct CompiledRule<R> {
    pub rule: R,
    pattern: CompiledPattern,
}

impl<R: PatternRule> CompiledRule<R> {
    pub fn new(rule: R) -> Self {
        let pattern = CompiledPattern::compile_or_invalid(rule.pattern(), rule.pattern_type());
        if let CompiledPattern::Invalid { error, .. } = &pattern {
            tracing::warn!(
                kind = R::KIND,
                rule_id = rule.id(),
                pattern = rule.pattern(),
                error = %error,
                "rule has an invalid regex and will never match"
            );
        }
        Self { rule, pattern }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }
}

/// A rule whose regex could not be compiled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidPattern {
    pub kind: &'static str,
    pub rule_id: u64,
    pub pattern: String,
    pub error: String,
}

/// Ordered, read-only rule snapshot for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    exclusions: Vec<CompiledRule<ExclusionRule>>,
    mappings: Vec<CompiledRule<MappingRule>>,
}

impl RuleSet {
    /// Build a snapshot, keeping stored order and dropping inactive rules.
    pub fn new(exclusions: Vec<ExclusionRule>, mappings: Vec<MappingRule>) -> Self {
        Self {
            exclusions: compile_active(exclusions),
            mappings: compile_active(mappings),
        }
    }

    /// Take a fresh snapshot from the rule store. Failure here is fatal to the run.
    pub fn load(store: &dyn RuleStore) -> Result<Self> {
        let (exclusions, mappings) = store.load_rules().context("failed to load rules")?;

        tracing::debug!(
            exclusions = exclusions.len(),
            mappings = mappings.len(),
            "loaded rule snapshot"
        );

        Ok(Self::new(exclusions, mappings))
    }

    /// Built-in rules, see [`defaults`].
    #[cfg(test)]
    pub fn builtin() -> Self {
        Self::new(
            defaults::default_exclusion_rules(),
            defaults::default_mapping_rules(),
        )
    }

    pub fn exclusions(&self) -> &[CompiledRule<ExclusionRule>] {
        &self.exclusions
    }

    pub fn mappings(&self) -> &[CompiledRule<MappingRule>] {
        &self.mappings
    }

    /// Every rule that matches `name`, in evaluation order.
    ///
    /// Patterns are evaluated from their source text rather than the compiled
    /// form, so a bad regex is reported again here.
    pub fn explain(&self, name: &str) -> Explanation {
        let name = name.trim();
        Explanation {
            name: name.to_string(),
            exclusions: self.exclusions.iter().filter_map(|r| rule_hit(r, name)).collect(),
            mappings: self.mappings.iter().filter_map(|r| rule_hit(r, name)).collect(),
        }
    }

    /// Every rule in the snapshot whose regex failed to compile.
    pub fn invalid_patterns(&self) -> Vec<InvalidPattern> {
        let exclusions = self.exclusions.iter().filter_map(invalid_pattern);
        let mappings = self.mappings.iter().filter_map(invalid_pattern);
        exclusions.chain(mappings).collect()
    }
}

/// One rule matching an explained name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleHit {
    pub kind: &'static str,
    pub rule_id: u64,
    pub pattern_type: PatternType,
    pub pattern: String,
    pub outcome: String,
}

/// All rules matching one name. Exclusions are checked before mappings and
/// the first hit wins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub name: String,
    pub exclusions: Vec<RuleHit>,
    pub mappings: Vec<RuleHit>,
}

impl Explanation {
    /// The rule that decides the entry, or `None` when it stays unmapped.
    pub fn winner(&self) -> Option<&RuleHit> {
        self.exclusions.first().or_else(|| self.mappings.first())
    }
}

fn rule_hit<R: PatternRule>(compiled: &CompiledRule<R>, name: &str) -> Option<RuleHit> {
    let rule = &compiled.rule;
    matcher::matches(name, rule.pattern(), rule.pattern_type()).then(|| RuleHit {
        kind: R::KIND,
        rule_id: rule.id(),
        pattern_type: rule.pattern_type(),
        pattern: rule.pattern().to_string(),
        outcome: rule.outcome().to_string(),
    })
}

fn compile_active<R: PatternRule>(rules: Vec<R>) -> Vec<CompiledRule<R>> {
    rules
        .into_iter()
        .filter(|r| r.is_active())
        .map(CompiledRule::new)
        .collect()
}

fn invalid_pattern<R: PatternRule>(compiled: &CompiledRule<R>) -> Option<InvalidPattern> {
    match &compiled.pattern {
        CompiledPattern::Invalid { pattern, error } => Some(InvalidPattern {
            kind: R::KIND,
            rule_id: compiled.rule.id(),
            pattern: pattern.clone(),
            error: error.clone(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    struct OfflineRules;

    impl RuleStore for OfflineRules {
        fn load_rules(&self) -> Result<(Vec<ExclusionRule>, Vec<MappingRule>), StoreError> {
            Err(StoreError::Unavailable("rules offline".into()))
        }
    }

    fn exclusion(id: u64, pattern_type: PatternType, value: &str, active: bool) -> ExclusionRule {
        ExclusionRule {
            id,
            pattern_type,
            pattern_value: value.to_string(),
            category: "Noise".to_string(),
            reason: String::new(),
            active,
        }
    }

    #[test]
    fn test_inactive_rules_dropped_order_kept() {
        let set = RuleSet::new(
            vec![
                exclusion(3, PatternType::Contains, "c", true),
                exclusion(1, PatternType::Contains, "a", false),
                exclusion(2, PatternType::Contains, "b", true),
            ],
            Vec::new(),
        );
        let ids: Vec<u64> = set.exclusions().iter().map(|r| r.rule.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn test_invalid_patterns_reported() {
        let set = RuleSet::new(
            vec![
                exclusion(1, PatternType::Regex, "(", true),
                exclusion(2, PatternType::Regex, "ok.*", true),
            ],
            Vec::new(),
        );
        let invalid = set.invalid_patterns();
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].rule_id, 1);
        assert_eq!(invalid[0].kind, "exclusion");
    }

    #[test]
    fn test_builtin_rules_compile() {
        let set = RuleSet::builtin();
        assert!(!set.exclusions().is_empty());
        assert!(!set.mappings().is_empty());
        assert!(set.invalid_patterns().is_empty());
    }

    #[test]
    fn test_load_takes_both_lists_from_store() {
        let store = crate::store::memory::MemoryRuleStore::builtin();
        let set = RuleSet::load(&store).unwrap();
        let builtin = RuleSet::builtin();
        assert_eq!(set.exclusions().len(), builtin.exclusions().len());
        assert_eq!(set.mappings().len(), builtin.mappings().len());
    }

    #[test]
    fn test_explain_lists_every_hit_and_winner() {
        let set = RuleSet::builtin();

        let reader = set.explain("  Adobe Acrobat Reader DC ");
        assert_eq!(reader.name, "Adobe Acrobat Reader DC");
        assert!(reader.exclusions.is_empty());
        let outcomes: Vec<&str> = reader.mappings.iter().map(|h| h.outcome.as_str()).collect();
        assert_eq!(outcomes, vec!["Adobe Acrobat Reader", "Adobe Acrobat"]);
        assert_eq!(reader.winner().unwrap().outcome, "Adobe Acrobat Reader");

        let update = set.explain("Security Update for Windows (KB5031356)");
        assert_eq!(update.winner().unwrap().kind, "exclusion");

        assert!(set.explain("TotallyUnknownApp").winner().is_none());
    }

    #[derive(Clone, Default)]
    struct SharedBuf(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuf {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_bad_regex_warns_once_per_snapshot() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let rule = CompiledRule::new(exclusion(7, PatternType::Regex, "([unclosed", true));
            for name in ["a", "b", "c"] {
                assert!(!rule.matches(name));
            }
        });

        let output = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("WARN").count(), 1, "{output}");
    }

    #[test]
    fn test_load_propagates_store_failure() {
        let err = RuleSet::load(&OfflineRules).unwrap_err();
        assert!(format!("{err:#}").contains("rules offline"));
    }
}
