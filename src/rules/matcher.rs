use regex::{Regex, RegexBuilder};

use crate::models::PatternType;

/// Evaluate one pattern against one (already trimmed) name.
///
/// Every pattern type compares case-insensitively. An invalid regex never
/// matches and is reported as a warning.
pub fn matches(name: &str, pattern: &str, pattern_type: PatternType) -> bool {
    match CompiledPattern::compile(pattern, pattern_type) {
        Ok(compiled) => compiled.is_match(name),
        Err(err) => {
            tracing::warn!(pattern, error = %err, "invalid regex pattern, treating as non-match");
            false
        }
    }
}

/// A pattern prepared once so a rule can be evaluated against many names.
#[derive(Debug, Clone)]
pub enum CompiledPattern {
    Exact(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    Regex(Regex),
    /// Regex that failed to compile; never matches.
    Invalid { pattern: String, error: String },
}

impl CompiledPattern {
    pub fn compile(pattern: &str, pattern_type: PatternType) -> Result<Self, regex::Error> {
        let lower = pattern.to_lowercase();
        let compiled = match pattern_type {
            PatternType::Exact => CompiledPattern::Exact(lower),
            PatternType::Contains => CompiledPattern::Contains(lower),
            PatternType::StartsWith => CompiledPattern::StartsWith(lower),
            PatternType::EndsWith => CompiledPattern::EndsWith(lower),
            PatternType::Regex => {
                CompiledPattern::Regex(RegexBuilder::new(pattern).case_insensitive(true).build()?)
            }
        };
        Ok(compiled)
    }

    /// Like [`CompiledPattern::compile`], but folds a bad regex into [`CompiledPattern::Invalid`].
    pub fn compile_or_invalid(pattern: &str, pattern_type: PatternType) -> Self {
        Self::compile(pattern, pattern_type).unwrap_or_else(|err| CompiledPattern::Invalid {
            pattern: pattern.to_string(),
            error: err.to_string(),
        })
    }

    pub fn is_match(&self, name: &str) -> bool {
        match self {
            CompiledPattern::Exact(p) => name.to_lowercase() == *p,
            CompiledPattern::Contains(p) => name.to_lowercase().contains(p.as_str()),
            CompiledPattern::StartsWith(p) => name.to_lowercase().starts_with(p.as_str()),
            CompiledPattern::EndsWith(p) => name.to_lowercase().ends_with(p.as_str()),
            CompiledPattern::Regex(re) => re.is_match(name),
            CompiledPattern::Invalid { pattern, error } => {
                tracing::debug!(pattern = %pattern, error = %error, "skipping rule with invalid regex");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_is_case_insensitive() {
        assert!(matches("Google Chrome", "google chrome", PatternType::Exact));
        assert!(!matches("Google Chrome Beta", "google chrome", PatternType::Exact));
    }

    #[test]
    fn test_startswith_any_case() {
        for name in ["GOOGLE CHROME", "Google Chrome", "google chrome"] {
            assert!(matches(name, "Google Chrome", PatternType::StartsWith), "{name}");
        }
    }

    #[test]
    fn test_contains_and_endswith() {
        assert!(matches("Microsoft Office Language Pack", "language pack", PatternType::Contains));
        assert!(matches("Realtek Audio DRIVER", "driver", PatternType::EndsWith));
        assert!(!matches("Driver Booster", "driver", PatternType::EndsWith));
    }

    #[test]
    fn test_regex_case_insensitive() {
        assert!(matches("Update KB5031356", r"\bkb\d{6,7}\b", PatternType::Regex));
        assert!(matches("ams360 client", r"^AMS360", PatternType::Regex));
    }

    #[test]
    fn test_invalid_regex_fails_closed() {
        assert!(!matches("anything", "([unclosed", PatternType::Regex));
        let compiled = CompiledPattern::compile_or_invalid("([unclosed", PatternType::Regex);
        assert!(matches!(compiled, CompiledPattern::Invalid { .. }));
        assert!(!compiled.is_match("([unclosed"));
    }
}
