//! Pattern library: registry of rules keyed by language
//!
//! Dispatch is a map lookup, not per-language branching. A language with no
//! entry has an empty rule list, which the detector treats as "nothing
//! found".

use crate::error::PatternError;
use crate::language::{Language, VulnerabilityLabel};
use crate::rule::Rule;
use crate::rules::builtin_rules;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a registered rule
pub type RuleRef = Arc<dyn Rule>;

/// Registry mapping each language to its ordered rule list
#[derive(Clone, Default)]
pub struct PatternLibrary {
    rules: HashMap<Language, Vec<RuleRef>>,
}

impl PatternLibrary {
    /// Create empty library
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Create library with the built-in rule tables
    ///
    /// # Errors
    /// Returns `PatternError` if a built-in pattern fails to compile.
    pub fn builtin() -> Result<Self, PatternError> {
        let mut library = Self::new();
        for (language, rules) in builtin_rules()? {
            for rule in rules {
                library.register(language.clone(), rule);
            }
        }
        tracing::debug!(
            languages = library.rules.len(),
            rules = library.len(),
            "built-in pattern library loaded"
        );
        Ok(library)
    }

    /// Append a rule to a language's list
    ///
    /// Registration order is evaluation order. A rule whose label is already
    /// registered for the language replaces the earlier one in place.
    pub fn register<R: Rule>(&mut self, language: Language, rule: R) {
        self.register_shared(language, Arc::new(rule));
    }

    /// Append an already shared rule to a language's list
    pub fn register_shared(&mut self, language: Language, rule: RuleRef) {
        let list = self.rules.entry(language).or_default();
        match list.iter().position(|r| r.label() == rule.label()) {
            Some(idx) => list[idx] = rule,
            None => list.push(rule),
        }
    }

    /// Ordered rules for a language (empty for unknown languages)
    #[must_use]
    pub fn rules_for(&self, language: &Language) -> &[RuleRef] {
        self.rules
            .get(language)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Rule serving `label` in `language`
    #[must_use]
    pub fn rule(&self, language: &Language, label: &VulnerabilityLabel) -> Option<&RuleRef> {
        self.rules_for(language).iter().find(|r| r.label() == label)
    }

    /// Labels registered for a language, in evaluation order
    #[must_use]
    pub fn labels(&self, language: &Language) -> Vec<&VulnerabilityLabel> {
        self.rules_for(language).iter().map(|r| r.label()).collect()
    }

    /// Languages with at least one rule, sorted
    #[must_use]
    pub fn languages(&self) -> Vec<&Language> {
        let mut languages: Vec<&Language> = self
            .rules
            .iter()
            .filter(|(_, rules)| !rules.is_empty())
            .map(|(language, _)| language)
            .collect();
        languages.sort();
        languages
    }

    /// Total number of registered rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    /// Check if library has no rules
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for PatternLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternLibrary")
            .field("languages", &self.languages())
            .field("rule_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::PatternRule;

    fn rule(label: &str, pattern: &str) -> PatternRule {
        PatternRule::builder(label).require(pattern).build().unwrap()
    }

    #[test]
    fn library_new_empty() {
        let library = PatternLibrary::new();
        assert!(library.is_empty());
        assert!(library.rules_for(&Language::python()).is_empty());
    }

    #[test]
    fn builtin_covers_six_languages() {
        let library = PatternLibrary::builtin().unwrap();
        let languages: Vec<&str> = library.languages().iter().map(|l| l.as_str()).collect();
        assert_eq!(languages, vec!["abap", "go", "java", "javascript", "python", "ruby"]);
        assert_eq!(library.len(), 14);
    }

    #[test]
    fn builtin_python_order_is_fixed() {
        let library = PatternLibrary::builtin().unwrap();
        let labels: Vec<&str> = library
            .labels(&Language::python())
            .into_iter()
            .map(VulnerabilityLabel::as_str)
            .collect();
        assert_eq!(
            labels,
            vec!["Hardcoded Password", "Remote Code Execution", "SQL Injection"]
        );
    }

    #[test]
    fn unknown_language_has_no_rules() {
        let library = PatternLibrary::builtin().unwrap();
        assert!(library.rules_for(&Language::new("cobol")).is_empty());
    }

    #[test]
    fn rule_lookup_is_per_language() {
        let library = PatternLibrary::builtin().unwrap();
        let label = VulnerabilityLabel::new("Remote Code Execution");
        assert!(library.rule(&Language::python(), &label).is_some());
        assert!(library.rule(&Language::java(), &label).is_none());
    }

    #[test]
    fn register_appends_in_order() {
        let mut library = PatternLibrary::new();
        library.register(Language::new("toy"), rule("B", "b"));
        library.register(Language::new("toy"), rule("A", "a"));

        let labels: Vec<&str> = library
            .labels(&Language::new("toy"))
            .into_iter()
            .map(VulnerabilityLabel::as_str)
            .collect();
        assert_eq!(labels, vec!["B", "A"]);
    }

    #[test]
    fn register_same_label_replaces() {
        let mut library = PatternLibrary::new();
        library.register(Language::new("toy"), rule("A", "old"));
        library.register(Language::new("toy"), rule("A", "new"));

        assert_eq!(library.len(), 1);
        let found = library
            .rule(&Language::new("toy"), &VulnerabilityLabel::new("A"))
            .unwrap();
        assert!(found.detect("new"));
        assert!(!found.detect("old"));
    }

    #[test]
    fn library_debug() {
        let debug = format!("{:?}", PatternLibrary::builtin().unwrap());
        assert!(debug.contains("PatternLibrary"));
    }
}
