//! Rules: paired detector and remediation for one label in one language
//!
//! [`Rule`] is the seam a real analysis back-end would plug into.
//! [`PatternRule`] is the data-driven implementation every built-in rule
//! uses: presence/absence tests over raw text plus a textual transform.

use crate::error::PatternError;
use crate::language::VulnerabilityLabel;
use regex::Regex;
use std::fmt;

/// Paired detector/remediator for one vulnerability label
///
/// Implementations must be pure functions of the content they receive.
pub trait Rule: Send + Sync + 'static {
    /// Label this rule reports and remediates
    fn label(&self) -> &VulnerabilityLabel;

    /// Whether the content exhibits the vulnerability
    fn detect(&self, content: &str) -> bool;

    /// Rewrite content so that [`Rule::detect`] no longer matches
    ///
    /// Content that does not trigger the rule must come back unchanged.
    fn remediate(&self, content: &str) -> String;

    /// Text a remediated file is expected to contain
    fn mitigation_marker(&self) -> Option<&str> {
        None
    }
}

/// Textual transform applied by a [`PatternRule`]
pub type Transform = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Compile a rule pattern, attributing failures to the rule's label
pub(crate) fn compile(label: &str, pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(pattern).map_err(|e| PatternError::invalid_pattern(label, e))
}

/// Rule built from regex presence tests and forbidden markers
///
/// Detection holds when every `required` pattern matches, at least one
/// `any_of` pattern matches (if any are given), and no `forbidden` marker
/// occurs in the content.
pub struct PatternRule {
    label: VulnerabilityLabel,
    required: Vec<Regex>,
    any_of: Vec<Regex>,
    forbidden: Vec<String>,
    marker: Option<String>,
    transform: Transform,
}

impl PatternRule {
    /// Start building a rule for a label
    #[inline]
    #[must_use]
    pub fn builder(label: impl Into<String>) -> PatternRuleBuilder {
        PatternRuleBuilder {
            label: label.into(),
            required: Vec::new(),
            any_of: Vec::new(),
            forbidden: Vec::new(),
            marker: None,
            transform: None,
        }
    }
}

impl Rule for PatternRule {
    fn label(&self) -> &VulnerabilityLabel {
        &self.label
    }

    fn detect(&self, content: &str) -> bool {
        self.required.iter().all(|re| re.is_match(content))
            && (self.any_of.is_empty() || self.any_of.iter().any(|re| re.is_match(content)))
            && !self.forbidden.iter().any(|m| content.contains(m.as_str()))
    }

    fn remediate(&self, content: &str) -> String {
        // Transforms are only ever run against content they were written for.
        if !self.detect(content) {
            return content.to_string();
        }
        (self.transform)(content)
    }

    fn mitigation_marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }
}

impl fmt::Debug for PatternRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternRule")
            .field("label", &self.label)
            .field("required", &self.required.iter().map(Regex::as_str).collect::<Vec<_>>())
            .field("any_of", &self.any_of.iter().map(Regex::as_str).collect::<Vec<_>>())
            .field("forbidden", &self.forbidden)
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}

/// Builder for [`PatternRule`]
///
/// Patterns are kept as strings until [`PatternRuleBuilder::build`] so a bad
/// pattern surfaces as one error instead of a panic mid-chain.
pub struct PatternRuleBuilder {
    label: String,
    required: Vec<String>,
    any_of: Vec<String>,
    forbidden: Vec<String>,
    marker: Option<String>,
    transform: Option<Transform>,
}

impl PatternRuleBuilder {
    /// Pattern that must match
    #[inline]
    #[must_use]
    pub fn require(mut self, pattern: impl Into<String>) -> Self {
        self.required.push(pattern.into());
        self
    }

    /// Pattern of which at least one (among all `any_of`) must match
    #[inline]
    #[must_use]
    pub fn any_of(mut self, pattern: impl Into<String>) -> Self {
        self.any_of.push(pattern.into());
        self
    }

    /// Literal text whose presence suppresses detection
    #[inline]
    #[must_use]
    pub fn forbid(mut self, marker: impl Into<String>) -> Self {
        self.forbidden.push(marker.into());
        self
    }

    /// Text the remediated content is expected to contain
    #[inline]
    #[must_use]
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    /// Remediation transform
    #[inline]
    #[must_use]
    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.transform = Some(Box::new(f));
        self
    }

    /// Compile patterns and produce the rule
    ///
    /// A rule without a transform is detect-only: remediation returns the
    /// content unchanged.
    ///
    /// # Errors
    /// - `PatternError::EmptyRule` if neither `require` nor `any_of` was given
    /// - `PatternError::InvalidPattern` if a pattern fails to compile
    pub fn build(self) -> Result<PatternRule, PatternError> {
        if self.required.is_empty() && self.any_of.is_empty() {
            return Err(PatternError::EmptyRule(self.label));
        }

        let required = self
            .required
            .iter()
            .map(|p| compile(&self.label, p))
            .collect::<Result<Vec<_>, _>>()?;
        let any_of = self
            .any_of
            .iter()
            .map(|p| compile(&self.label, p))
            .collect::<Result<Vec<_>, _>>()?;

        let transform: Transform = match self.transform {
            Some(transform) => transform,
            None => Box::new(|content: &str| content.to_string()),
        };

        Ok(PatternRule {
            label: VulnerabilityLabel::new(self.label),
            required,
            any_of,
            forbidden: self.forbidden,
            marker: self.marker,
            transform,
        })
    }
}
