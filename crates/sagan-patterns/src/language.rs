//! Language tags and vulnerability labels
//!
//! Both are string newtypes: a language with no registered rules is still a
//! valid tag, and labels are opaque identifiers shared between a detection
//! and the remediation that answers it.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Language tag of a source file
///
/// Normalized to lowercase on construction so `"Python"` and `"python"`
/// select the same rule list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    /// Python
    pub const PYTHON: &'static str = "python";
    /// JavaScript
    pub const JAVASCRIPT: &'static str = "javascript";
    /// ABAP
    pub const ABAP: &'static str = "abap";
    /// Java
    pub const JAVA: &'static str = "java";
    /// Go
    pub const GO: &'static str = "go";
    /// Ruby
    pub const RUBY: &'static str = "ruby";

    /// Every language the built-in library ships rules for
    pub const BUILTIN: [&'static str; 6] = [
        Self::PYTHON,
        Self::JAVASCRIPT,
        Self::ABAP,
        Self::JAVA,
        Self::GO,
        Self::RUBY,
    ];

    /// Create a language tag
    #[inline]
    #[must_use]
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().to_ascii_lowercase())
    }

    /// Tag as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Python tag
    #[inline]
    #[must_use]
    pub fn python() -> Self {
        Self::new(Self::PYTHON)
    }

    /// JavaScript tag
    #[inline]
    #[must_use]
    pub fn javascript() -> Self {
        Self::new(Self::JAVASCRIPT)
    }

    /// ABAP tag
    #[inline]
    #[must_use]
    pub fn abap() -> Self {
        Self::new(Self::ABAP)
    }

    /// Java tag
    #[inline]
    #[must_use]
    pub fn java() -> Self {
        Self::new(Self::JAVA)
    }

    /// Go tag
    #[inline]
    #[must_use]
    pub fn go() -> Self {
        Self::new(Self::GO)
    }

    /// Ruby tag
    #[inline]
    #[must_use]
    pub fn ruby() -> Self {
        Self::new(Self::RUBY)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Language {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Language {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Identifier of one detected vulnerability class
///
/// Labels are compared verbatim; `"SQL Injection"` in Python and in Java is
/// the same label served by two different rules.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VulnerabilityLabel(String);

impl VulnerabilityLabel {
    /// Create a label
    #[inline]
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Label as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VulnerabilityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VulnerabilityLabel {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl PartialEq<str> for VulnerabilityLabel {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for VulnerabilityLabel {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Insertion-ordered set of labels
///
/// Order is the order of first detection, which is also the order the
/// remediation pass walks labels in.
pub type LabelSet = IndexSet<VulnerabilityLabel>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_is_normalized() {
        assert_eq!(Language::new(" Python "), Language::python());
        assert_eq!(Language::from("GO").as_str(), "go");
    }

    #[test]
    fn unknown_language_is_representable() {
        let cobol = Language::new("COBOL");
        assert_eq!(cobol.to_string(), "cobol");
        assert!(!Language::BUILTIN.contains(&cobol.as_str()));
    }

    #[test]
    fn label_compares_with_str() {
        let label = VulnerabilityLabel::new("SQL Injection");
        assert_eq!(label, "SQL Injection");
        assert_eq!(label.to_string(), "SQL Injection");
    }

    #[test]
    fn label_set_keeps_first_detection_order() {
        let mut set = LabelSet::new();
        set.insert("b".into());
        set.insert("a".into());
        set.insert("b".into());

        let order: Vec<&str> = set.iter().map(VulnerabilityLabel::as_str).collect();
        assert_eq!(order, vec!["b", "a"]);
    }
}
