//! Error types for the pattern library
//!
//! Detection and remediation themselves are infallible; the only failure is
//! building a rule whose pattern does not compile.

/// Errors raised while assembling rules
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// A rule pattern failed to compile
    #[error("invalid pattern for '{label}': {source}")]
    InvalidPattern {
        /// Label of the rule being built
        label: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// A rule was built without any detection pattern
    #[error("rule '{0}' has no detection pattern")]
    EmptyRule(String),
}

impl PatternError {
    /// Create invalid pattern error for a label
    pub fn invalid_pattern(label: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            label: label.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pattern_display_names_label() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = PatternError::invalid_pattern("SQL Injection", source);
        assert!(err.to_string().contains("SQL Injection"));
    }

    #[test]
    fn empty_rule_display() {
        let err = PatternError::EmptyRule("XSS".to_string());
        assert_eq!(err.to_string(), "rule 'XSS' has no detection pattern");
    }
}
