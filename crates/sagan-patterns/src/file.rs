//! Source files under review

use crate::language::Language;
use serde::{Deserialize, Serialize};

/// A named file with its content and declared language
///
/// The language is fixed at construction; content may be replaced as a whole
/// but is never edited partially from outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    name: String,
    content: String,
    language: Language,
}

impl SourceFile {
    /// Create a source file
    #[inline]
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        language: impl Into<Language>,
    ) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            language: language.into(),
        }
    }

    /// File name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current content
    #[inline]
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Declared language
    #[inline]
    #[must_use]
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Replace the content wholesale
    #[inline]
    pub fn replace_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Same file with different content
    #[inline]
    #[must_use]
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            name: self.name.clone(),
            content: content.into(),
            language: self.language.clone(),
        }
    }
}
