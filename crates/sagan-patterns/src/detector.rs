//! Detector: evaluate every rule of a file's language against its content

use crate::file::SourceFile;
use crate::language::{LabelSet, Language};
use crate::library::PatternLibrary;
use std::sync::Arc;

/// Applies the pattern library to file content
///
/// Non-exclusive: every matching rule contributes its label. Detection has
/// no side effects and no failure mode.
#[derive(Debug, Clone)]
pub struct Detector {
    library: Arc<PatternLibrary>,
}

impl Detector {
    /// Create detector over a library
    #[inline]
    #[must_use]
    pub fn new(library: Arc<PatternLibrary>) -> Self {
        Self { library }
    }

    /// Labels triggered by one file
    #[must_use]
    pub fn detect(&self, file: &SourceFile) -> LabelSet {
        self.detect_content(file.language(), file.content())
    }

    /// Labels triggered by raw content in a language
    #[must_use]
    pub fn detect_content(&self, language: &Language, content: &str) -> LabelSet {
        self.library
            .rules_for(language)
            .iter()
            .filter(|rule| rule.detect(content))
            .map(|rule| {
                tracing::debug!(%language, label = %rule.label(), "rule triggered");
                rule.label().clone()
            })
            .collect()
    }

    /// Union of labels over several files, in first-detection order
    #[must_use]
    pub fn detect_all<'a>(&self, files: impl IntoIterator<Item = &'a SourceFile>) -> LabelSet {
        files.into_iter().flat_map(|file| self.detect(file)).collect()
    }

    /// Underlying library
    #[inline]
    #[must_use]
    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }
}
