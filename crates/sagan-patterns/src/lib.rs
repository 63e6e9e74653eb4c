//! Sagan Patterns - per-language vulnerability rules
//!
//! Provides:
//! - A registry of paired detectors and remediations keyed by language
//! - A non-exclusive detector returning insertion-ordered label sets
//! - A stateless remediator and verification-test stub generator
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sagan_patterns::{Detector, PatternLibrary, Remediator, SourceFile};
//!
//! let library = Arc::new(PatternLibrary::builtin().unwrap());
//! let detector = Detector::new(Arc::clone(&library));
//! let remediator = Remediator::new(library);
//!
//! let file = SourceFile::new("app.py", "password = \"supersecret\"", "python");
//! let labels = detector.detect(&file);
//! assert_eq!(labels.len(), 1);
//!
//! let fixed = remediator.remediate_all(&file, &labels);
//! assert!(detector.detect(&file.with_content(fixed)).is_empty());
//! ```

#![warn(unreachable_pub)]

pub mod detector;
pub mod error;
pub mod file;
pub mod language;
pub mod library;
pub mod remediator;
pub mod rule;
pub mod rules;

pub use detector::Detector;
pub use error::PatternError;
pub use file::SourceFile;
pub use language::{LabelSet, Language, VulnerabilityLabel};
pub use library::{PatternLibrary, RuleRef};
pub use remediator::Remediator;
pub use rule::{PatternRule, PatternRuleBuilder, Rule, Transform};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with rule tables
    pub use crate::{
        Detector, LabelSet, Language, PatternLibrary, Remediator, Rule, SourceFile,
        VulnerabilityLabel,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
