//! Mission configuration
//!
//! Every field has a default, so an empty TOML document is a valid config.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the check gating merge unless configured otherwise
pub const DEFAULT_SECURITY_CHECK: &str = "Security";

/// Which labels the remediation pass applies to each file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationScope {
    /// Every file receives every label detected anywhere in the change
    #[default]
    Global,
    /// Each file receives only the labels it triggered itself
    PerFile,
}

/// Mission controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// Check name written on the change
    pub security_check: String,
    /// Label scope of the remediation pass
    pub remediation_scope: RemediationScope,
    /// Merge changes that were clean on first detection
    pub merge_on_clean: bool,
}

impl MissionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With security check name
    #[inline]
    #[must_use]
    pub fn with_security_check(mut self, name: impl Into<String>) -> Self {
        self.security_check = name.into();
        self
    }

    /// With remediation scope
    #[inline]
    #[must_use]
    pub fn with_remediation_scope(mut self, scope: RemediationScope) -> Self {
        self.remediation_scope = scope;
        self
    }

    /// With merge on clean
    #[inline]
    #[must_use]
    pub fn with_merge_on_clean(mut self, merge: bool) -> Self {
        self.merge_on_clean = merge;
        self
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` if the text is not a valid config.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::Parse` if its content is not a valid config
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            security_check: DEFAULT_SECURITY_CHECK.to_string(),
            remediation_scope: RemediationScope::Global,
            merge_on_clean: false,
        }
    }
}
