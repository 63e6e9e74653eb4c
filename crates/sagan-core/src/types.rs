//! Core types for the review pipeline

use indexmap::IndexMap;
use sagan_patterns::{LabelSet, SourceFile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use ulid::Ulid;

/// Repository-assigned change identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(pub u64);

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique mission identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MissionId(pub Ulid);

impl MissionId {
    /// Generate new mission ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for MissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeState {
    /// Under review
    Open,
    /// Merged; terminal
    Merged,
}

/// Outcome of a named check on a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckResult {
    /// Check registered but not evaluated
    Pending,
    /// Gate open
    Pass,
    /// Gate closed
    Fail,
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// A set of files proposed together for review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Change identifier
    pub id: ChangeId,
    /// Human readable title
    pub title: String,
    /// Files in the change, in submission order
    pub files: Vec<SourceFile>,
    /// Lifecycle state
    pub state: ChangeState,
    /// Named checks and their results
    pub checks: BTreeMap<String, CheckResult>,
    /// Review annotations in insertion order
    pub annotations: Vec<String>,
}

impl Change {
    /// Create an open change with no checks or annotations
    #[must_use]
    pub fn new(id: ChangeId, title: impl Into<String>, files: Vec<SourceFile>) -> Self {
        Self {
            id,
            title: title.into(),
            files,
            state: ChangeState::Open,
            checks: BTreeMap::new(),
            annotations: Vec::new(),
        }
    }

    /// File by name
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.name() == name)
    }

    /// Result of a named check, if it was ever set
    #[inline]
    #[must_use]
    pub fn check(&self, name: &str) -> Option<CheckResult> {
        self.checks.get(name).copied()
    }

    /// Check if change is merged
    #[inline]
    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.state == ChangeState::Merged
    }
}

/// Terminal classification of a mission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionOutcome {
    /// Nothing detected, no remediation performed
    Clean,
    /// Every detected label was eliminated and the change merged
    Passed,
    /// Labels survived remediation; change left open
    Failed,
}

impl fmt::Display for MissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Result of one mission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionResult {
    /// Mission identifier
    pub mission: MissionId,
    /// Change the mission ran against
    pub change: ChangeId,
    /// Terminal classification
    pub outcome: MissionOutcome,
    /// Union of labels found during detection, in first-detection order
    pub triggered_labels: LabelSet,
    /// Post-remediation content per file name (empty when clean)
    pub fixed_files: IndexMap<String, String>,
    /// Verification stubs, one per remediated (file, label) pair
    pub generated_tests: Vec<String>,
    /// Labels still detected after remediation (empty unless failed)
    pub remaining_labels: LabelSet,
}

impl MissionResult {
    /// Empty result for a mission that has not progressed yet
    #[must_use]
    pub fn new(mission: MissionId, change: ChangeId) -> Self {
        Self {
            mission,
            change,
            outcome: MissionOutcome::Clean,
            triggered_labels: LabelSet::new(),
            fixed_files: IndexMap::new(),
            generated_tests: Vec::new(),
            remaining_labels: LabelSet::new(),
        }
    }

    /// Check if the mission left the change secure
    #[inline]
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.outcome != MissionOutcome::Failed
    }
}
